//! Test helpers: a minimal multipart decoder and tree builders.

#![allow(dead_code)]

use std::io::{self, Read};

use treepart::{SliceDir, StreamEncoder, TreeEntry};

/// A decoded (or to-be-encoded) tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    File(String, Vec<u8>),
    Dir(String, Vec<Node>),
}

impl Node {
    pub fn file(name: &str, data: &[u8]) -> Node {
        Node::File(name.to_string(), data.to_vec())
    }

    pub fn dir(name: &str, children: Vec<Node>) -> Node {
        Node::Dir(name.to_string(), children)
    }

    pub fn to_entry(&self) -> TreeEntry {
        match self {
            Node::File(name, data) => TreeEntry::bytes(name.clone(), data.clone()),
            Node::Dir(name, children) => TreeEntry::dir(name.clone(), slice_dir(children)),
        }
    }
}

pub fn slice_dir(nodes: &[Node]) -> SliceDir {
    nodes.iter().map(Node::to_entry).collect()
}

/// Reads `encoder` to the end using a buffer of `chunk` bytes per call.
pub fn read_chunked<R: Read>(encoder: &mut R, chunk: usize) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut buf = vec![0u8; chunk];
    loop {
        let n = encoder.read(&mut buf)?;
        if n == 0 {
            return Ok(out);
        }
        out.extend_from_slice(&buf[..n]);
    }
}

pub fn encode(nodes: &[Node], form: bool) -> (String, Vec<u8>) {
    let mut encoder = StreamEncoder::new(slice_dir(nodes), form);
    let boundary = encoder.boundary().to_string();
    let body = read_chunked(&mut encoder, 4096).expect("in-memory trees never fail");
    (boundary, body)
}

/// One part of a multipart body.
#[derive(Debug)]
pub struct Part {
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Part {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

/// Splits a multipart body into parts, checking the framing as it goes.
pub fn split_parts(body: &[u8], boundary: &str) -> Result<Vec<Part>, String> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let inner_delimiter = format!("\r\n--{}", boundary).into_bytes();
    if !body.starts_with(&delimiter) {
        return Err("body does not open with the boundary".into());
    }

    let mut parts = Vec::new();
    let mut pos = delimiter.len();
    loop {
        let rest = &body[pos..];
        if rest == b"--\r\n" {
            return Ok(parts);
        }
        if !rest.starts_with(b"\r\n") {
            return Err(format!("malformed delimiter line at {}", pos));
        }
        pos += 2;

        let header_end = find(body, b"\r\n\r\n", pos).ok_or("unterminated headers")?;
        let header_text =
            std::str::from_utf8(&body[pos..header_end]).map_err(|e| e.to_string())?;
        let mut headers = Vec::new();
        for line in header_text.split("\r\n") {
            let (key, value) = line
                .split_once(": ")
                .ok_or_else(|| format!("bad header line {:?}", line))?;
            headers.push((key.to_string(), value.to_string()));
        }

        let body_start = header_end + 4;
        let body_end = find(body, &inner_delimiter, body_start).ok_or("unterminated part")?;
        parts.push(Part {
            headers,
            body: body[body_start..body_end].to_vec(),
        });
        pos = body_end + inner_delimiter.len();
    }
}

fn filename(disposition: &str) -> Result<String, String> {
    let start = disposition
        .find("filename=\"")
        .ok_or("missing filename")?
        + "filename=\"".len();
    let end = disposition.rfind('"').ok_or("unterminated filename")?;
    Ok(disposition[start..end].to_string())
}

/// Decodes a body produced by the encoder back into a tree.
pub fn decode(body: &[u8], boundary: &str, form: bool) -> Result<Vec<Node>, String> {
    let mut nodes = Vec::new();
    for part in split_parts(body, boundary)? {
        if part.headers.len() != 2 {
            return Err(format!("expected two headers, got {:?}", part.headers));
        }
        let disposition = part
            .header("Content-Disposition")
            .ok_or("missing Content-Disposition")?;
        let expected = if form { "form-data; name=\"file\"; " } else { "file; " };
        if !disposition.starts_with(expected) {
            return Err(format!("unexpected disposition {:?}", disposition));
        }
        let name = filename(disposition)?;

        let content_type = part
            .header("Content-Type")
            .ok_or("missing Content-Type")?
            .to_string();
        match content_type.strip_prefix("multipart/mixed; boundary=") {
            Some(nested) => {
                if nested == boundary {
                    return Err("nested boundary repeats its parent".into());
                }
                nodes.push(Node::Dir(name, decode(&part.body, nested, false)?));
            }
            None if content_type == "application/octet-stream" => {
                nodes.push(Node::File(name, part.body));
            }
            None => return Err(format!("unexpected content type {:?}", content_type)),
        }
    }
    Ok(nodes)
}

/// One field as reported by `multer`.
#[derive(Debug)]
pub struct Field {
    pub name: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<mime::Mime>,
    pub data: Vec<u8>,
}

/// Parses `body` with `multer`, feeding it in `chunk`-byte pieces.
pub async fn fields(body: &[u8], boundary: &str, chunk: usize) -> multer::Result<Vec<Field>> {
    let pieces: Vec<io::Result<Vec<u8>>> = body.chunks(chunk).map(|c| Ok(c.to_vec())).collect();
    let mut multipart = multer::Multipart::new(futures::stream::iter(pieces), boundary);

    let mut out = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().cloned();
        let data = field.bytes().await?.to_vec();
        out.push(Field {
            name,
            file_name,
            content_type,
            data,
        });
    }
    Ok(out)
}

/// Decodes a body with `multer`, recursing into `multipart/*` parts.
///
/// In form mode every top-level field must be named `file`.
pub fn decode_conformant(body: &[u8], boundary: &str, form: bool) -> Result<Vec<Node>, String> {
    let parsed = futures::executor::block_on(fields(body, boundary, 61)).map_err(|e| e.to_string())?;
    let mut nodes = Vec::new();
    for field in parsed {
        if form && field.name.as_deref() != Some("file") {
            return Err(format!("unexpected field name {:?}", field.name));
        }
        let name = field.file_name.ok_or("missing filename")?;
        let content_type = field.content_type.ok_or("missing Content-Type")?;
        if content_type.type_() == mime::MULTIPART {
            let nested = content_type
                .get_param(mime::BOUNDARY)
                .ok_or("multipart part without a boundary")?;
            if nested.as_str() == boundary {
                return Err("nested boundary repeats its parent".into());
            }
            nodes.push(Node::Dir(name, decode_conformant(&field.data, nested.as_str(), false)?));
        } else if content_type == mime::APPLICATION_OCTET_STREAM {
            nodes.push(Node::File(name, field.data));
        } else {
            return Err(format!("unexpected content type {}", content_type));
        }
    }
    Ok(nodes)
}

/// Replaces every nested boundary token with a label numbered by first appearance,
/// so outputs of separate runs can be compared byte for byte.
pub fn canonicalize(body: &[u8]) -> Vec<u8> {
    let marker = b"boundary=";
    let mut tokens: Vec<Vec<u8>> = Vec::new();
    let mut pos = 0;
    while let Some(at) = find(body, marker, pos) {
        let start = at + marker.len();
        let end = body[start..]
            .iter()
            .position(|b| *b == b'\r')
            .map_or(body.len(), |i| i + start);
        let token = body[start..end].to_vec();
        if !tokens.contains(&token) {
            tokens.push(token);
        }
        pos = end;
    }

    let mut out = body.to_vec();
    for (i, token) in tokens.iter().enumerate() {
        out = replace_all(&out, token, format!("NESTED{}", i).as_bytes());
    }
    out
}

fn replace_all(haystack: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(haystack.len());
    let mut pos = 0;
    while let Some(at) = find(haystack, from, pos) {
        out.extend_from_slice(&haystack[pos..at]);
        out.extend_from_slice(to);
        pos = at + from.len();
    }
    out.extend_from_slice(&haystack[pos..]);
    out
}
