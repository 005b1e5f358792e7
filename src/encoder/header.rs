use super::{Boundary, EncodeError};

pub const OCTET_STREAM: &str = "application/octet-stream";

/// What a part carries; a directory part names the boundary of its nested stream.
#[derive(Debug, Clone, Copy)]
pub enum PartKind<'a> {
    File,
    Directory(&'a str),
}

/// Builds the delimiter line and headers that open a part.
///
/// Nothing is written anywhere on failure, so the caller can bail out
/// without having queued a partial header.
pub fn part_header(
    boundary: &Boundary,
    first: bool,
    form: bool,
    name: &str,
    kind: PartKind<'_>,
) -> Result<Vec<u8>, EncodeError> {
    let content_type = match kind {
        PartKind::File => OCTET_STREAM.to_string(),
        PartKind::Directory(nested) => {
            let nested = Boundary::parse(nested)?;
            format!("multipart/mixed; boundary={}", nested)
        }
    };
    let disposition = if form {
        format!("form-data; name=\"file\"; filename=\"{}\"", name)
    } else {
        format!("file; filename=\"{}\"", name)
    };

    let mut out = Vec::with_capacity(128 + name.len());
    if !first {
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    out.extend_from_slice(format!("Content-Disposition: {}\r\n", disposition).as_bytes());
    out.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
    out.extend_from_slice(b"\r\n");
    Ok(out)
}

/// The terminating delimiter; a leading CRLF ends the last part's body when there was one.
pub fn closing(boundary: &Boundary, any_parts: bool) -> Vec<u8> {
    let lead = if any_parts { "\r\n" } else { "" };
    format!("{}--{}--\r\n", lead, boundary).into_bytes()
}
