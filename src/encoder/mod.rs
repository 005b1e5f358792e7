//! Pull-based multipart encoder over a [`FileTree`].

mod boundary;
mod error;
mod header;

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Read};

use tracing::{debug, trace, warn};

use crate::core::{Content, FileTree};
use header::PartKind;

pub use boundary::Boundary;
pub use error::EncodeError;

/// Streams a file tree as a MIME multipart body.
///
/// Bytes are produced only when [`Read::read`] is called. Each entry of the
/// source becomes one part: a delimiter line and two headers, then the
/// entry's content. Directories are encoded as parts whose body is a nested
/// `multipart/mixed` stream with its own boundary.
///
/// ### Internal state
///
/// * `source`: the tree being encoded; the next entry is pulled only after
///   the current one has been fully emitted.
/// * `active`: content of the current part, if any.
/// * `header`: delimiter and header bytes not yet handed to the caller.
///   Always drained before any bytes of `active`.
/// * `done`: set once the closing delimiter has been queued.
///
/// ### Example
///
/// ```no_run
/// use std::io::Read;
/// use treepart::{SliceDir, StreamEncoder, TreeEntry};
///
/// let tree = SliceDir::new(vec![TreeEntry::bytes("hello.txt", b"Hello".to_vec())]);
/// let mut encoder = StreamEncoder::new(tree, true);
/// let content_type = encoder.content_type();
///
/// let mut body = Vec::new();
/// encoder.read_to_end(&mut body).unwrap();
/// ```
pub struct StreamEncoder {
    source: Box<dyn FileTree + Send>,
    active: Option<ChildContent>,
    header: VecDeque<u8>,
    boundary: Boundary,
    form: bool,
    parts: usize,
    done: bool,
    poisoned: bool,
    /// Token handed to the next nested encoder instead of a random one.
    #[cfg(test)]
    forced_nested: Option<Boundary>,
}

/// Content of the part currently being emitted.
enum ChildContent {
    Leaf(Box<dyn Read + Send>),
    Nested(Box<StreamEncoder>),
}

impl Read for ChildContent {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ChildContent::Leaf(reader) => reader.read(buf),
            ChildContent::Nested(encoder) => encoder.read(buf),
        }
    }
}

impl StreamEncoder {
    /// Creates an encoder with a fresh random boundary.
    /// * `form` selects `multipart/form-data` part headers; otherwise `multipart/mixed`.
    pub fn new<T: FileTree + Send + 'static>(source: T, form: bool) -> Self {
        Self::with_boundary(source, form, Boundary::random())
    }

    /// Creates an encoder with a caller-chosen top-level boundary.
    /// Nested directory streams still get random boundaries.
    pub fn with_boundary<T: FileTree + Send + 'static>(
        source: T,
        form: bool,
        boundary: Boundary,
    ) -> Self {
        Self::from_boxed(Box::new(source), form, boundary)
    }

    fn from_boxed(source: Box<dyn FileTree + Send>, form: bool, boundary: Boundary) -> Self {
        Self {
            source,
            active: None,
            header: VecDeque::new(),
            boundary,
            form,
            parts: 0,
            done: false,
            poisoned: false,
            #[cfg(test)]
            forced_nested: None,
        }
    }

    pub fn boundary(&self) -> &str {
        self.boundary.as_str()
    }

    pub fn is_form(&self) -> bool {
        self.form
    }

    /// Value for the `Content-Type` header of the request carrying this stream.
    pub fn content_type(&self) -> String {
        let subtype = if self.form { "form-data" } else { "mixed" };
        format!("multipart/{}; boundary={}", subtype, self.boundary)
    }

    /// Returns `true` once the closing delimiter has been fully read.
    pub fn is_finished(&self) -> bool {
        self.done && self.header.is_empty()
    }

    /// Pulls the next entry and queues its part header, or the closing
    /// delimiter when the source is exhausted.
    fn advance(&mut self) -> io::Result<()> {
        let Some(entry) = self.source.next_file()? else {
            self.header
                .extend(header::closing(&self.boundary, self.parts > 0));
            self.done = true;
            debug!(boundary = %self.boundary, parts = self.parts, "multipart stream closed");
            return Ok(());
        };

        let (name, content) = entry.into_parts();
        let child = match content {
            Content::File(reader) => ChildContent::Leaf(reader),
            Content::Directory(tree) => {
                let nested = self.nested_boundary();
                ChildContent::Nested(Box::new(StreamEncoder::from_boxed(tree, false, nested)))
            }
        };
        let kind = match &child {
            ChildContent::Leaf(_) => PartKind::File,
            ChildContent::Nested(encoder) => PartKind::Directory(encoder.boundary()),
        };
        let bytes = header::part_header(&self.boundary, self.parts == 0, self.form, &name, kind)?;

        trace!(name = %name, dir = matches!(child, ChildContent::Nested(_)), "part started");
        self.header.extend(bytes);
        self.active = Some(child);
        self.parts += 1;
        Ok(())
    }

    /// Random token for a nested stream, distinct from this encoder's own.
    fn nested_boundary(&mut self) -> Boundary {
        #[cfg(test)]
        if let Some(forced) = self.forced_nested.take() {
            return forced;
        }
        let mut nested = Boundary::random();
        while nested == self.boundary {
            nested = Boundary::random();
        }
        nested
    }

    /// Marks the encoder unusable unless `err` is one a caller is expected to retry.
    fn poison(&mut self, err: io::Error) -> io::Error {
        if !matches!(
            err.kind(),
            io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
        ) {
            warn!(boundary = %self.boundary, error = %err, "multipart encoding failed");
            self.poisoned = true;
        }
        err
    }
}

impl Read for StreamEncoder {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.poisoned {
            return Err(EncodeError::Poisoned.into());
        }
        if buf.is_empty() {
            return Ok(0);
        }

        // A child running dry moves on to the next entry within the same call.
        loop {
            if self.is_finished() {
                return Ok(0);
            }
            if self.active.is_none() && !self.done {
                if let Err(err) = self.advance() {
                    return Err(self.poison(err));
                }
            }
            if !self.header.is_empty() {
                return self.header.read(buf);
            }
            let Some(child) = self.active.as_mut() else {
                continue;
            };
            match child.read(buf) {
                Ok(0) => {
                    trace!(boundary = %self.boundary, "part finished");
                    self.active = None;
                }
                Ok(n) => return Ok(n),
                Err(err) => return Err(self.poison(err)),
            }
        }
    }
}

impl fmt::Debug for StreamEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamEncoder")
            .field("boundary", &self.boundary)
            .field("form", &self.form)
            .field("parts", &self.parts)
            .field("pending_header", &self.header.len())
            .field("done", &self.done)
            .field("poisoned", &self.poisoned)
            .finish()
    }
}
