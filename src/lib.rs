//! Lazy MIME multipart encoding of file trees.
//! Turns a tree of files and directories into one `multipart/form-data` (or
//! `multipart/mixed`) byte stream, suitable as an HTTP request body.
//!
//! ### Overview
//!
//! `treepart` reads a tree through the [`FileTree`] trait and exposes the encoded
//! stream as a [`std::io::Read`] implementation, [`StreamEncoder`]. Nothing is produced
//! until the consumer asks for bytes, and file content is never buffered beyond
//! what fits into the caller's buffer.
//!
//! **Key ideas**:
//! - **Laziness**: entries are requested one at a time, only after the previous one was fully sent.
//! - **Nesting**: a directory becomes a part whose body is a nested `multipart/mixed` stream.
//! - **Providers**: any source of entries works; [`SliceDir`] and [`MapTree`] are in-memory ones.
//!
//! ```no_run
//! use std::io::Read;
//! use treepart::{MapTree, StreamEncoder};
//!
//! let mut tree = MapTree::new();
//! tree.mkfile("/photos/cat.jpg", Some(b"...")).unwrap();
//!
//! let mut encoder = StreamEncoder::new(tree.files("/").unwrap(), true);
//! let content_type = encoder.content_type(); // multipart/form-data; boundary=...
//! let mut body = Vec::new();
//! encoder.read_to_end(&mut body).unwrap();
//! ```

mod core;
mod encoder;
mod tree;

pub use self::core::{Content, FileTree, Result, TreeEntry};
pub use encoder::{Boundary, EncodeError, StreamEncoder};
pub use tree::{Entry, EntryType, MapDir, MapTree, SliceDir};
