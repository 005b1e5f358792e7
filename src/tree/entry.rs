use std::sync::Arc;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum EntryType {
    File,
    Directory,
}

/// A node stored in a [`MapTree`](crate::MapTree).
///
/// File content is kept behind an `Arc` so that encoding a tree hands out
/// readers over the same bytes instead of copies.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    entry_type: EntryType,
    content: Option<Arc<[u8]>>,
}

impl Entry {
    pub fn new(entry_type: EntryType) -> Entry {
        Entry {
            entry_type,
            content: None,
        }
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn is_file(&self) -> bool {
        self.entry_type == EntryType::File
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Directory
    }

    /// Returns the file content; empty for directories and empty files.
    pub fn content(&self) -> Arc<[u8]> {
        self.content.clone().unwrap_or_else(|| Arc::from(&b""[..]))
    }

    pub fn set_content(&mut self, content: &[u8]) {
        self.content = Some(Arc::from(content));
    }
}
