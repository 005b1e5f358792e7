use std::collections::VecDeque;
use std::io;

use crate::core::{FileTree, TreeEntry};

/// A directory over a prepared list of entries, yielded in order.
///
/// ```no_run
/// use treepart::{SliceDir, TreeEntry};
///
/// let tree = SliceDir::new(vec![
///     TreeEntry::bytes("readme.txt", b"hi".to_vec()),
///     TreeEntry::dir("docs", SliceDir::new(vec![])),
/// ]);
/// ```
#[derive(Debug, Default)]
pub struct SliceDir {
    entries: VecDeque<TreeEntry>,
}

impl SliceDir {
    pub fn new(entries: Vec<TreeEntry>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    pub fn push(&mut self, entry: TreeEntry) {
        self.entries.push_back(entry);
    }

    /// Entries not yet yielded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FileTree for SliceDir {
    fn next_file(&mut self) -> io::Result<Option<TreeEntry>> {
        Ok(self.entries.pop_front())
    }
}

impl FromIterator<TreeEntry> for SliceDir {
    fn from_iter<I: IntoIterator<Item = TreeEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
