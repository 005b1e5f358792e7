//! This module provides an in-memory file tree that can be handed to the encoder.

use std::collections::{BTreeMap, VecDeque};
use std::io::{self, Cursor};
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;

use crate::core::{FileTree, Result, TreeEntry, utils};
use crate::{Entry, EntryType};

/// An in-memory file tree addressed by paths.
///
/// `MapTree` lets a caller assemble files and directories and then stream any
/// directory of it through [`StreamEncoder`](crate::StreamEncoder) via
/// [`MapTree::files`].
///
/// ### Internal state
///
/// * `entries`: every file and directory, keyed by inner absolute normalized
///   path. Relative paths given to any method are resolved against `/`.
///   A `BTreeMap` keeps a directory's descendants contiguous and in
///   deterministic order. The map sits behind an `Arc`; [`MapTree::files`]
///   shares it with the cursor it returns and later mutations copy it.
///
/// ### Invariants
///
/// 1. **Root existence**: `/` is always present and is a `Directory`.
/// 2. **Path normalization**: all keys are normalized.
/// 3. **Parent consistency**: every entry except `/` has a `Directory` parent.
///
/// ### Example
///
/// ```no_run
/// use std::io::Read;
/// use treepart::{MapTree, StreamEncoder};
///
/// let mut tree = MapTree::new();
/// tree.mkfile("/docs/note.txt", Some(b"Hello")).unwrap();
/// tree.mkdir("/docs/empty").unwrap();
///
/// let mut encoder = StreamEncoder::new(tree.files("/").unwrap(), true);
/// let mut body = Vec::new();
/// encoder.read_to_end(&mut body).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct MapTree {
    entries: Arc<BTreeMap<PathBuf, Entry>>,
}

impl MapTree {
    /// Creates a tree holding only the root directory `/`.
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(PathBuf::from("/"), Entry::new(EntryType::Directory));

        Self {
            entries: Arc::new(entries),
        }
    }

    fn entries_mut(&mut self) -> &mut BTreeMap<PathBuf, Entry> {
        Arc::make_mut(&mut self.entries)
    }

    pub fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
        self.entries.contains_key(&utils::normalize(path))
    }

    pub fn is_dir<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        Ok(self.get(path)?.is_dir())
    }

    pub fn is_file<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        Ok(self.get(path)?.is_file())
    }

    fn get<P: AsRef<Path>>(&self, path: P) -> Result<&Entry> {
        let path = path.as_ref();
        self.entries
            .get(&utils::normalize(path))
            .ok_or_else(|| anyhow!("{} does not exist", path.display()))
    }

    /// Creates a directory and all missing parents.
    pub fn mkdir<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        if path.as_ref().as_os_str().is_empty() {
            return Err(anyhow!("invalid path: empty"));
        }

        let inner = utils::normalize(path);
        if self.entries.contains_key(&inner) {
            return Err(anyhow!("path already exists: {}", inner.display()));
        }

        let mut built = PathBuf::new();
        for component in inner.components() {
            built.push(component);
            match self.entries.get(&built).map(Entry::is_file) {
                Some(true) => {
                    return Err(anyhow!("{} is a file", built.display()));
                }
                Some(false) => {}
                None => {
                    self.entries_mut()
                        .insert(built.clone(), Entry::new(EntryType::Directory));
                }
            }
        }
        Ok(())
    }

    /// Creates a file, creating missing parent directories.
    pub fn mkfile<P: AsRef<Path>>(&mut self, file_path: P, content: Option<&[u8]>) -> Result<()> {
        let file_path = utils::normalize(file_path);
        if utils::is_virtual_root(&file_path) {
            return Err(anyhow!("invalid path: the root cannot be a file"));
        }
        if self.entries.contains_key(&file_path) {
            return Err(anyhow!("{} already exist", file_path.display()));
        }
        if let Some(parent) = file_path.parent() {
            if !self.entries.contains_key(parent) {
                self.mkdir(parent)?;
            } else if !self.entries[parent].is_dir() {
                return Err(anyhow!("{} is a file", parent.display()));
            }
        }

        let mut entry = Entry::new(EntryType::File);
        if let Some(content) = content {
            entry.set_content(content);
        }
        self.entries_mut().insert(file_path, entry);
        Ok(())
    }

    /// Returns a [`FileTree`] over the immediate children of directory `path`.
    ///
    /// The cursor works on a snapshot: later changes to this `MapTree` are not
    /// visible through it.
    pub fn files<P: AsRef<Path>>(&self, path: P) -> Result<MapDir> {
        let inner = utils::normalize(path);
        if !self.is_dir(&inner)? {
            return Err(anyhow!("{} not a directory", inner.display()));
        }
        Ok(MapDir {
            entries: Arc::clone(&self.entries),
            dir: inner,
            pending: None,
        })
    }
}

impl Default for MapTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Immediate children of `dir`, in path order.
fn children<'a, 'b>(
    entries: &'a BTreeMap<PathBuf, Entry>,
    dir: &'b Path,
) -> impl Iterator<Item = &'a PathBuf> + use<'a, 'b> {
    let depth = dir.components().count() + 1;
    entries
        .range::<Path, _>((Bound::Excluded(dir), Bound::Unbounded))
        .map(|(path, _)| path)
        .take_while(move |path| path.starts_with(dir))
        .filter(move |path| path.components().count() == depth)
}

/// Cursor over one directory of a [`MapTree`] snapshot.
///
/// Children are listed on the first [`FileTree::next_file`] call;
/// subdirectories get their own `MapDir` and are listed only when reached.
#[derive(Debug)]
pub struct MapDir {
    entries: Arc<BTreeMap<PathBuf, Entry>>,
    dir: PathBuf,
    pending: Option<VecDeque<PathBuf>>,
}

impl MapDir {
    pub fn path(&self) -> &Path {
        &self.dir
    }
}

impl FileTree for MapDir {
    fn next_file(&mut self) -> io::Result<Option<TreeEntry>> {
        let entries = &self.entries;
        let dir = &self.dir;
        let pending = self
            .pending
            .get_or_insert_with(|| children(entries, dir).cloned().collect());
        let Some(path) = pending.pop_front() else {
            return Ok(None);
        };

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let entry = &self.entries[&path];
        let tree_entry = if entry.is_dir() {
            TreeEntry::dir(
                name,
                MapDir {
                    entries: Arc::clone(&self.entries),
                    dir: path,
                    pending: None,
                },
            )
        } else {
            TreeEntry::file(name, Cursor::new(entry.content()))
        };
        Ok(Some(tree_entry))
    }
}
