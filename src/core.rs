use std::fmt;
use std::io::{self, Cursor, Read};

/// A source of file tree entries, yielded one at a time in a fixed order.
///
/// `Ok(None)` means the tree has no more entries. Implementations are free to
/// block inside `next_file()`; the encoder calls it only when the previous
/// entry has been fully consumed.
pub trait FileTree {
    fn next_file(&mut self) -> io::Result<Option<TreeEntry>>;
}

impl<T: FileTree + ?Sized> FileTree for Box<T> {
    fn next_file(&mut self) -> io::Result<Option<TreeEntry>> {
        (**self).next_file()
    }
}

/// Content of a tree entry: raw bytes for a file, further entries for a directory.
pub enum Content {
    File(Box<dyn Read + Send>),
    Directory(Box<dyn FileTree + Send>),
}

/// A named entry yielded by a [`FileTree`].
pub struct TreeEntry {
    name: String,
    content: Content,
}

impl TreeEntry {
    pub fn new<S: Into<String>>(name: S, content: Content) -> TreeEntry {
        TreeEntry {
            name: name.into(),
            content,
        }
    }

    /// A file entry whose content is pulled from `reader`.
    pub fn file<S, R>(name: S, reader: R) -> TreeEntry
    where
        S: Into<String>,
        R: Read + Send + 'static,
    {
        Self::new(name, Content::File(Box::new(reader)))
    }

    /// A file entry over an in-memory byte buffer.
    pub fn bytes<S, B>(name: S, data: B) -> TreeEntry
    where
        S: Into<String>,
        B: AsRef<[u8]> + Send + 'static,
    {
        Self::file(name, Cursor::new(data))
    }

    /// A directory entry whose children are yielded by `tree`.
    pub fn dir<S, T>(name: S, tree: T) -> TreeEntry
    where
        S: Into<String>,
        T: FileTree + Send + 'static,
    {
        Self::new(name, Content::Directory(Box::new(tree)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.content, Content::Directory(_))
    }

    pub fn is_file(&self) -> bool {
        !self.is_dir()
    }

    pub fn into_parts(self) -> (String, Content) {
        (self.name, self.content)
    }
}

impl fmt::Debug for TreeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeEntry")
            .field("name", &self.name)
            .field("is_dir", &self.is_dir())
            .finish()
    }
}

pub type Result<T> = std::result::Result<T, anyhow::Error>;

pub(crate) mod utils {
    use std::path::{Component, Path, PathBuf};

    /// Collapses `.` and `..` and makes `path` absolute relative to the inner root `/`.
    pub fn normalize<P: AsRef<Path>>(path: P) -> PathBuf {
        let mut result = PathBuf::from("/");
        for component in path.as_ref().components() {
            match component {
                Component::Normal(part) => result.push(part),
                Component::ParentDir => {
                    result.pop();
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
        result
    }

    pub fn is_virtual_root<P: AsRef<Path>>(path: P) -> bool {
        normalize(path) == Path::new("/")
    }
}
