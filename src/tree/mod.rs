mod entry;
mod map_tree;
mod slice_dir;

pub use entry::{Entry, EntryType};
pub use map_tree::{MapDir, MapTree};
pub use slice_dir::SliceDir;
