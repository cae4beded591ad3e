//! Directory scanning logic

mod walker;

pub use walker::{list_directory, stat_entry, DirListing, Symlinks};
