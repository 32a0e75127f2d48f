//! Directory and file metadata tree.
//!
//! Each storage holds a tree of [`DirMeta`] nodes with [`FileMeta`] leaves.
//! Names are unique among siblings of the same kind, root level included.
//! File content types come from the [`MimeContentType`] table, keyed by the
//! lower-cased extension.

mod directory;
mod file;
mod mime;
mod name;
mod service;

pub use directory::{DirMeta, DirectoryRepository, NewDirMeta};
pub use file::{FileMeta, FileMetaUpdate, FileRecord, FileRepository, NewFileMeta};
pub use mime::{
    resolve_mime_name, MimeContentType, MimeRepository, DEFAULT_MIME_TYPE, MAX_MIME_NAME_LENGTH,
};
pub use name::{extension_of, validate_name, MAX_NAME_LENGTH};
pub use service::{DirectoryListing, MetaService};
