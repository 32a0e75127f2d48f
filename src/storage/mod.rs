//! Storage module for nimbus.
//!
//! Every profile owns three storages (main, trash and thumb). Each storage
//! has a capacity quota derived from the owner's service; its used size is
//! always computed from the files it holds.

pub mod quota;
mod repository;
mod types;

pub use quota::capacity_quota;
pub use repository::StorageRepository;
pub use types::{Storage, StorageType, StorageUsage};
