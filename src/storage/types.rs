//! Storage types.

use std::fmt;

use crate::{NimbusError, Result};

/// Kind of storage bucket. Each profile owns one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageType {
    /// Primary bucket for user files.
    Main = 1,
    /// Deleted files awaiting purge.
    Trash = 2,
    /// Generated thumbnails.
    Thumb = 3,
}

impl StorageType {
    /// All storage types in creation order.
    pub const ALL: [StorageType; 3] = [StorageType::Main, StorageType::Trash, StorageType::Thumb];

    /// Database representation.
    pub fn as_i64(&self) -> i64 {
        *self as i64
    }

    /// Short machine name used by the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Main => "main",
            StorageType::Trash => "trash",
            StorageType::Thumb => "thumb",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} storage", self.as_str())
    }
}

impl TryFrom<i64> for StorageType {
    type Error = NimbusError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            1 => Ok(StorageType::Main),
            2 => Ok(StorageType::Trash),
            3 => Ok(StorageType::Thumb),
            _ => Err(NimbusError::Validation(format!(
                "unknown storage type: {value}"
            ))),
        }
    }
}

/// A per-user storage bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct Storage {
    /// Unique storage ID.
    pub id: i64,
    /// Bucket kind.
    pub storage_type: StorageType,
    /// Owning profile.
    pub owner_id: i64,
    /// When the storage was created.
    pub created_at: String,
}

impl Storage {
    /// Label in the form `main storage (alice)`.
    pub fn label(&self, username: &str) -> String {
        format!("{} ({})", self.storage_type, username)
    }
}

/// Point-in-time usage summary of a storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageUsage {
    pub storage_id: i64,
    /// Maximum aggregate file size in bytes.
    pub capacity_quota: i64,
    /// Sum of all file sizes in bytes.
    pub total_size: i64,
    pub file_count: i64,
    pub directory_count: i64,
}

impl StorageUsage {
    /// Bytes still available, never negative.
    pub fn remaining(&self) -> i64 {
        (self.capacity_quota - self.total_size).max(0)
    }

    /// True when the storage holds more than its quota, e.g. after a downgrade.
    pub fn is_over_quota(&self) -> bool {
        self.total_size > self.capacity_quota
    }
}
