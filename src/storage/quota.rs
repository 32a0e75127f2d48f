//! Quota arithmetic for storages.

use super::StorageType;
use crate::account::Capacity;
use crate::NimbusError;

/// Divisor applied to the plan capacity for trash storages.
pub const TRASH_QUOTA_DIVISOR: i64 = 10;

/// Maximum aggregate file size for a storage of the given type.
///
/// Main and thumb storages get the full plan capacity; trash gets a tenth.
pub fn capacity_quota(storage_type: StorageType, capacity: Capacity) -> i64 {
    match storage_type {
        StorageType::Main | StorageType::Thumb => capacity.bytes(),
        StorageType::Trash => capacity.bytes() / TRASH_QUOTA_DIVISOR,
    }
}

/// Build the error for a write that does not fit.
pub fn exceeded(quota: i64, used: i64, needed: i64) -> NimbusError {
    NimbusError::QuotaExceeded {
        needed,
        available: (quota - used).max(0),
    }
}
