//! Response DTOs for Web API.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::account::{Registration, Service};
use crate::datetime::to_rfc3339;
use crate::meta::{DirMeta, DirectoryListing, FileMeta};
use crate::storage::{Storage, StorageUsage};

// ============================================================================
// Generic Response Wrappers
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    /// Response data.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PaginationMeta,
}

impl<T: Serialize> PaginatedResponse<T> {
    /// Create a new paginated response.
    pub fn new(data: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        Self {
            data,
            meta: PaginationMeta {
                page,
                per_page,
                total,
            },
        }
    }
}

/// Pagination metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u64,
}

// ============================================================================
// Tree DTOs
// ============================================================================

/// File metadata response.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileResponse {
    /// File ID.
    pub id: Uuid,
    /// Storage ID.
    pub storage: i64,
    /// Creation timestamp.
    pub created_at: String,
    /// Last modification timestamp.
    pub modified_at: String,
    /// File name.
    pub name: String,
    /// Parent directory ID (null at the storage root).
    pub parent: Option<Uuid>,
    /// MIME name.
    pub content_type: String,
    /// Size in bytes.
    pub size: i64,
}

impl From<FileMeta> for FileResponse {
    fn from(file: FileMeta) -> Self {
        Self {
            id: file.id,
            storage: file.storage_id,
            created_at: to_rfc3339(&file.created_at),
            modified_at: to_rfc3339(&file.modified_at),
            name: file.name,
            parent: file.parent_id,
            content_type: file.content_type,
            size: file.size,
        }
    }
}

/// Directory metadata response.
#[derive(Debug, Serialize, ToSchema)]
pub struct DirectoryResponse {
    /// Directory ID.
    pub id: Uuid,
    /// Storage ID.
    pub storage: i64,
    /// Creation timestamp.
    pub created_at: String,
    /// Last modification timestamp.
    pub modified_at: String,
    /// Directory name.
    pub name: String,
    /// Parent directory ID (null at the storage root).
    pub parent: Option<Uuid>,
}

impl From<DirMeta> for DirectoryResponse {
    fn from(dir: DirMeta) -> Self {
        Self {
            id: dir.id,
            storage: dir.storage_id,
            created_at: to_rfc3339(&dir.created_at),
            modified_at: to_rfc3339(&dir.modified_at),
            name: dir.name,
            parent: dir.parent_id,
        }
    }
}

/// One level of the tree.
#[derive(Debug, Serialize, ToSchema)]
pub struct DirectoryListingResponse {
    /// The listed directory (absent for the storage root).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<DirectoryResponse>,
    /// Child directories.
    pub directories: Vec<DirectoryResponse>,
    /// Child files.
    pub files: Vec<FileResponse>,
}

impl DirectoryListingResponse {
    pub fn new(directory: Option<DirMeta>, listing: DirectoryListing) -> Self {
        Self {
            directory: directory.map(DirectoryResponse::from),
            directories: listing.directories.into_iter().map(Into::into).collect(),
            files: listing.files.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Storage DTOs
// ============================================================================

/// Storage response.
#[derive(Debug, Serialize, ToSchema)]
pub struct StorageResponse {
    /// Storage ID.
    pub id: i64,
    /// Storage type (main, trash or thumb).
    pub storage_type: String,
    /// Owning profile ID.
    pub owner: i64,
    /// Creation timestamp.
    pub created_at: String,
}

impl From<Storage> for StorageResponse {
    fn from(storage: Storage) -> Self {
        Self {
            id: storage.id,
            storage_type: storage.storage_type.as_str().to_string(),
            owner: storage.owner_id,
            created_at: to_rfc3339(&storage.created_at),
        }
    }
}

/// Storage usage summary.
#[derive(Debug, Serialize, ToSchema)]
pub struct StorageUsageResponse {
    /// Storage details.
    pub storage: StorageResponse,
    /// Quota in bytes.
    pub capacity_quota: i64,
    /// Bytes in use.
    pub total_size: i64,
    /// Bytes left.
    pub remaining: i64,
    /// Number of files.
    pub file_count: i64,
    /// Number of directories.
    pub directory_count: i64,
}

impl StorageUsageResponse {
    pub fn new(storage: Storage, usage: StorageUsage) -> Self {
        Self {
            storage: storage.into(),
            capacity_quota: usage.capacity_quota,
            total_size: usage.total_size,
            remaining: usage.remaining(),
            file_count: usage.file_count,
            directory_count: usage.directory_count,
        }
    }
}

// ============================================================================
// Account DTOs
// ============================================================================

/// Service plan response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceResponse {
    /// Service ID.
    pub id: i64,
    /// Plan name.
    pub name: String,
    /// Price with two decimals.
    pub price: String,
    /// Capacity in bytes.
    pub capacity: i64,
    /// Human-readable capacity.
    pub capacity_label: String,
}

impl From<Service> for ServiceResponse {
    fn from(service: Service) -> Self {
        Self {
            id: service.id,
            price: service.price(),
            capacity: service.capacity.bytes(),
            capacity_label: service.capacity.label().to_string(),
            name: service.name,
        }
    }
}

/// Registration result.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegistrationResponse {
    /// User ID.
    pub user_id: i64,
    /// Username.
    pub username: String,
    /// Profile ID.
    pub profile_id: i64,
    /// Service plan ID.
    pub service: i64,
    /// Preferred language.
    pub language: String,
    /// The storages created for the profile.
    pub storages: Vec<StorageResponse>,
}

impl From<Registration> for RegistrationResponse {
    fn from(reg: Registration) -> Self {
        Self {
            user_id: reg.user.id,
            username: reg.user.username,
            profile_id: reg.profile.id,
            service: reg.profile.service_id,
            language: reg.profile.language,
            storages: reg.storages.into_iter().map(Into::into).collect(),
        }
    }
}
