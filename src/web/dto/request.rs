//! Request DTOs for Web API.

use serde::{Deserialize, Deserializer};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::validation::no_control_chars;
use crate::meta::{FileMetaUpdate, NewFileMeta};

const DEFAULT_PER_PAGE: u32 = 20;

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
fn explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Uuid>::deserialize(deserializer).map(Some)
}

/// Pagination query parameters.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    /// Page number (1-based).
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationQuery {
    /// Clamp `page` to at least 1 and `per_page` to `1..=max_per_page`.
    pub fn clamped(self, max_per_page: u32) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, max_per_page.max(1)),
        }
    }

    /// Convert to SQL offset and limit.
    pub fn to_offset_limit(&self) -> (i64, i64) {
        let page = self.page.max(1) as i64;
        let per_page = self.per_page as i64;
        ((page - 1) * per_page, per_page)
    }
}

/// Query parameters for the file list.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FileListQuery {
    /// Only list files of this storage.
    pub storage: Option<i64>,
}

/// File creation request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFileRequest {
    /// Target storage ID.
    pub storage: i64,
    /// Parent directory ID; omitted or null for the storage root.
    #[serde(default)]
    pub parent: Option<Uuid>,
    /// File name.
    #[validate(length(min = 1, max = 4096), custom(function = "no_control_chars"))]
    pub name: String,
    /// MIME name to use when the extension has no mapping yet.
    #[serde(default)]
    #[validate(length(max = 100))]
    pub content_type: Option<String>,
    /// Size in bytes.
    #[validate(range(min = 0))]
    pub size: i64,
}

impl CreateFileRequest {
    /// Convert into the service-level description of the new file.
    pub fn to_new_file(&self) -> NewFileMeta {
        let new_file = NewFileMeta::new(self.name.clone(), self.size);
        match self.content_type {
            Some(ref content_type) => new_file.with_content_type(content_type.clone()),
            None => new_file,
        }
    }
}

/// Full file update (PUT). An omitted parent moves the file to the root.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReplaceFileRequest {
    /// File name.
    #[validate(length(min = 1, max = 4096), custom(function = "no_control_chars"))]
    pub name: String,
    /// Parent directory ID.
    #[serde(default)]
    pub parent: Option<Uuid>,
    /// Size in bytes.
    #[validate(range(min = 0))]
    pub size: i64,
}

impl ReplaceFileRequest {
    pub fn to_update(&self) -> FileMetaUpdate {
        FileMetaUpdate::new()
            .name(self.name.clone())
            .parent_id(self.parent)
            .size(self.size)
    }
}

/// Partial file update (PATCH).
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateFileRequest {
    /// New name.
    #[serde(default)]
    #[validate(length(min = 1, max = 4096), custom(function = "no_control_chars"))]
    pub name: Option<String>,
    /// New parent directory; `null` moves the file to the storage root.
    #[serde(default, deserialize_with = "explicit_null")]
    #[schema(value_type = Option<Uuid>)]
    pub parent: Option<Option<Uuid>>,
    /// New size in bytes.
    #[serde(default)]
    #[validate(range(min = 0))]
    pub size: Option<i64>,
}

impl UpdateFileRequest {
    pub fn to_update(&self) -> FileMetaUpdate {
        let mut update = FileMetaUpdate::new();
        if let Some(ref name) = self.name {
            update = update.name(name.clone());
        }
        if let Some(parent) = self.parent {
            update = update.parent_id(parent);
        }
        if let Some(size) = self.size {
            update = update.size(size);
        }
        update
    }
}

/// Directory creation request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDirectoryRequest {
    /// Directory name.
    #[validate(length(min = 1, max = 4096), custom(function = "no_control_chars"))]
    pub name: String,
    /// Parent directory ID; omitted or null for the storage root.
    #[serde(default)]
    pub parent: Option<Uuid>,
}

/// Directory rename and/or move request.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateDirectoryRequest {
    /// New name.
    #[serde(default)]
    #[validate(length(min = 1, max = 4096), custom(function = "no_control_chars"))]
    pub name: Option<String>,
    /// New parent directory; `null` moves the directory to the storage root.
    #[serde(default, deserialize_with = "explicit_null")]
    #[schema(value_type = Option<Uuid>)]
    pub parent: Option<Option<Uuid>>,
}

/// Query parameters for a directory listing.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DirectoryQuery {
    /// List the children of this directory instead of the root.
    pub parent: Option<Uuid>,
}

/// User registration request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Username.
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    /// Email (optional).
    #[serde(default)]
    #[validate(length(max = 254))]
    pub email: Option<String>,
    /// Preferred language code (optional).
    #[serde(default)]
    pub language: Option<String>,
}
