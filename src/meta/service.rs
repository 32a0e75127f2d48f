//! Metadata tree service.
//!
//! This module provides the tree operations with their business rules:
//! - Name validation and sibling uniqueness (root level included)
//! - Parent directories from the same storage only
//! - No cycles when moving directories
//! - Quota checks when files are created, grown or trashed
//! - MIME classification of new files

use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::directory::{DirMeta, DirectoryRepository, NewDirMeta};
use super::file::{FileMeta, FileMetaUpdate, FileRecord, FileRepository, NewFileMeta};
use super::mime::MimeRepository;
use super::name::{extension_of, validate_name};
use crate::storage::{Storage, StorageRepository, StorageType};
use crate::{NimbusError, Result};

/// Contents of one directory level.
#[derive(Debug, Clone, Default)]
pub struct DirectoryListing {
    pub directories: Vec<DirMeta>,
    pub files: Vec<FileMeta>,
}

/// Service for tree operations on a storage.
pub struct MetaService<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MetaService<'a> {
    /// Create a new MetaService.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    fn directories(&self) -> DirectoryRepository<'a> {
        DirectoryRepository::new(self.pool)
    }

    fn files(&self) -> FileRepository<'a> {
        FileRepository::new(self.pool)
    }

    fn storages(&self) -> StorageRepository<'a> {
        StorageRepository::new(self.pool)
    }

    async fn require_storage(&self, storage_id: i64) -> Result<Storage> {
        self.storages()
            .get_by_id(storage_id)
            .await?
            .ok_or_else(|| NimbusError::NotFound("storage".to_string()))
    }

    /// Resolve a parent directory and check it belongs to `storage_id`.
    async fn require_parent(&self, storage_id: i64, parent_id: Option<Uuid>) -> Result<()> {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };
        let parent = self
            .directories()
            .get_by_id(parent_id)
            .await?
            .ok_or_else(|| NimbusError::NotFound("parent directory".to_string()))?;
        if parent.storage_id != storage_id {
            return Err(NimbusError::Validation(
                "parent directory belongs to another storage".to_string(),
            ));
        }
        Ok(())
    }

    /// Get a directory or fail with NotFound.
    pub async fn get_directory(&self, id: Uuid) -> Result<DirMeta> {
        self.directories()
            .get_by_id(id)
            .await?
            .ok_or_else(|| NimbusError::NotFound("directory".to_string()))
    }

    /// Get a file or fail with NotFound.
    pub async fn get_file(&self, id: Uuid) -> Result<FileMeta> {
        self.files()
            .get_by_id(id)
            .await?
            .ok_or_else(|| NimbusError::NotFound("file".to_string()))
    }

    /// List the directories and files directly below `parent_id` (None for
    /// the storage root).
    pub async fn list_directory(
        &self,
        storage_id: i64,
        parent_id: Option<Uuid>,
    ) -> Result<DirectoryListing> {
        self.require_storage(storage_id).await?;
        self.require_parent(storage_id, parent_id).await?;

        let directories = match parent_id {
            Some(id) => self.directories().list_children(id).await?,
            None => self.directories().list_root(storage_id).await?,
        };
        let files = self.files().list_by_parent(storage_id, parent_id).await?;
        Ok(DirectoryListing { directories, files })
    }

    /// Create a directory.
    pub async fn create_directory(
        &self,
        storage_id: i64,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> Result<DirMeta> {
        validate_name(name)?;
        self.require_storage(storage_id).await?;
        self.require_parent(storage_id, parent_id).await?;

        if self
            .directories()
            .name_exists(storage_id, parent_id, name, None)
            .await?
        {
            return Err(NimbusError::Conflict(format!(
                "a directory named '{name}' already exists here"
            )));
        }

        let mut new_dir = NewDirMeta::new(storage_id, name);
        if let Some(parent_id) = parent_id {
            new_dir = new_dir.with_parent(parent_id);
        }
        self.directories().create(&new_dir).await
    }

    /// Create a file.
    ///
    /// The content type comes from the extension's existing mapping, else the
    /// supplied content type, else a guess from the extension.
    pub async fn create_file(
        &self,
        storage_id: i64,
        parent_id: Option<Uuid>,
        new_file: &NewFileMeta,
    ) -> Result<FileMeta> {
        validate_name(&new_file.name)?;
        validate_size(new_file.size)?;
        self.require_storage(storage_id).await?;
        self.require_parent(storage_id, parent_id).await?;

        if self
            .files()
            .name_exists(storage_id, parent_id, &new_file.name, None)
            .await?
        {
            return Err(NimbusError::Conflict(format!(
                "a file named '{}' already exists here",
                new_file.name
            )));
        }

        let mime = MimeRepository::new(self.pool)
            .get_or_create(
                &extension_of(&new_file.name),
                new_file.content_type.as_deref(),
            )
            .await?;
        let capacity_quota = self.storages().capacity_quota(storage_id).await?;

        let record = FileRecord {
            storage_id,
            parent_id,
            name: &new_file.name,
            mime_type_id: mime.id,
            size: new_file.size,
        };
        self.files()
            .create(&record, capacity_quota)
            .await
            .inspect_err(|e| log_quota_rejection(e, storage_id))
    }

    /// Rename a file found by name within a directory.
    ///
    /// Renaming to the current name is a no-op.
    pub async fn rename_file(
        &self,
        storage_id: i64,
        parent_id: Option<Uuid>,
        old_name: &str,
        new_name: &str,
    ) -> Result<FileMeta> {
        validate_name(new_name)?;
        let file = self
            .files()
            .get_by_name(storage_id, parent_id, old_name)
            .await?
            .ok_or_else(|| NimbusError::NotFound("file".to_string()))?;

        if old_name == new_name {
            return Ok(file);
        }
        if self
            .files()
            .name_exists(storage_id, parent_id, new_name, Some(file.id))
            .await?
        {
            return Err(NimbusError::Conflict(format!(
                "a file named '{new_name}' already exists here"
            )));
        }

        debug!(file_id = %file.id, from = %old_name, to = %new_name, "Renaming file");
        self.files()
            .rename(file.id, new_name)
            .await?
            .ok_or_else(|| NimbusError::NotFound("file".to_string()))
    }

    /// Update a file's name, parent and/or size.
    pub async fn update_file(&self, id: Uuid, update: &FileMetaUpdate) -> Result<FileMeta> {
        if let Some(ref name) = update.name {
            validate_name(name)?;
        }
        if let Some(size) = update.size {
            validate_size(size)?;
        }

        let current = self.get_file(id).await?;
        if update.is_empty() {
            return Ok(current);
        }

        let target_parent = update.parent_id.unwrap_or(current.parent_id);
        let target_name = update.name.as_deref().unwrap_or(&current.name);
        if target_parent != current.parent_id {
            self.require_parent(current.storage_id, target_parent).await?;
        }
        if (target_parent != current.parent_id || target_name != current.name)
            && self
                .files()
                .name_exists(current.storage_id, target_parent, target_name, Some(id))
                .await?
        {
            return Err(NimbusError::Conflict(format!(
                "a file named '{target_name}' already exists here"
            )));
        }

        let capacity_quota = self.storages().capacity_quota(current.storage_id).await?;
        self.files()
            .update(id, update, capacity_quota)
            .await
            .inspect_err(|e| log_quota_rejection(e, current.storage_id))?
            .ok_or_else(|| NimbusError::NotFound("file".to_string()))
    }

    /// Rename a directory.
    pub async fn rename_directory(&self, id: Uuid, name: &str) -> Result<DirMeta> {
        self.update_directory(id, Some(name), None).await
    }

    /// Move a directory under another parent (None for the storage root).
    ///
    /// Moving a directory into itself or one of its descendants is rejected.
    pub async fn move_directory(&self, id: Uuid, parent_id: Option<Uuid>) -> Result<DirMeta> {
        self.update_directory(id, None, Some(parent_id)).await
    }

    /// Rename and/or move a directory.
    ///
    /// `parent_id` is None to keep the current parent, `Some(None)` for the
    /// storage root. Every check runs before the single write, so a rejected
    /// update changes nothing.
    pub async fn update_directory(
        &self,
        id: Uuid,
        name: Option<&str>,
        parent_id: Option<Option<Uuid>>,
    ) -> Result<DirMeta> {
        if let Some(name) = name {
            validate_name(name)?;
        }
        let dir = self.get_directory(id).await?;
        let target_parent = parent_id.unwrap_or(dir.parent_id);
        let target_name = name.unwrap_or(&dir.name);
        if target_parent == dir.parent_id && target_name == dir.name {
            return Ok(dir);
        }

        if target_parent != dir.parent_id {
            self.require_parent(dir.storage_id, target_parent).await?;
        }
        if self
            .directories()
            .name_exists(dir.storage_id, target_parent, target_name, Some(id))
            .await?
        {
            return Err(NimbusError::Conflict(format!(
                "a directory named '{target_name}' already exists there"
            )));
        }

        debug!(dir_id = %id, parent = ?target_parent, name = %target_name, "Updating directory");
        self.directories()
            .relocate(id, target_parent, name)
            .await?
            .ok_or_else(|| NimbusError::NotFound("directory".to_string()))
    }

    /// Delete a directory and everything below it.
    pub async fn delete_directory(&self, id: Uuid) -> Result<()> {
        if !self.directories().delete(id).await? {
            return Err(NimbusError::NotFound("directory".to_string()));
        }
        info!(dir_id = %id, "Deleted directory");
        Ok(())
    }

    /// Delete a file.
    pub async fn delete_file(&self, id: Uuid) -> Result<()> {
        if !self.files().delete(id).await? {
            return Err(NimbusError::NotFound("file".to_string()));
        }
        info!(file_id = %id, "Deleted file");
        Ok(())
    }

    /// Move a file to the root of its owner's trash storage.
    pub async fn trash_file(&self, id: Uuid) -> Result<FileMeta> {
        let file = self.get_file(id).await?;
        let storage = self.require_storage(file.storage_id).await?;
        if storage.storage_type == StorageType::Trash {
            return Err(NimbusError::Validation(
                "file is already in the trash".to_string(),
            ));
        }

        let trash = self
            .storages()
            .get_by_owner_and_type(storage.owner_id, StorageType::Trash)
            .await?
            .ok_or_else(|| NimbusError::NotFound("trash storage".to_string()))?;

        if self
            .files()
            .name_exists(trash.id, None, &file.name, None)
            .await?
        {
            return Err(NimbusError::Conflict(format!(
                "the trash already holds a file named '{}'",
                file.name
            )));
        }

        let capacity_quota = self.storages().capacity_quota(trash.id).await?;
        let trashed = self
            .files()
            .move_to_storage(id, trash.id, capacity_quota)
            .await
            .inspect_err(|e| log_quota_rejection(e, trash.id))?
            .ok_or_else(|| NimbusError::NotFound("file".to_string()))?;

        info!(file_id = %id, from = storage.id, to = trash.id, "Moved file to trash");
        Ok(trashed)
    }
}

fn validate_size(size: i64) -> Result<()> {
    if size < 0 {
        return Err(NimbusError::Validation(
            "size cannot be negative".to_string(),
        ));
    }
    Ok(())
}

fn log_quota_rejection(err: &NimbusError, storage_id: i64) {
    if let NimbusError::QuotaExceeded { needed, available } = err {
        warn!(storage_id, needed, available, "Rejected write over quota");
    }
}
