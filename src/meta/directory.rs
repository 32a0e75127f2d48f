//! Directory metadata and repository.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::datetime::parse_db_datetime;
use crate::{NimbusError, Result};

/// A directory in a storage's tree.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct DirMeta {
    /// Unique directory ID.
    pub id: Uuid,
    /// Storage the directory lives in.
    pub storage_id: i64,
    /// Directory name.
    pub name: String,
    /// Parent directory (None at the root).
    pub parent_id: Option<Uuid>,
    pub created_at: String,
    pub modified_at: String,
}

impl DirMeta {
    /// Check whether the directory sits below another directory.
    pub fn has_parent(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Get the modified_at as DateTime<Utc>.
    pub fn modified_at_datetime(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        parse_db_datetime(&self.modified_at)
    }
}

/// Data for creating a new directory.
#[derive(Debug, Clone)]
pub struct NewDirMeta {
    pub storage_id: i64,
    pub name: String,
    pub parent_id: Option<Uuid>,
}

impl NewDirMeta {
    /// Create a root-level directory.
    pub fn new(storage_id: i64, name: impl Into<String>) -> Self {
        Self {
            storage_id,
            name: name.into(),
            parent_id: None,
        }
    }

    /// Set the parent directory.
    pub fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

const SELECT_DIR: &str =
    "SELECT id, storage_id, name, parent_id, created_at, modified_at FROM dir_meta";

/// Repository for directory CRUD operations.
pub struct DirectoryRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DirectoryRepository<'a> {
    /// Create a new DirectoryRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new directory with a fresh ID.
    pub async fn create(&self, dir: &NewDirMeta) -> Result<DirMeta> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO dir_meta (id, storage_id, name, parent_id) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(dir.storage_id)
            .bind(&dir.name)
            .bind(dir.parent_id)
            .execute(self.pool)
            .await?;

        debug!(dir_id = %id, storage_id = dir.storage_id, name = %dir.name, "Created directory");
        self.get_by_id(id)
            .await?
            .ok_or_else(|| NimbusError::NotFound("directory".to_string()))
    }

    /// Get a directory by ID.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<DirMeta>> {
        let dir = sqlx::query_as::<_, DirMeta>(&format!("{SELECT_DIR} WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(dir)
    }

    /// List the root-level directories of a storage.
    pub async fn list_root(&self, storage_id: i64) -> Result<Vec<DirMeta>> {
        let dirs = sqlx::query_as::<_, DirMeta>(&format!(
            "{SELECT_DIR} WHERE storage_id = ? AND parent_id IS NULL ORDER BY name, rowid"
        ))
        .bind(storage_id)
        .fetch_all(self.pool)
        .await?;

        Ok(dirs)
    }

    /// List the direct subdirectories of a directory.
    pub async fn list_children(&self, parent_id: Uuid) -> Result<Vec<DirMeta>> {
        let dirs = sqlx::query_as::<_, DirMeta>(&format!(
            "{SELECT_DIR} WHERE parent_id = ? ORDER BY name, rowid"
        ))
        .bind(parent_id)
        .fetch_all(self.pool)
        .await?;

        Ok(dirs)
    }

    /// Check whether any directory or file has this directory as parent.
    pub async fn has_children(&self, id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM dir_meta WHERE parent_id = ?1)
                 OR EXISTS(SELECT 1 FROM file_meta WHERE parent_id = ?1)",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Move a directory under another parent (None for the root).
    ///
    /// Returns the updated directory, or None if not found.
    pub async fn move_to(&self, id: Uuid, parent_id: Option<Uuid>) -> Result<Option<DirMeta>> {
        self.relocate(id, parent_id, None).await
    }

    /// Set a directory's parent and, when given, its name in one statement.
    ///
    /// The statement only applies when `id` is not among the new parent's
    /// ancestors (itself included), so concurrent moves cannot close a loop.
    /// Such a move fails with a validation error. Returns None if the
    /// directory does not exist.
    pub async fn relocate(
        &self,
        id: Uuid,
        parent_id: Option<Uuid>,
        name: Option<&str>,
    ) -> Result<Option<DirMeta>> {
        let result = sqlx::query(
            "UPDATE dir_meta
             SET parent_id = ?2, name = COALESCE(?3, name), modified_at = datetime('now')
             WHERE id = ?1
               AND NOT EXISTS (
                   WITH RECURSIVE ancestors(id) AS (
                       SELECT ?2
                       UNION
                       SELECT d.parent_id FROM dir_meta d JOIN ancestors a ON d.id = a.id
                       WHERE d.parent_id IS NOT NULL
                   )
                   SELECT 1 FROM ancestors WHERE id = ?1
               )",
        )
        .bind(id)
        .bind(parent_id)
        .bind(name)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get_by_id(id).await? {
                Some(_) => Err(NimbusError::Validation(
                    "cannot move a directory into itself or one of its descendants".to_string(),
                )),
                None => Ok(None),
            };
        }
        self.get_by_id(id).await
    }

    /// Delete a directory together with everything below it.
    ///
    /// Returns true if a directory was deleted, false if not found.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM dir_meta WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Directories from the root down to `id`, inclusive.
    ///
    /// Empty when the directory does not exist. The walk stops after as many
    /// steps as there are directories, so it ends even on a damaged tree.
    pub async fn path(&self, id: Uuid) -> Result<Vec<DirMeta>> {
        let dirs = sqlx::query_as::<_, DirMeta>(
            "WITH RECURSIVE ancestors(id, depth) AS (
                 SELECT id, 0 FROM dir_meta WHERE id = ?
                 UNION ALL
                 SELECT d.parent_id, a.depth + 1
                 FROM dir_meta d JOIN ancestors a ON d.id = a.id
                 WHERE d.parent_id IS NOT NULL
                   AND a.depth < (SELECT COUNT(*) FROM dir_meta)
             )
             SELECT d.id, d.storage_id, d.name, d.parent_id, d.created_at, d.modified_at
             FROM dir_meta d JOIN ancestors a ON d.id = a.id
             ORDER BY a.depth DESC",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(dirs)
    }

    /// Check whether `candidate` is `ancestor` or lies anywhere below it.
    pub async fn is_within(&self, candidate: Uuid, ancestor: Uuid) -> Result<bool> {
        let within: bool = sqlx::query_scalar(
            "WITH RECURSIVE ancestors(id) AS (
                 SELECT ?1
                 UNION
                 SELECT d.parent_id FROM dir_meta d JOIN ancestors a ON d.id = a.id
                 WHERE d.parent_id IS NOT NULL
             )
             SELECT EXISTS(SELECT 1 FROM ancestors WHERE id = ?2)",
        )
        .bind(candidate)
        .bind(ancestor)
        .fetch_one(self.pool)
        .await?;
        Ok(within)
    }

    /// Check whether a sibling directory already uses `name`.
    ///
    /// Siblings are directories of the same storage with the same parent;
    /// `exclude` skips the directory being renamed or moved.
    pub async fn name_exists(
        &self,
        storage_id: i64,
        parent_id: Option<Uuid>,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM dir_meta
             WHERE storage_id = ? AND parent_id IS ? AND name = ? AND id IS NOT ?)",
        )
        .bind(storage_id)
        .bind(parent_id)
        .bind(name)
        .bind(exclude)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }
}
