//! File metadata and repository.
//!
//! Writes that add bytes to a storage carry the storage's quota and check it
//! in the same SQL statement that performs the write, so two concurrent
//! writers cannot both slip under the limit.

use sqlx::{QueryBuilder, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::datetime::parse_db_datetime;
use crate::storage::quota;
use crate::{NimbusError, Result};

/// A file in a storage's tree.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct FileMeta {
    /// Unique file ID.
    pub id: Uuid,
    /// Storage the file lives in.
    pub storage_id: i64,
    /// File name.
    pub name: String,
    /// Parent directory (None at the root).
    pub parent_id: Option<Uuid>,
    /// MIME mapping the file was classified as.
    pub mime_type_id: i64,
    /// MIME name of that mapping.
    pub content_type: String,
    /// Size in bytes.
    pub size: i64,
    pub created_at: String,
    pub modified_at: String,
}

impl FileMeta {
    /// Get the modified_at as DateTime<Utc>.
    pub fn modified_at_datetime(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        parse_db_datetime(&self.modified_at)
    }
}

/// Caller-facing data for creating a file.
#[derive(Debug, Clone)]
pub struct NewFileMeta {
    pub name: String,
    /// Explicit MIME name; derived from the extension when absent.
    pub content_type: Option<String>,
    pub size: i64,
}

impl NewFileMeta {
    /// Create file data with a name and size.
    pub fn new(name: impl Into<String>, size: i64) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            size,
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// A fully resolved row to insert.
#[derive(Debug, Clone)]
pub struct FileRecord<'r> {
    pub storage_id: i64,
    pub parent_id: Option<Uuid>,
    pub name: &'r str,
    pub mime_type_id: i64,
    pub size: i64,
}

/// Data for updating a file.
#[derive(Debug, Clone, Default)]
pub struct FileMetaUpdate {
    pub name: Option<String>,
    /// New parent; `Some(None)` moves the file to the root.
    pub parent_id: Option<Option<Uuid>>,
    pub size: Option<i64>,
}

impl FileMetaUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set new name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set new parent directory.
    pub fn parent_id(mut self, parent_id: Option<Uuid>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Set new size.
    pub fn size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }

    /// Check if the update is empty.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.parent_id.is_none() && self.size.is_none()
    }
}

const SELECT_FILE: &str = "SELECT f.id, f.storage_id, f.name, f.parent_id, f.mime_type_id,
            m.name AS content_type, f.size, f.created_at, f.modified_at
     FROM file_meta f JOIN mime_content_types m ON m.id = f.mime_type_id";

/// Repository for file CRUD operations.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a file if it fits within `capacity_quota`.
    pub async fn create(&self, record: &FileRecord<'_>, capacity_quota: i64) -> Result<FileMeta> {
        let id = Uuid::new_v4();
        let result = sqlx::query(
            "INSERT INTO file_meta (id, storage_id, name, parent_id, mime_type_id, size)
             SELECT ?, ?, ?, ?, ?, ?
             WHERE (SELECT COALESCE(SUM(size), 0) FROM file_meta WHERE storage_id = ?) + ? <= ?",
        )
        .bind(id)
        .bind(record.storage_id)
        .bind(record.name)
        .bind(record.parent_id)
        .bind(record.mime_type_id)
        .bind(record.size)
        .bind(record.storage_id)
        .bind(record.size)
        .bind(capacity_quota)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let used = self.storage_size(record.storage_id).await?;
            return Err(quota::exceeded(capacity_quota, used, record.size));
        }

        debug!(file_id = %id, storage_id = record.storage_id, size = record.size, "Created file");
        self.get_by_id(id)
            .await?
            .ok_or_else(|| NimbusError::NotFound("file".to_string()))
    }

    /// Get a file by ID.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<FileMeta>> {
        let file = sqlx::query_as::<_, FileMeta>(&format!("{SELECT_FILE} WHERE f.id = ?"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(file)
    }

    /// Get a file by name within a directory (None for the root).
    pub async fn get_by_name(
        &self,
        storage_id: i64,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> Result<Option<FileMeta>> {
        let file = sqlx::query_as::<_, FileMeta>(&format!(
            "{SELECT_FILE} WHERE f.storage_id = ? AND f.parent_id IS ? AND f.name = ?"
        ))
        .bind(storage_id)
        .bind(parent_id)
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(file)
    }

    /// List all files in creation order.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<FileMeta>> {
        let files = sqlx::query_as::<_, FileMeta>(&format!(
            "{SELECT_FILE} ORDER BY f.rowid LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(files)
    }

    /// Count all files.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM file_meta")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// List the files of a storage in creation order.
    pub async fn list_by_storage(
        &self,
        storage_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FileMeta>> {
        let files = sqlx::query_as::<_, FileMeta>(&format!(
            "{SELECT_FILE} WHERE f.storage_id = ? ORDER BY f.rowid LIMIT ? OFFSET ?"
        ))
        .bind(storage_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(files)
    }

    /// Count the files of a storage.
    pub async fn count_by_storage(&self, storage_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM file_meta WHERE storage_id = ?")
            .bind(storage_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// List the files directly inside a directory (None for the root), by name.
    pub async fn list_by_parent(
        &self,
        storage_id: i64,
        parent_id: Option<Uuid>,
    ) -> Result<Vec<FileMeta>> {
        let files = sqlx::query_as::<_, FileMeta>(&format!(
            "{SELECT_FILE} WHERE f.storage_id = ? AND f.parent_id IS ? ORDER BY f.name, f.rowid"
        ))
        .bind(storage_id)
        .bind(parent_id)
        .fetch_all(self.pool)
        .await?;

        Ok(files)
    }

    /// Update a file.
    ///
    /// Growing a file is checked against `capacity_quota`; shrinking always
    /// succeeds. Returns the updated file, or None if not found.
    pub async fn update(
        &self,
        id: Uuid,
        update: &FileMetaUpdate,
        capacity_quota: i64,
    ) -> Result<Option<FileMeta>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE file_meta SET ");
        let mut separated = query.separated(", ");

        if let Some(ref name) = update.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name);
        }
        if let Some(parent_id) = update.parent_id {
            separated.push("parent_id = ");
            separated.push_bind_unseparated(parent_id);
        }
        if let Some(size) = update.size {
            separated.push("size = ");
            separated.push_bind_unseparated(size);
        }
        separated.push("modified_at = datetime('now')");

        query.push(" WHERE id = ");
        query.push_bind(id);

        if let Some(size) = update.size {
            query.push(" AND (");
            query.push_bind(size);
            query.push(
                " <= file_meta.size OR (SELECT COALESCE(SUM(other.size), 0) FROM file_meta other
                  WHERE other.storage_id = file_meta.storage_id AND other.id != file_meta.id) + ",
            );
            query.push_bind(size);
            query.push(" <= ");
            query.push_bind(capacity_quota);
            query.push(")");
        }

        let result = query.build().execute(self.pool).await?;

        if result.rows_affected() == 0 {
            let Some(current) = self.get_by_id(id).await? else {
                return Ok(None);
            };
            let used = self.storage_size(current.storage_id).await? - current.size;
            return Err(quota::exceeded(
                capacity_quota,
                used,
                update.size.unwrap_or(current.size),
            ));
        }

        self.get_by_id(id).await
    }

    /// Rename a file.
    ///
    /// Returns the updated file, or None if not found.
    pub async fn rename(&self, id: Uuid, name: &str) -> Result<Option<FileMeta>> {
        let result = sqlx::query(
            "UPDATE file_meta SET name = ?, modified_at = datetime('now') WHERE id = ?",
        )
        .bind(name)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Move a file to the root of another storage if it fits in that
    /// storage's `capacity_quota`.
    ///
    /// Returns the moved file, or None if not found.
    pub async fn move_to_storage(
        &self,
        id: Uuid,
        storage_id: i64,
        capacity_quota: i64,
    ) -> Result<Option<FileMeta>> {
        let result = sqlx::query(
            "UPDATE file_meta SET storage_id = ?1, parent_id = NULL, modified_at = datetime('now')
             WHERE id = ?2
               AND (SELECT COALESCE(SUM(other.size), 0) FROM file_meta other
                    WHERE other.storage_id = ?1) + file_meta.size <= ?3",
        )
        .bind(storage_id)
        .bind(id)
        .bind(capacity_quota)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let Some(current) = self.get_by_id(id).await? else {
                return Ok(None);
            };
            let used = self.storage_size(storage_id).await?;
            return Err(quota::exceeded(capacity_quota, used, current.size));
        }

        debug!(file_id = %id, storage_id, "Moved file to another storage");
        self.get_by_id(id).await
    }

    /// Delete a file.
    ///
    /// Returns true if a file was deleted, false if not found.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM file_meta WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Check whether a sibling file already uses `name`.
    ///
    /// `exclude` skips the file being renamed or moved.
    pub async fn name_exists(
        &self,
        storage_id: i64,
        parent_id: Option<Uuid>,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM file_meta
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

    async fn storage_size(&self, storage_id: i64) -> Result<i64> {
        let total: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(size), 0) FROM file_meta WHERE storage_id = ?")
                .bind(storage_id)
                .fetch_one(self.pool)
                .await?;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{register, RegistrationRequest};
    use crate::config::LocaleConfig;
    use crate::meta::{DirectoryRepository, MimeRepository, NewDirMeta};
    use crate::storage::StorageType;
    use crate::Database;

    struct Fixture {
        db: Database,
        main: i64,
        trash: i64,
        mime: i64,
    }

    async fn setup() -> Fixture {
        let db = Database::open_in_memory().await.unwrap();
        let reg = register(
            db.pool(),
            &RegistrationRequest::new("alice"),
            &LocaleConfig::default(),
        )
        .await
        .unwrap();
        let mime = MimeRepository::new(db.pool())
            .get_or_create("txt", None)
            .await
            .unwrap()
            .id;
        Fixture {
            main: reg.storage(StorageType::Main).unwrap().id,
            trash: reg.storage(StorageType::Trash).unwrap().id,
            db,
            mime,
        }
    }

    fn record(f: &Fixture, name: &'static str, size: i64) -> FileRecord<'static> {
        FileRecord {
            storage_id: f.main,
            parent_id: None,
            name,
            mime_type_id: f.mime,
            size,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let f = setup().await;
        let repo = FileRepository::new(f.db.pool());

        let file = repo.create(&record(&f, "a.txt", 10), 100).await.unwrap();
        assert_eq!(file.name, "a.txt");
        assert_eq!(file.size, 10);
        assert_eq!(file.content_type, "text/plain");
        assert_eq!(file.parent_id, None);
        assert!(file.modified_at_datetime().is_some());

        assert_eq!(repo.get_by_id(file.id).await.unwrap().unwrap(), file);
        assert_eq!(
            repo.get_by_name(f.main, None, "a.txt").await.unwrap().unwrap().id,
            file.id
        );
    }

    #[tokio::test]
    async fn test_create_respects_quota() {
        let f = setup().await;
        let repo = FileRepository::new(f.db.pool());

        repo.create(&record(&f, "a.txt", 60), 100).await.unwrap();
        repo.create(&record(&f, "b.txt", 40), 100).await.unwrap();

        let result = repo.create(&record(&f, "c.txt", 1), 100).await;
        match result {
            Err(NimbusError::QuotaExceeded { needed, available }) => {
                assert_eq!(needed, 1);
                assert_eq!(available, 0);
            }
            other => panic!("expected quota error, got {other:?}"),
        }
        assert_eq!(repo.count_by_storage(f.main).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_root_name_is_conflict() {
        let f = setup().await;
        let repo = FileRepository::new(f.db.pool());

        repo.create(&record(&f, "a.txt", 1), 100).await.unwrap();
        let result = repo.create(&record(&f, "a.txt", 1), 100).await;
        assert!(matches!(result, Err(NimbusError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_size_within_and_over_quota() {
        let f = setup().await;
        let repo = FileRepository::new(f.db.pool());

        let a = repo.create(&record(&f, "a.txt", 50), 100).await.unwrap();
        repo.create(&record(&f, "b.txt", 30), 100).await.unwrap();

        let grown = repo
            .update(a.id, &FileMetaUpdate::new().size(70), 100)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(grown.size, 70);

        let result = repo.update(a.id, &FileMetaUpdate::new().size(71), 100).await;
        assert!(matches!(
            result,
            Err(NimbusError::QuotaExceeded { needed: 71, available: 70 })
        ));

        // Shrinking is fine even when the quota has since dropped
        let shrunk = repo
            .update(a.id, &FileMetaUpdate::new().size(5), 10)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(shrunk.size, 5);

        assert!(repo
            .update(Uuid::new_v4(), &FileMetaUpdate::new().size(1), 100)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_name_and_parent() {
        let f = setup().await;
        let repo = FileRepository::new(f.db.pool());
        let dir = DirectoryRepository::new(f.db.pool())
            .create(&NewDirMeta::new(f.main, "docs"))
            .await
            .unwrap();

        let a = repo.create(&record(&f, "a.txt", 1), 100).await.unwrap();
        let updated = repo
            .update(
                a.id,
                &FileMetaUpdate::new().name("b.txt").parent_id(Some(dir.id)),
                100,
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "b.txt");
        assert_eq!(updated.parent_id, Some(dir.id));

        assert_eq!(repo.list_by_parent(f.main, Some(dir.id)).await.unwrap().len(), 1);
        assert!(repo.list_by_parent(f.main, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_and_count() {
        let f = setup().await;
        let repo = FileRepository::new(f.db.pool());

        for name in ["one.txt", "two.txt", "three.txt"] {
            repo.create(&record(&f, name, 1), 100).await.unwrap();
        }

        let page: Vec<String> = repo
            .list(2, 1)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(page, vec!["two.txt", "three.txt"]);
        assert_eq!(repo.count().await.unwrap(), 3);
        assert_eq!(repo.list_by_storage(f.trash, 10, 0).await.unwrap().len(), 0);
        assert_eq!(repo.list_by_storage(f.main, 10, 0).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_move_to_storage() {
        let f = setup().await;
        let repo = FileRepository::new(f.db.pool());

        let a = repo.create(&record(&f, "a.txt", 40), 100).await.unwrap();
        let b = repo.create(&record(&f, "b.txt", 40), 100).await.unwrap();

        let moved = repo.move_to_storage(a.id, f.trash, 50).await.unwrap().unwrap();
        assert_eq!(moved.storage_id, f.trash);
        assert_eq!(moved.parent_id, None);

        let result = repo.move_to_storage(b.id, f.trash, 50).await;
        assert!(matches!(
            result,
            Err(NimbusError::QuotaExceeded { needed: 40, available: 10 })
        ));
        assert!(repo
            .move_to_storage(Uuid::new_v4(), f.trash, 50)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_rename_and_delete() {
        let f = setup().await;
        let repo = FileRepository::new(f.db.pool());

        let a = repo.create(&record(&f, "a.txt", 1), 100).await.unwrap();
        let renamed = repo.rename(a.id, "z.txt").await.unwrap().unwrap();
        assert_eq!(renamed.name, "z.txt");
        assert!(repo.name_exists(f.main, None, "z.txt", None).await.unwrap());
        assert!(!repo
            .name_exists(f.main, None, "z.txt", Some(a.id))
            .await
            .unwrap());

        assert!(repo.delete(a.id).await.unwrap());
        assert!(!repo.delete(a.id).await.unwrap());
        assert!(repo.get_by_id(a.id).await.unwrap().is_none());
    }
}
