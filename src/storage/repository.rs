//! Storage repository.

use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use super::quota::capacity_quota;
use super::types::{Storage, StorageType, StorageUsage};
use crate::account::Capacity;
use crate::{NimbusError, Result};

/// Repository for storages and their aggregate figures.
pub struct StorageRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> StorageRepository<'a> {
    /// Create a new StorageRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a storage of the given type for a profile.
    ///
    /// A profile holding a storage of that type already is a conflict.
    pub async fn create(&self, owner_id: i64, storage_type: StorageType) -> Result<Storage> {
        let id = Self::insert(self.pool, owner_id, storage_type).await?;
        debug!(storage_id = id, owner_id, %storage_type, "Created storage");
        self.get_by_id(id)
            .await?
            .ok_or_else(|| NimbusError::NotFound("storage".to_string()))
    }

    /// Insert a storage row and return its ID.
    pub(crate) async fn insert<'e>(
        executor: impl SqliteExecutor<'e>,
        owner_id: i64,
        storage_type: StorageType,
    ) -> Result<i64> {
        let result = sqlx::query("INSERT INTO storages (owner_id, storage_type) VALUES (?, ?)")
            .bind(owner_id)
            .bind(storage_type.as_i64())
            .execute(executor)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a storage by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Storage>> {
        let row = sqlx::query_as::<_, StorageRow>(
            "SELECT id, storage_type, owner_id, created_at FROM storages WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(StorageRow::try_into_storage).transpose()
    }

    /// List the storages of a profile, ordered by type.
    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Storage>> {
        let rows = sqlx::query_as::<_, StorageRow>(
            "SELECT id, storage_type, owner_id, created_at FROM storages
             WHERE owner_id = ? ORDER BY storage_type",
        )
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(StorageRow::try_into_storage).collect()
    }

    /// Get the storage of a given type for a profile.
    pub async fn get_by_owner_and_type(
        &self,
        owner_id: i64,
        storage_type: StorageType,
    ) -> Result<Option<Storage>> {
        let row = sqlx::query_as::<_, StorageRow>(
            "SELECT id, storage_type, owner_id, created_at FROM storages
             WHERE owner_id = ? AND storage_type = ?",
        )
        .bind(owner_id)
        .bind(storage_type.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(StorageRow::try_into_storage).transpose()
    }

    /// Sum of all file sizes in a storage, 0 when empty.
    pub async fn total_size(&self, storage_id: i64) -> Result<i64> {
        let total: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(size), 0) FROM file_meta WHERE storage_id = ?")
                .bind(storage_id)
                .fetch_one(self.pool)
                .await?;
        Ok(total)
    }

    /// Number of files in a storage.
    pub async fn count_files(&self, storage_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM file_meta WHERE storage_id = ?")
            .bind(storage_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Number of directories in a storage.
    pub async fn count_directories(&self, storage_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dir_meta WHERE storage_id = ?")
            .bind(storage_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Quota of a storage, derived from its owner's service.
    pub async fn capacity_quota(&self, storage_id: i64) -> Result<i64> {
        let row: Option<(i64, i64)> = sqlx::query_as(
            "SELECT s.storage_type, sv.capacity
             FROM storages s
             JOIN profiles p ON p.id = s.owner_id
             JOIN services sv ON sv.id = p.service_id
             WHERE s.id = ?",
        )
        .bind(storage_id)
        .fetch_optional(self.pool)
        .await?;

        let (storage_type, capacity) =
            row.ok_or_else(|| NimbusError::NotFound("storage".to_string()))?;
        Ok(capacity_quota(
            StorageType::try_from(storage_type)?,
            Capacity::try_from(capacity)?,
        ))
    }

    /// Usage summary of a storage.
    pub async fn usage(&self, storage_id: i64) -> Result<StorageUsage> {
        let capacity_quota = self.capacity_quota(storage_id).await?;
        Ok(StorageUsage {
            storage_id,
            capacity_quota,
            total_size: self.total_size(storage_id).await?,
            file_count: self.count_files(storage_id).await?,
            directory_count: self.count_directories(storage_id).await?,
        })
    }
}

/// Internal struct for mapping database rows to Storage.
#[derive(sqlx::FromRow)]
struct StorageRow {
    id: i64,
    storage_type: i64,
    owner_id: i64,
    created_at: String,
}

impl StorageRow {
    fn try_into_storage(self) -> Result<Storage> {
        Ok(Storage {
            id: self.id,
            storage_type: StorageType::try_from(self.storage_type)
                .map_err(|e| NimbusError::Database(format!("storage {}: {e}", self.id)))?,
            owner_id: self.owner_id,
            created_at: self.created_at,
        })
    }
}
