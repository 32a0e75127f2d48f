//! Subscription plans ("services") and their repository.

use std::fmt;

use sqlx::{QueryBuilder, SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::{NimbusError, Result};

/// Maximum length of a service name, in characters.
pub const MAX_SERVICE_NAME_LENGTH: usize = 100;

/// Plan capacity in bytes.
///
/// Only the listed sizes are valid plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub enum Capacity {
    /// 512 MB.
    #[default]
    Mb512,
    /// 1 GB.
    Gb1,
}

impl Capacity {
    /// All capacities a plan may offer, smallest first.
    pub const ALL: [Capacity; 2] = [Capacity::Mb512, Capacity::Gb1];

    /// Byte count of this capacity.
    pub fn bytes(&self) -> i64 {
        match self {
            Capacity::Mb512 => 536_870_912,
            Capacity::Gb1 => 1_073_741_824,
        }
    }

    /// Human-readable size.
    pub fn label(&self) -> &'static str {
        match self {
            Capacity::Mb512 => "512 MB",
            Capacity::Gb1 => "1 GB",
        }
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<i64> for Capacity {
    type Error = NimbusError;

    fn try_from(bytes: i64) -> Result<Self> {
        Capacity::ALL
            .into_iter()
            .find(|c| c.bytes() == bytes)
            .ok_or_else(|| NimbusError::Validation(format!("unsupported capacity: {bytes} bytes")))
    }
}

impl From<Capacity> for i64 {
    fn from(c: Capacity) -> Self {
        c.bytes()
    }
}

/// A subscription plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    /// Unique service ID.
    pub id: i64,
    /// Plan name.
    pub name: String,
    /// Price in cents.
    pub price_cents: i64,
    /// Storage capacity granted by the plan.
    pub capacity: Capacity,
    /// When the service was created.
    pub created_at: String,
}

impl Service {
    /// Price formatted with two decimal places.
    pub fn price(&self) -> String {
        format!("{}.{:02}", self.price_cents / 100, self.price_cents % 100)
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.capacity)
    }
}

/// Data for creating a new service.
#[derive(Debug, Clone)]
pub struct NewService {
    pub name: String,
    pub price_cents: i64,
    pub capacity: Capacity,
}

impl NewService {
    /// Create a free plan with the default capacity.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price_cents: 0,
            capacity: Capacity::default(),
        }
    }

    /// Set the price in cents.
    pub fn with_price_cents(mut self, price_cents: i64) -> Self {
        self.price_cents = price_cents;
        self
    }

    /// Set the capacity.
    pub fn with_capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = capacity;
        self
    }
}

/// Data for updating an existing service.
#[derive(Debug, Clone, Default)]
pub struct ServiceUpdate {
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    pub capacity: Option<Capacity>,
}

impl ServiceUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set new name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set new price in cents.
    pub fn price_cents(mut self, price_cents: i64) -> Self {
        self.price_cents = Some(price_cents);
        self
    }

    /// Set new capacity.
    pub fn capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Check if the update is empty.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price_cents.is_none() && self.capacity.is_none()
    }
}

fn validate_service_fields(name: Option<&str>, price_cents: Option<i64>) -> Result<()> {
    if let Some(name) = name {
        if name.trim().is_empty() {
            return Err(NimbusError::Validation(
                "service name cannot be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_SERVICE_NAME_LENGTH {
            return Err(NimbusError::Validation(format!(
                "service name must be at most {MAX_SERVICE_NAME_LENGTH} characters"
            )));
        }
    }
    if let Some(price) = price_cents {
        if price < 0 {
            return Err(NimbusError::Validation(
                "service price cannot be negative".to_string(),
            ));
        }
    }
    Ok(())
}

/// Repository for service CRUD operations.
pub struct ServiceRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ServiceRepository<'a> {
    /// Create a new ServiceRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new service.
    pub async fn create(&self, service: &NewService) -> Result<Service> {
        validate_service_fields(Some(&service.name), Some(service.price_cents))?;

        let result =
            sqlx::query("INSERT INTO services (name, price_cents, capacity) VALUES (?, ?, ?)")
                .bind(&service.name)
                .bind(service.price_cents)
                .bind(service.capacity.bytes())
                .execute(self.pool)
                .await?;

        let id = result.last_insert_rowid();
        debug!(service_id = id, name = %service.name, "Created service");
        self.get_by_id(id)
            .await?
            .ok_or_else(|| NimbusError::NotFound("service".to_string()))
    }

    /// Get a service by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Service>> {
        let row = sqlx::query_as::<_, ServiceRow>(
            "SELECT id, name, price_cents, capacity, created_at FROM services WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(ServiceRow::try_into_service).transpose()
    }

    /// List all services ordered by ID.
    pub async fn list(&self) -> Result<Vec<Service>> {
        let rows = sqlx::query_as::<_, ServiceRow>(
            "SELECT id, name, price_cents, capacity, created_at FROM services ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ServiceRow::try_into_service).collect()
    }

    /// The plan assigned to new profiles: the service with the lowest ID.
    pub async fn default_service(&self) -> Result<Service> {
        Self::fetch_default(self.pool).await
    }

    /// Look up the default plan through any executor.
    pub(crate) async fn fetch_default<'e>(executor: impl SqliteExecutor<'e>) -> Result<Service> {
        let row = sqlx::query_as::<_, ServiceRow>(
            "SELECT id, name, price_cents, capacity, created_at FROM services ORDER BY id LIMIT 1",
        )
        .fetch_optional(executor)
        .await?;

        row.map(ServiceRow::try_into_service)
            .transpose()?
            .ok_or_else(|| NimbusError::NotFound("default service".to_string()))
    }

    /// Update a service.
    ///
    /// Returns the updated service, or None if not found.
    pub async fn update(&self, id: i64, update: &ServiceUpdate) -> Result<Option<Service>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }
        validate_service_fields(update.name.as_deref(), update.price_cents)?;

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE services SET ");
        let mut separated = query.separated(", ");

        if let Some(ref name) = update.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name);
        }
        if let Some(price_cents) = update.price_cents {
            separated.push("price_cents = ");
            separated.push_bind_unseparated(price_cents);
        }
        if let Some(capacity) = update.capacity {
            separated.push("capacity = ");
            separated.push_bind_unseparated(capacity.bytes());
        }

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query.build().execute(self.pool).await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Delete a service.
    ///
    /// Fails with a conflict while any profile is subscribed to it.
    /// Returns true if a service was deleted, false if not found.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let subscribers: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE service_id = ?")
                .bind(id)
                .fetch_one(self.pool)
                .await?;
        if subscribers > 0 {
            return Err(NimbusError::Conflict(format!(
                "service is used by {subscribers} profile(s)"
            )));
        }

        let result = sqlx::query("DELETE FROM services WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Internal struct for mapping database rows to Service.
#[derive(sqlx::FromRow)]
struct ServiceRow {
    id: i64,
    name: String,
    price_cents: i64,
    capacity: i64,
    created_at: String,
}

impl ServiceRow {
    fn try_into_service(self) -> Result<Service> {
        Ok(Service {
            id: self.id,
            name: self.name,
            price_cents: self.price_cents,
            capacity: Capacity::try_from(self.capacity)
                .map_err(|e| NimbusError::Database(format!("service {}: {e}", self.id)))?,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[test]
    fn test_capacity_bytes_and_display() {
        assert_eq!(Capacity::Mb512.bytes(), 536_870_912);
        assert_eq!(Capacity::Gb1.bytes(), 1_073_741_824);
        assert_eq!(Capacity::default(), Capacity::Mb512);
        assert_eq!(Capacity::Mb512.to_string(), "512 MB");
        assert_eq!(Capacity::Gb1.to_string(), "1 GB");
    }

    #[test]
    fn test_capacity_try_from() {
        assert_eq!(Capacity::try_from(1_073_741_824).unwrap(), Capacity::Gb1);
        assert!(Capacity::try_from(1_000_000).is_err());
    }

    #[test]
    fn test_service_display_and_price() {
        let service = Service {
            id: 1,
            name: "Pro".to_string(),
            price_cents: 1205,
            capacity: Capacity::Gb1,
            created_at: String::new(),
        };
        assert_eq!(service.to_string(), "Pro (1 GB)");
        assert_eq!(service.price(), "12.05");
    }

    #[tokio::test]
    async fn test_seeded_default_service() {
        let db = setup_db().await;
        let repo = ServiceRepository::new(db.pool());

        let service = repo.default_service().await.unwrap();
        assert_eq!(service.id, 1);
        assert_eq!(service.name, "Basic");
        assert_eq!(service.price_cents, 0);
        assert_eq!(service.capacity, Capacity::Mb512);
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let db = setup_db().await;
        let repo = ServiceRepository::new(db.pool());

        let pro = repo
            .create(
                &NewService::new("Pro")
                    .with_price_cents(999)
                    .with_capacity(Capacity::Gb1),
            )
            .await
            .unwrap();
        assert_eq!(pro.name, "Pro");
        assert_eq!(pro.price_cents, 999);
        assert_eq!(pro.capacity, Capacity::Gb1);

        let services = repo.list().await.unwrap();
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].name, "Basic");
        assert_eq!(services[1].id, pro.id);

        // The default is still the lowest id
        assert_eq!(repo.default_service().await.unwrap().name, "Basic");
    }

    #[tokio::test]
    async fn test_create_invalid() {
        let db = setup_db().await;
        let repo = ServiceRepository::new(db.pool());

        let long_name = "x".repeat(MAX_SERVICE_NAME_LENGTH + 1);
        assert!(matches!(
            repo.create(&NewService::new(long_name)).await,
            Err(NimbusError::Validation(_))
        ));
        assert!(matches!(
            repo.create(&NewService::new("  ")).await,
            Err(NimbusError::Validation(_))
        ));
        assert!(matches!(
            repo.create(&NewService::new("Cheap").with_price_cents(-1))
                .await,
            Err(NimbusError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update() {
        let db = setup_db().await;
        let repo = ServiceRepository::new(db.pool());

        let updated = repo
            .update(1, &ServiceUpdate::new().name("Starter").capacity(Capacity::Gb1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Starter");
        assert_eq!(updated.capacity, Capacity::Gb1);
        assert_eq!(updated.price_cents, 0);

        let unchanged = repo.update(1, &ServiceUpdate::new()).await.unwrap().unwrap();
        assert_eq!(unchanged.name, "Starter");

        assert!(repo
            .update(999, &ServiceUpdate::new().name("Ghost"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_unused_service() {
        let db = setup_db().await;
        let repo = ServiceRepository::new(db.pool());

        let extra = repo.create(&NewService::new("Extra")).await.unwrap();
        assert!(repo.delete(extra.id).await.unwrap());
        assert!(repo.get_by_id(extra.id).await.unwrap().is_none());
        assert!(!repo.delete(extra.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_service_in_use() {
        let db = setup_db().await;
        sqlx::query("INSERT INTO users (username) VALUES ('alice')")
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query("INSERT INTO profiles (user_id, service_id) VALUES (1, 1)")
            .execute(db.pool())
            .await
            .unwrap();

        let repo = ServiceRepository::new(db.pool());
        assert!(matches!(repo.delete(1).await, Err(NimbusError::Conflict(_))));
    }
}
