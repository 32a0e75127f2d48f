//! User identity records.

use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use super::validation::{validate_email, validate_username};
use crate::{NimbusError, Result};

/// A registered user.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Login username (unique, case-insensitive).
    pub username: String,
    /// Email address (optional).
    pub email: Option<String>,
    /// Account creation timestamp.
    pub created_at: String,
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
}

impl NewUser {
    /// Create a new user with only a username.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
        }
    }

    /// Set the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Validate username and email.
    pub fn validate(&self) -> Result<()> {
        validate_username(&self.username)?;
        if let Some(ref email) = self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

/// Repository for user CRUD operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user.
    ///
    /// A username that differs only in case from an existing one is a conflict.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        new_user.validate()?;

        let id = Self::insert(self.pool, new_user).await?;
        debug!(user_id = id, username = %new_user.username, "Created user");
        self.get_by_id(id)
            .await?
            .ok_or_else(|| NimbusError::NotFound("user".to_string()))
    }

    /// Insert a user row and return its ID.
    ///
    /// The caller validates `new_user`; any executor works, so registration
    /// can run this inside its transaction.
    pub(crate) async fn insert<'e>(
        executor: impl SqliteExecutor<'e>,
        new_user: &NewUser,
    ) -> Result<i64> {
        let result = sqlx::query("INSERT INTO users (username, email) VALUES (?, ?)")
            .bind(&new_user.username)
            .bind(new_user.email.as_deref().filter(|e| !e.is_empty()))
            .execute(executor)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by username (case-insensitive).
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, created_at FROM users WHERE username = ? COLLATE NOCASE",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Check if a username is already taken (case-insensitive).
    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? COLLATE NOCASE)",
        )
        .bind(username)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Delete a user by ID.
    ///
    /// The profile, its storages and their trees go with it.
    /// Returns true if a user was deleted, false if not found.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_create_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let user = repo
            .create(&NewUser::new("alice").with_email("alice@example.com"))
            .await
            .unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, Some("alice@example.com".to_string()));
        assert!(!user.created_at.is_empty());
    }

    #[tokio::test]
    async fn test_create_user_empty_email_stored_as_none() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let user = repo.create(&NewUser::new("bob").with_email("")).await.unwrap();
        assert_eq!(user.email, None);
    }

    #[tokio::test]
    async fn test_create_user_invalid() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        assert!(matches!(
            repo.create(&NewUser::new("")).await,
            Err(NimbusError::Validation(_))
        ));
        assert!(matches!(
            repo.create(&NewUser::new("carol").with_email("nope")).await,
            Err(NimbusError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_create_duplicate_username_different_case() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("Alice")).await.unwrap();
        let result = repo.create(&NewUser::new("alice")).await;

        assert!(matches!(result, Err(NimbusError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_get_by_username_case_insensitive() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let created = repo.create(&NewUser::new("Alice")).await.unwrap();

        let found = repo.get_by_username("ALICE").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.username, "Alice");

        assert!(repo.username_exists("alice").await.unwrap());
        assert!(!repo.username_exists("bob").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let user = repo.create(&NewUser::new("dave")).await.unwrap();
        assert!(repo.delete(user.id).await.unwrap());
        assert!(repo.get_by_id(user.id).await.unwrap().is_none());
        assert!(!repo.delete(user.id).await.unwrap());
    }
}
