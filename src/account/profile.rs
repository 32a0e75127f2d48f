//! Per-user profiles linking a user to a plan and a language.

use sqlx::{QueryBuilder, SqliteExecutor, SqlitePool};
use tracing::debug;

use super::validation::validate_language;
use crate::config::LocaleConfig;
use crate::{NimbusError, Result};

/// A user's profile.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Profile {
    /// Unique profile ID.
    pub id: i64,
    /// The user this profile belongs to (one-to-one).
    pub user_id: i64,
    /// Subscribed service.
    pub service_id: i64,
    /// Two-letter language code.
    pub language: String,
    /// When the profile was created.
    pub created_at: String,
}

/// Data for creating a new profile.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub user_id: i64,
    pub service_id: i64,
    pub language: String,
}

impl NewProfile {
    /// Create a profile on the given service with the given language.
    pub fn new(user_id: i64, service_id: i64, language: impl Into<String>) -> Self {
        Self {
            user_id,
            service_id,
            language: language.into(),
        }
    }

    /// Check the language against the configured list.
    pub fn validate(&self, locale: &LocaleConfig) -> Result<()> {
        validate_language(&self.language, locale)?;
        Ok(())
    }
}

/// Data for updating a profile.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub service_id: Option<i64>,
    pub language: Option<String>,
}

impl ProfileUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to another service.
    pub fn service_id(mut self, service_id: i64) -> Self {
        self.service_id = Some(service_id);
        self
    }

    /// Set new language.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Check if the update is empty.
    pub fn is_empty(&self) -> bool {
        self.service_id.is_none() && self.language.is_none()
    }

    /// Check the new language, if any, against the configured list.
    pub fn validate(&self, locale: &LocaleConfig) -> Result<()> {
        if let Some(ref language) = self.language {
            validate_language(language, locale)?;
        }
        Ok(())
    }
}

/// Repository for profile CRUD operations.
pub struct ProfileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new ProfileRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a profile.
    ///
    /// A second profile for the same user is a conflict.
    pub async fn create(&self, profile: &NewProfile) -> Result<Profile> {
        self.ensure_service_exists(profile.service_id).await?;

        let id = Self::insert(self.pool, profile).await?;
        debug!(profile_id = id, user_id = profile.user_id, "Created profile");
        self.get_by_id(id)
            .await?
            .ok_or_else(|| NimbusError::NotFound("profile".to_string()))
    }

    /// Insert a profile row and return its ID.
    pub(crate) async fn insert<'e>(
        executor: impl SqliteExecutor<'e>,
        profile: &NewProfile,
    ) -> Result<i64> {
        let result =
            sqlx::query("INSERT INTO profiles (user_id, service_id, language) VALUES (?, ?, ?)")
                .bind(profile.user_id)
                .bind(profile.service_id)
                .bind(&profile.language)
                .execute(executor)
                .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a profile by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, user_id, service_id, language, created_at FROM profiles WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(profile)
    }

    /// Get the profile of a user.
    pub async fn get_by_user(&self, user_id: i64) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, user_id, service_id, language, created_at FROM profiles WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(profile)
    }

    /// Update a profile.
    ///
    /// Returns the updated profile, or None if not found.
    pub async fn update(&self, id: i64, update: &ProfileUpdate) -> Result<Option<Profile>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }
        if let Some(service_id) = update.service_id {
            self.ensure_service_exists(service_id).await?;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE profiles SET ");
        let mut separated = query.separated(", ");

        if let Some(service_id) = update.service_id {
            separated.push("service_id = ");
            separated.push_bind_unseparated(service_id);
        }
        if let Some(ref language) = update.language {
            separated.push("language = ");
            separated.push_bind_unseparated(language);
        }

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query.build().execute(self.pool).await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    async fn ensure_service_exists(&self, service_id: i64) -> Result<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM services WHERE id = ?)")
            .bind(service_id)
            .fetch_one(self.pool)
            .await?;
        if exists {
            Ok(())
        } else {
            Err(NimbusError::NotFound("service".to_string()))
        }
    }
}
