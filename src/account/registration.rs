//! User registration.
//!
//! Registering a user also provisions everything the user needs: a profile on
//! the default service and one storage of each type. All rows are written in
//! a single transaction, so a failed registration leaves nothing behind.

use sqlx::SqlitePool;
use tracing::info;

use super::profile::{NewProfile, Profile, ProfileRepository};
use super::service::ServiceRepository;
use super::user::{NewUser, User, UserRepository};
use super::validation::validate_language;
use crate::config::LocaleConfig;
use crate::storage::{Storage, StorageRepository, StorageType};
use crate::{NimbusError, Result};

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Desired username.
    pub username: String,
    /// Optional email address.
    pub email: Option<String>,
    /// Language preference; the configured default when absent.
    pub language: Option<String>,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
            language: None,
        }
    }

    /// Set the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the language preference.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Everything created by a successful registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    pub profile: Profile,
    /// Main, trash and thumb storages, in that order.
    pub storages: Vec<Storage>,
}

impl Registration {
    /// The storage of the given type.
    pub fn storage(&self, storage_type: StorageType) -> Option<&Storage> {
        self.storages.iter().find(|s| s.storage_type == storage_type)
    }
}

/// Register a new user.
///
/// This function:
/// 1. Validates the username, email and language
/// 2. Checks if the username already exists
/// 3. Creates the user, its profile and its storages in one transaction
pub async fn register(
    pool: &SqlitePool,
    request: &RegistrationRequest,
    locale: &LocaleConfig,
) -> Result<Registration> {
    let mut new_user = NewUser::new(&request.username);
    if let Some(ref email) = request.email {
        new_user = new_user.with_email(email);
    }
    new_user.validate()?;

    let language = request
        .language
        .clone()
        .unwrap_or_else(|| locale.default_language.clone());
    validate_language(&language, locale)?;

    if UserRepository::new(pool)
        .username_exists(&request.username)
        .await?
    {
        return Err(NimbusError::Conflict("username already exists".to_string()));
    }

    let mut tx = pool.begin().await?;

    let user_id = UserRepository::insert(&mut *tx, &new_user).await?;
    let service = ServiceRepository::fetch_default(&mut *tx).await?;
    let profile_id = ProfileRepository::insert(
        &mut *tx,
        &NewProfile::new(user_id, service.id, language.as_str()),
    )
    .await?;
    for storage_type in StorageType::ALL {
        StorageRepository::insert(&mut *tx, profile_id, storage_type).await?;
    }

    tx.commit().await?;

    let user = UserRepository::new(pool)
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| NimbusError::NotFound("user".to_string()))?;
    let profile = ProfileRepository::new(pool)
        .get_by_id(profile_id)
        .await?
        .ok_or_else(|| NimbusError::NotFound("profile".to_string()))?;
    let storages = StorageRepository::new(pool).list_by_owner(profile_id).await?;

    info!(
        username = %user.username,
        user_id = user.id,
        profile_id = profile.id,
        "New user registered"
    );

    Ok(Registration {
        user,
        profile,
        storages,
    })
}
