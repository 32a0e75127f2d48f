//! Input validation for accounts.
//!
//! This module provides validation functions for usernames, email addresses
//! and profile languages.

use thiserror::Error;

use crate::config::LocaleConfig;
use crate::NimbusError;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 150;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Username is empty.
    #[error("username cannot be empty")]
    UsernameEmpty,

    /// Username is too long.
    #[error("username must be at most {MAX_USERNAME_LENGTH} characters")]
    UsernameTooLong,

    /// Username contains invalid characters.
    #[error("username can only contain letters, digits and @.+-_")]
    UsernameInvalidChars,

    /// Email is too long.
    #[error("email must be at most {MAX_EMAIL_LENGTH} characters")]
    EmailTooLong,

    /// Email format is invalid.
    #[error("invalid email format")]
    EmailInvalidFormat,

    /// Language is not offered.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
}

impl From<ValidationError> for NimbusError {
    fn from(e: ValidationError) -> Self {
        NimbusError::Validation(e.to_string())
    }
}

/// Validate a username.
///
/// Requirements:
/// - Length: 1-150 characters
/// - Characters: letters, digits and `@ . + - _`
///
/// # Examples
///
/// ```
/// use nimbus::account::validation::validate_username;
///
/// assert!(validate_username("john.doe+cloud@home").is_ok());
/// assert!(validate_username("").is_err());
/// assert!(validate_username("john doe").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::UsernameEmpty);
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(ValidationError::UsernameInvalidChars);
    }
    Ok(())
}

/// Validate an email address (optional field).
///
/// If empty, returns Ok. If provided, performs a basic format check.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Ok(());
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::EmailInvalidFormat);
    };

    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    // Domain needs a dot with text on both sides
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(ValidationError::EmailInvalidFormat),
    }
}

/// Validate a profile language against the configured list.
pub fn validate_language(language: &str, locale: &LocaleConfig) -> Result<(), ValidationError> {
    if locale.is_supported(language) {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedLanguage(language.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username_valid() {
        assert!(validate_username("a").is_ok());
        assert!(validate_username("john_doe").is_ok());
        assert!(validate_username("mail@example.com").is_ok());
        assert!(validate_username("ユーザー").is_ok());
        assert!(validate_username(&"x".repeat(MAX_USERNAME_LENGTH)).is_ok());
    }

    #[test]
    fn test_validate_username_invalid() {
        assert_eq!(validate_username(""), Err(ValidationError::UsernameEmpty));
        assert_eq!(
            validate_username(&"x".repeat(MAX_USERNAME_LENGTH + 1)),
            Err(ValidationError::UsernameTooLong)
        );
        assert_eq!(
            validate_username("john doe"),
            Err(ValidationError::UsernameInvalidChars)
        );
        assert_eq!(
            validate_username("a/b"),
            Err(ValidationError::UsernameInvalidChars)
        );
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("").is_ok());
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("a.b@mail.example.org").is_ok());

        assert_eq!(validate_email("invalid"), Err(ValidationError::EmailInvalidFormat));
        assert_eq!(validate_email("@example.com"), Err(ValidationError::EmailInvalidFormat));
        assert_eq!(validate_email("user@localhost"), Err(ValidationError::EmailInvalidFormat));
        assert_eq!(validate_email("user@example."), Err(ValidationError::EmailInvalidFormat));
        assert_eq!(validate_email("a@b@c.com"), Err(ValidationError::EmailInvalidFormat));
        assert_eq!(validate_email("a b@c.com"), Err(ValidationError::EmailInvalidFormat));

        let long = format!("{}@example.com", "a".repeat(MAX_EMAIL_LENGTH));
        assert_eq!(validate_email(&long), Err(ValidationError::EmailTooLong));
    }

    #[test]
    fn test_validate_language() {
        let locale = LocaleConfig {
            default_language: "en".to_string(),
            languages: vec!["en".to_string(), "de".to_string()],
        };
        assert!(validate_language("de", &locale).is_ok());
        assert_eq!(
            validate_language("fr", &locale),
            Err(ValidationError::UnsupportedLanguage("fr".to_string()))
        );
    }

    #[test]
    fn test_into_nimbus_error() {
        let err: NimbusError = ValidationError::UsernameEmpty.into();
        assert!(matches!(err, NimbusError::Validation(msg) if msg.contains("username")));
    }
}
