//! Entry names: validation and extension extraction.

use crate::{NimbusError, Result};

/// Maximum length for directory and file names (in characters).
pub const MAX_NAME_LENGTH: usize = 4096;

/// Validate a directory or file name.
///
/// Rejects empty or whitespace-only names, names longer than
/// [`MAX_NAME_LENGTH`] characters, names containing `/` or control
/// characters, and the reserved names `.` and `..`.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(NimbusError::Validation("name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(NimbusError::Validation(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    if name.contains('/') {
        return Err(NimbusError::Validation(
            "name cannot contain '/'".to_string(),
        ));
    }
    if name.chars().any(char::is_control) {
        return Err(NimbusError::Validation(
            "name cannot contain control characters".to_string(),
        ));
    }
    if name == "." || name == ".." {
        return Err(NimbusError::Validation(format!("'{name}' is a reserved name")));
    }
    Ok(())
}

/// Lower-cased extension of a file name, without the dot.
///
/// Names without a dot, dot-files and names ending in a dot have the empty
/// extension.
///
/// # Examples
///
/// ```
/// use nimbus::meta::extension_of;
///
/// assert_eq!(extension_of("PHOTO.JPG"), "jpg");
/// assert_eq!(extension_of("backup.tar.gz"), "gz");
/// assert_eq!(extension_of("Makefile"), "");
/// assert_eq!(extension_of(".bashrc"), "");
/// ```
pub fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_ok() {
        assert!(validate_name("notes.txt").is_ok());
        assert!(validate_name(".hidden").is_ok());
        assert!(validate_name("写真 2024").is_ok());
        assert!(validate_name(&"a".repeat(MAX_NAME_LENGTH)).is_ok());
    }

    #[test]
    fn test_validate_name_rejects() {
        for bad in ["", "   ", "a/b", "tab\there", "nul\0", ".", ".."] {
            assert!(
                matches!(validate_name(bad), Err(NimbusError::Validation(_))),
                "accepted {bad:?}"
            );
        }
        assert!(validate_name(&"a".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_name_counts_characters() {
        // 4096 multi-byte characters are within the limit
        assert!(validate_name(&"é".repeat(MAX_NAME_LENGTH)).is_ok());
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a.jpg"), "jpg");
        assert_eq!(extension_of("PHOTO.JPG"), "jpg");
        assert_eq!(extension_of("archive.tar.GZ"), "gz");
        assert_eq!(extension_of("Makefile"), "");
        assert_eq!(extension_of(".bashrc"), "");
        assert_eq!(extension_of("trailing."), "");
        assert_eq!(extension_of(".config.toml"), "toml");
    }
}
