//! Extension to MIME type lookup table.

use sqlx::SqlitePool;
use tracing::debug;

use crate::{NimbusError, Result};

/// MIME name used when nothing better is known.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Maximum length of a MIME name.
pub const MAX_MIME_NAME_LENGTH: usize = 100;

/// A mapping from a file extension to a MIME name.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct MimeContentType {
    pub id: i64,
    /// MIME name, e.g. `image/png`.
    pub name: String,
    /// Lower-case extension without the dot; empty for "no extension".
    pub extension: String,
}

/// Pick the MIME name for an extension that has no mapping yet.
///
/// The caller-supplied content type wins, then a guess from the extension,
/// then [`DEFAULT_MIME_TYPE`].
pub fn resolve_mime_name(extension: &str, supplied: Option<&str>) -> String {
    if let Some(supplied) = supplied.map(str::trim).filter(|s| !s.is_empty()) {
        return supplied.to_lowercase();
    }
    if extension.is_empty() {
        return DEFAULT_MIME_TYPE.to_string();
    }
    mime_guess::from_ext(extension)
        .first_raw()
        .unwrap_or(DEFAULT_MIME_TYPE)
        .to_string()
}

/// Repository for the MIME lookup table.
pub struct MimeRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MimeRepository<'a> {
    /// Create a new MimeRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Look up the mapping for an extension (case-insensitive).
    pub async fn get_by_extension(&self, extension: &str) -> Result<Option<MimeContentType>> {
        let mime = sqlx::query_as::<_, MimeContentType>(
            "SELECT id, name, extension FROM mime_content_types WHERE extension = ?",
        )
        .bind(extension.to_lowercase())
        .fetch_optional(self.pool)
        .await?;

        Ok(mime)
    }

    /// Get the mapping for an extension, creating it on demand.
    ///
    /// An existing mapping is returned unchanged; `supplied` only names a
    /// mapping that does not exist yet.
    pub async fn get_or_create(
        &self,
        extension: &str,
        supplied: Option<&str>,
    ) -> Result<MimeContentType> {
        let extension = extension.to_lowercase();
        if let Some(existing) = self.get_by_extension(&extension).await? {
            return Ok(existing);
        }

        let name = resolve_mime_name(&extension, supplied);
        if name.chars().count() > MAX_MIME_NAME_LENGTH {
            return Err(NimbusError::Validation(format!(
                "content type must be at most {MAX_MIME_NAME_LENGTH} characters"
            )));
        }

        // A concurrent insert of the same extension leaves its row in place
        let result = sqlx::query(
            "INSERT INTO mime_content_types (name, extension) VALUES (?, ?)
             ON CONFLICT(extension) DO NOTHING",
        )
        .bind(&name)
        .bind(&extension)
        .execute(self.pool)
        .await?;
        if result.rows_affected() > 0 {
            debug!(extension = %extension, mime = %name, "Registered MIME type");
        }

        self.get_by_extension(&extension)
            .await?
            .ok_or_else(|| NimbusError::NotFound("mime content type".to_string()))
    }

    /// List all mappings ordered by extension.
    pub async fn list(&self) -> Result<Vec<MimeContentType>> {
        let mimes = sqlx::query_as::<_, MimeContentType>(
            "SELECT id, name, extension FROM mime_content_types ORDER BY extension",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(mimes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[test]
    fn test_resolve_mime_name() {
        assert_eq!(resolve_mime_name("png", None), "image/png");
        assert_eq!(resolve_mime_name("png", Some("Image/X-Custom")), "image/x-custom");
        assert_eq!(resolve_mime_name("png", Some("  ")), "image/png");
        assert_eq!(resolve_mime_name("", None), DEFAULT_MIME_TYPE);
        assert_eq!(resolve_mime_name("zzzunknown", None), DEFAULT_MIME_TYPE);
    }

    #[tokio::test]
    async fn test_get_or_create_creates_once() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = MimeRepository::new(db.pool());

        assert!(repo.get_by_extension("jpg").await.unwrap().is_none());

        let first = repo.get_or_create("JPG", None).await.unwrap();
        assert_eq!(first.extension, "jpg");
        assert_eq!(first.name, "image/jpeg");

        // Existing mapping wins over the supplied name
        let second = repo.get_or_create("jpg", Some("image/other")).await.unwrap();
        assert_eq!(second, first);

        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_or_create_uses_supplied_name() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = MimeRepository::new(db.pool());

        let mime = repo
            .get_or_create("", Some("text/x-makefile"))
            .await
            .unwrap();
        assert_eq!(mime.extension, "");
        assert_eq!(mime.name, "text/x-makefile");

        let found = repo.get_by_extension("").await.unwrap().unwrap();
        assert_eq!(found.id, mime.id);
    }

    #[tokio::test]
    async fn test_get_or_create_rejects_long_name() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = MimeRepository::new(db.pool());

        let long = format!("application/{}", "x".repeat(MAX_MIME_NAME_LENGTH));
        let result = repo.get_or_create("bin2", Some(&long)).await;
        assert!(matches!(result, Err(NimbusError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_ordered_by_extension() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = MimeRepository::new(db.pool());

        repo.get_or_create("txt", None).await.unwrap();
        repo.get_or_create("pdf", None).await.unwrap();
        repo.get_or_create("csv", None).await.unwrap();

        let exts: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.extension)
            .collect();
        assert_eq!(exts, vec!["csv", "pdf", "txt"]);
    }
}
