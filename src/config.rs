//! Configuration module for nimbus.

use serde::Deserialize;
use std::path::Path;

use crate::{NimbusError, Result};

/// Web API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Host address to bind.
    #[serde(default = "default_web_host")]
    pub host: String,
    /// Port number for the Web API.
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Upper bound for the `per_page` query parameter.
    #[serde(default = "default_max_per_page")]
    pub max_per_page: u32,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    8080
}

fn default_max_per_page() -> u32 {
    100
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            cors_origins: vec![],
            max_per_page: default_max_per_page(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/nimbus.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Locale configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LocaleConfig {
    /// Language assigned to new profiles.
    #[serde(default = "default_language")]
    pub default_language: String,
    /// Languages a profile may choose from.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string()]
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            languages: default_languages(),
        }
    }
}

impl LocaleConfig {
    /// Check whether a language code is one of the configured languages.
    pub fn is_supported(&self, code: &str) -> bool {
        self.languages.iter().any(|l| l == code)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/nimbus.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Locale configuration.
    #[serde(default)]
    pub locale: LocaleConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(NimbusError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| NimbusError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `NIMBUS_DATABASE_PATH`: Override the database path
    /// - `NIMBUS_WEB_PORT`: Override the web port (ignored if not a valid port)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("NIMBUS_DATABASE_PATH") {
            if !path.is_empty() {
                self.database.path = path;
            }
        }
        if let Ok(port) = std::env::var("NIMBUS_WEB_PORT") {
            match port.parse::<u16>() {
                Ok(port) => self.web.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid NIMBUS_WEB_PORT"),
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - A language code is not two lower-case ASCII letters
    /// - The default language is not in the supported list
    /// - `max_per_page` is zero
    pub fn validate(&self) -> Result<()> {
        for code in &self.locale.languages {
            if code.len() != 2 || !code.chars().all(|c| c.is_ascii_lowercase()) {
                return Err(NimbusError::Config(format!(
                    "invalid language code '{code}': expected two lower-case letters"
                )));
            }
        }
        if !self.locale.is_supported(&self.locale.default_language) {
            return Err(NimbusError::Config(format!(
                "default language '{}' is not in locale.languages",
                self.locale.default_language
            )));
        }
        if self.web.max_per_page == 0 {
            return Err(NimbusError::Config(
                "web.max_per_page must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.web.host, "0.0.0.0");
        assert_eq!(config.web.port, 8080);
        assert!(config.web.cors_origins.is_empty());
        assert_eq!(config.web.max_per_page, 100);

        assert_eq!(config.database.path, "data/nimbus.db");

        assert_eq!(config.locale.default_language, "en");
        assert_eq!(config.locale.languages, vec!["en".to_string()]);

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/nimbus.log");

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[web]
host = "127.0.0.1"
port = 3000
cors_origins = ["http://localhost:3000", "http://localhost:5173"]
max_per_page = 50

[database]
path = "custom/db.sqlite"

[locale]
default_language = "de"
languages = ["en", "de", "ja"]

[logging]
level = "debug"
file = "custom/logs/app.log"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.web.host, "127.0.0.1");
        assert_eq!(config.web.port, 3000);
        assert_eq!(config.web.cors_origins.len(), 2);
        assert_eq!(config.web.cors_origins[1], "http://localhost:5173");
        assert_eq!(config.web.max_per_page, 50);

        assert_eq!(config.database.path, "custom/db.sqlite");

        assert_eq!(config.locale.default_language, "de");
        assert!(config.locale.is_supported("ja"));
        assert!(!config.locale.is_supported("fr"));

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, "custom/logs/app.log");

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[web]
port = 9000
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.web.port, 9000);
        assert_eq!(config.web.host, "0.0.0.0");
        assert_eq!(config.database.path, "data/nimbus.db");
        assert_eq!(config.locale.default_language, "en");
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.web.port, 8080);
        assert_eq!(config.database.path, "data/nimbus.db");
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("this is not valid toml [[[");

        if let Err(NimbusError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");
        assert!(matches!(result, Err(NimbusError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[database]\npath = \"from-file.db\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.database.path, "from-file.db");
    }

    // Both env overrides live in one test so parallel tests do not race on
    // the process environment.
    #[test]
    fn test_apply_env_overrides() {
        let original_path = std::env::var("NIMBUS_DATABASE_PATH").ok();
        let original_port = std::env::var("NIMBUS_WEB_PORT").ok();

        std::env::set_var("NIMBUS_DATABASE_PATH", "env.db");
        std::env::set_var("NIMBUS_WEB_PORT", "9191");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.database.path, "env.db");
        assert_eq!(config.web.port, 9191);

        std::env::set_var("NIMBUS_DATABASE_PATH", "");
        std::env::set_var("NIMBUS_WEB_PORT", "not-a-port");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.database.path, "data/nimbus.db");
        assert_eq!(config.web.port, 8080);

        match original_path {
            Some(val) => std::env::set_var("NIMBUS_DATABASE_PATH", val),
            None => std::env::remove_var("NIMBUS_DATABASE_PATH"),
        }
        match original_port {
            Some(val) => std::env::set_var("NIMBUS_WEB_PORT", val),
            None => std::env::remove_var("NIMBUS_WEB_PORT"),
        }
    }

    #[test]
    fn test_validate_default_language_unsupported() {
        let mut config = Config::default();
        config.locale.default_language = "ja".to_string();

        let result = config.validate();
        if let Err(NimbusError::Config(msg)) = result {
            assert!(msg.contains("default language"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_validate_bad_language_code() {
        let mut config = Config::default();
        config.locale.languages.push("eng".to_string());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.locale.languages.push("EN".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_page_size() {
        let mut config = Config::default();
        config.web.max_per_page = 0;
        assert!(config.validate().is_err());
    }
}
