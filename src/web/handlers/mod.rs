//! API handlers.

pub mod account;
pub mod directory;
pub mod file;
pub mod storage;

pub use account::*;
pub use directory::*;
pub use file::*;
pub use storage::*;

use crate::config::{Config, LocaleConfig};
use crate::Database;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database handle (the pool is internally shared).
    pub db: Database,
    /// Supported languages for registration.
    pub locale: LocaleConfig,
    /// Upper bound for `per_page`.
    pub max_per_page: u32,
}

impl AppState {
    /// Create a new application state.
    pub fn new(db: Database, config: &Config) -> Self {
        Self {
            db,
            locale: config.locale.clone(),
            max_per_page: config.web.max_per_page,
        }
    }
}
