//! nimbus - cloud storage metadata service
//!
//! Users subscribe to a service plan, each profile owns a main, a trash and a
//! thumbnail storage with a byte quota, and every storage holds a tree of
//! directory and file metadata. A JSON Web API exposes the tree.

pub mod account;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod logging;
pub mod meta;
pub mod storage;
pub mod web;

pub use config::Config;
pub use db::Database;
pub use error::{NimbusError, Result};
