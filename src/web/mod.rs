//! Web API module for nimbus.
//!
//! A thin JSON CRUD surface over the metadata tree, with an OpenAPI
//! document served by Swagger UI.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::{create_router, ApiDoc};
pub use server::WebServer;
