//! Router configuration for Web API.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::dto::{
    CreateDirectoryRequest, CreateFileRequest, DirectoryListingResponse, DirectoryResponse,
    FileResponse, PaginationMeta, RegisterRequest, RegistrationResponse, ReplaceFileRequest,
    ServiceResponse, StorageResponse, StorageUsageResponse, UpdateDirectoryRequest,
    UpdateFileRequest,
};
use super::handlers::{self, AppState};
use super::middleware::create_cors_layer;

/// OpenAPI document for the Web API.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_files,
        handlers::create_file,
        handlers::get_file,
        handlers::replace_file,
        handlers::update_file,
        handlers::delete_file,
        handlers::trash_file,
        handlers::list_storage_tree,
        handlers::create_directory,
        handlers::get_directory,
        handlers::update_directory,
        handlers::delete_directory,
        handlers::get_storage,
        handlers::list_services,
        handlers::register_user,
    ),
    components(schemas(
        FileResponse,
        DirectoryResponse,
        DirectoryListingResponse,
        StorageResponse,
        StorageUsageResponse,
        ServiceResponse,
        RegistrationResponse,
        PaginationMeta,
        CreateFileRequest,
        ReplaceFileRequest,
        UpdateFileRequest,
        CreateDirectoryRequest,
        UpdateDirectoryRequest,
        RegisterRequest,
    )),
    tags(
        (name = "files", description = "File metadata"),
        (name = "directories", description = "Directory tree"),
        (name = "storages", description = "Storage usage"),
        (name = "account", description = "Service plans and registration"),
    )
)]
pub struct ApiDoc;

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let file_routes = Router::new()
        .route("/", get(handlers::list_files).post(handlers::create_file))
        .route(
            "/:id",
            get(handlers::get_file)
                .put(handlers::replace_file)
                .patch(handlers::update_file)
                .delete(handlers::delete_file),
        )
        .route("/:id/trash", post(handlers::trash_file));

    let storage_routes = Router::new()
        .route("/:id", get(handlers::get_storage))
        .route(
            "/:id/directories",
            get(handlers::list_storage_tree).post(handlers::create_directory),
        );

    let directory_routes = Router::new().route(
        "/:id",
        get(handlers::get_directory)
            .patch(handlers::update_directory)
            .delete(handlers::delete_directory),
    );

    let api_routes = Router::new()
        .nest("/files", file_routes)
        .nest("/storages", storage_routes)
        .nest("/directories", directory_routes)
        .route("/services", get(handlers::list_services))
        .route("/users", post(handlers::register_user));

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Create the Swagger UI router serving the OpenAPI document.
pub fn create_swagger_router() -> Router {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_health_router() {
        let _router = create_health_router();
        // Should not panic
    }

    #[test]
    fn test_openapi_lists_file_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/files"));
        assert!(doc.paths.paths.contains_key("/api/files/{id}"));
        assert!(doc.paths.paths.contains_key("/api/files/{id}/trash"));
    }
}
