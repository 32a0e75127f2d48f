//! Directory handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::meta::MetaService;
use crate::web::dto::{
    ApiResponse, CreateDirectoryRequest, DirectoryListingResponse, DirectoryQuery,
    DirectoryResponse, UpdateDirectoryRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// GET /api/storages/:id/directories - List one level of a storage's tree.
#[utoipa::path(
    get,
    path = "/api/storages/{id}/directories",
    tag = "directories",
    params(
        ("id" = i64, Path, description = "Storage ID"),
        DirectoryQuery
    ),
    responses(
        (status = 200, description = "Directory listing", body = DirectoryListingResponse),
        (status = 404, description = "Storage or directory not found")
    )
)]
pub async fn list_storage_tree(
    State(state): State<Arc<AppState>>,
    Path(storage_id): Path<i64>,
    Query(query): Query<DirectoryQuery>,
) -> Result<Json<ApiResponse<DirectoryListingResponse>>, ApiError> {
    let service = MetaService::new(state.db.pool());
    let directory = match query.parent {
        Some(id) => Some(service.get_directory(id).await?),
        None => None,
    };
    let listing = service.list_directory(storage_id, query.parent).await?;

    Ok(Json(ApiResponse::new(DirectoryListingResponse::new(
        directory, listing,
    ))))
}

/// POST /api/storages/:id/directories - Create a directory.
#[utoipa::path(
    post,
    path = "/api/storages/{id}/directories",
    tag = "directories",
    params(
        ("id" = i64, Path, description = "Storage ID")
    ),
    request_body = CreateDirectoryRequest,
    responses(
        (status = 201, description = "Directory created", body = DirectoryResponse),
        (status = 404, description = "Storage or parent directory not found"),
        (status = 409, description = "Name already taken"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn create_directory(
    State(state): State<Arc<AppState>>,
    Path(storage_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<CreateDirectoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DirectoryResponse>>), ApiError> {
    let dir = MetaService::new(state.db.pool())
        .create_directory(storage_id, req.parent, &req.name)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(dir.into()))))
}

/// GET /api/directories/:id - Get a directory with its children.
#[utoipa::path(
    get,
    path = "/api/directories/{id}",
    tag = "directories",
    params(
        ("id" = Uuid, Path, description = "Directory ID")
    ),
    responses(
        (status = 200, description = "Directory listing", body = DirectoryListingResponse),
        (status = 404, description = "Directory not found")
    )
)]
pub async fn get_directory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DirectoryListingResponse>>, ApiError> {
    let service = MetaService::new(state.db.pool());
    let dir = service.get_directory(id).await?;
    let listing = service.list_directory(dir.storage_id, Some(id)).await?;

    Ok(Json(ApiResponse::new(DirectoryListingResponse::new(
        Some(dir),
        listing,
    ))))
}

/// PATCH /api/directories/:id - Rename and/or move a directory.
#[utoipa::path(
    patch,
    path = "/api/directories/{id}",
    tag = "directories",
    params(
        ("id" = Uuid, Path, description = "Directory ID")
    ),
    request_body = UpdateDirectoryRequest,
    responses(
        (status = 200, description = "Directory updated", body = DirectoryResponse),
        (status = 404, description = "Directory not found"),
        (status = 409, description = "Name already taken"),
        (status = 422, description = "Validation failed or cyclic move")
    )
)]
pub async fn update_directory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateDirectoryRequest>,
) -> Result<Json<ApiResponse<DirectoryResponse>>, ApiError> {
    let dir = MetaService::new(state.db.pool())
        .update_directory(id, req.name.as_deref(), req.parent)
        .await?;

    Ok(Json(ApiResponse::new(dir.into())))
}

/// DELETE /api/directories/:id - Delete a directory and its subtree.
#[utoipa::path(
    delete,
    path = "/api/directories/{id}",
    tag = "directories",
    params(
        ("id" = Uuid, Path, description = "Directory ID")
    ),
    responses(
        (status = 204, description = "Directory deleted"),
        (status = 404, description = "Directory not found")
    )
)]
pub async fn delete_directory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    MetaService::new(state.db.pool()).delete_directory(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
