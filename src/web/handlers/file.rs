//! File metadata handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::meta::{FileRepository, MetaService};
use crate::web::dto::{
    ApiResponse, CreateFileRequest, FileListQuery, FileResponse, PaginatedResponse,
    PaginationQuery, ReplaceFileRequest, UpdateFileRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// GET /api/files - List files.
#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    params(PaginationQuery, FileListQuery),
    responses(
        (status = 200, description = "Page of files", body = Vec<FileResponse>)
    )
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationQuery>,
    Query(filter): Query<FileListQuery>,
) -> Result<Json<PaginatedResponse<FileResponse>>, ApiError> {
    let pagination = pagination.clamped(state.max_per_page);
    let (offset, limit) = pagination.to_offset_limit();
    let repo = FileRepository::new(state.db.pool());

    let (files, total) = match filter.storage {
        Some(storage_id) => (
            repo.list_by_storage(storage_id, limit, offset).await?,
            repo.count_by_storage(storage_id).await?,
        ),
        None => (repo.list(limit, offset).await?, repo.count().await?),
    };

    Ok(Json(PaginatedResponse::new(
        files.into_iter().map(FileResponse::from).collect(),
        pagination.page,
        pagination.per_page,
        total as u64,
    )))
}

/// POST /api/files - Create a file.
#[utoipa::path(
    post,
    path = "/api/files",
    tag = "files",
    request_body = CreateFileRequest,
    responses(
        (status = 201, description = "File created", body = FileResponse),
        (status = 404, description = "Storage or parent directory not found"),
        (status = 409, description = "Name already taken"),
        (status = 413, description = "Quota exceeded"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn create_file(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateFileRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FileResponse>>), ApiError> {
    let file = MetaService::new(state.db.pool())
        .create_file(req.storage, req.parent, &req.to_new_file())
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(file.into()))))
}

/// GET /api/files/:id - Get a file.
#[utoipa::path(
    get,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File details", body = FileResponse),
        (status = 404, description = "File not found")
    )
)]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let file = MetaService::new(state.db.pool()).get_file(id).await?;
    Ok(Json(ApiResponse::new(file.into())))
}

/// PUT /api/files/:id - Replace a file's name, parent and size.
#[utoipa::path(
    put,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    request_body = ReplaceFileRequest,
    responses(
        (status = 200, description = "File updated", body = FileResponse),
        (status = 404, description = "File or parent directory not found"),
        (status = 409, description = "Name already taken"),
        (status = 413, description = "Quota exceeded"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn replace_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<ReplaceFileRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let file = MetaService::new(state.db.pool())
        .update_file(id, &req.to_update())
        .await?;
    Ok(Json(ApiResponse::new(file.into())))
}

/// PATCH /api/files/:id - Update some of a file's fields.
#[utoipa::path(
    patch,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    request_body = UpdateFileRequest,
    responses(
        (status = 200, description = "File updated", body = FileResponse),
        (status = 404, description = "File or parent directory not found"),
        (status = 409, description = "Name already taken"),
        (status = 413, description = "Quota exceeded"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn update_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateFileRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let file = MetaService::new(state.db.pool())
        .update_file(id, &req.to_update())
        .await?;
    Ok(Json(ApiResponse::new(file.into())))
}

/// DELETE /api/files/:id - Delete a file.
#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 204, description = "File deleted"),
        (status = 404, description = "File not found")
    )
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    MetaService::new(state.db.pool()).delete_file(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/files/:id/trash - Move a file to its owner's trash.
#[utoipa::path(
    post,
    path = "/api/files/{id}/trash",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File moved to trash", body = FileResponse),
        (status = 404, description = "File not found"),
        (status = 409, description = "Trash already holds a file with that name"),
        (status = 413, description = "Trash quota exceeded"),
        (status = 422, description = "File is already in the trash")
    )
)]
pub async fn trash_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let file = MetaService::new(state.db.pool()).trash_file(id).await?;
    Ok(Json(ApiResponse::new(file.into())))
}
