//! Storage handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::storage::StorageRepository;
use crate::web::dto::{ApiResponse, StorageUsageResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// GET /api/storages/:id - Storage usage summary.
#[utoipa::path(
    get,
    path = "/api/storages/{id}",
    tag = "storages",
    params(
        ("id" = i64, Path, description = "Storage ID")
    ),
    responses(
        (status = 200, description = "Storage usage", body = StorageUsageResponse),
        (status = 404, description = "Storage not found")
    )
)]
pub async fn get_storage(
    State(state): State<Arc<AppState>>,
    Path(storage_id): Path<i64>,
) -> Result<Json<ApiResponse<StorageUsageResponse>>, ApiError> {
    let repo = StorageRepository::new(state.db.pool());
    let storage = repo
        .get_by_id(storage_id)
        .await?
        .ok_or_else(|| ApiError::not_found("storage not found"))?;
    let usage = repo.usage(storage_id).await?;

    Ok(Json(ApiResponse::new(StorageUsageResponse::new(
        storage, usage,
    ))))
}
