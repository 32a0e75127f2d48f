//! Account handlers: service plans and registration.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::account::{register, RegistrationRequest, ServiceRepository};
use crate::web::dto::{
    ApiResponse, RegisterRequest, RegistrationResponse, ServiceResponse, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// GET /api/services - List service plans.
#[utoipa::path(
    get,
    path = "/api/services",
    tag = "account",
    responses(
        (status = 200, description = "Service plans", body = Vec<ServiceResponse>)
    )
)]
pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ServiceResponse>>>, ApiError> {
    let services = ServiceRepository::new(state.db.pool()).list().await?;
    Ok(Json(ApiResponse::new(
        services.into_iter().map(ServiceResponse::from).collect(),
    )))
}

/// POST /api/users - Register a user with a profile and storages.
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "account",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegistrationResponse),
        (status = 409, description = "Username already taken"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RegistrationResponse>>), ApiError> {
    let mut request = RegistrationRequest::new(req.username);
    if let Some(email) = req.email {
        request = request.with_email(email);
    }
    if let Some(language) = req.language {
        request = request.with_language(language);
    }

    let registration = register(state.db.pool(), &request, &state.locale).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(registration.into())),
    ))
}
