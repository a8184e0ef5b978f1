use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{delete, post},
};
use axum_valid::Valid;

use crate::{
    dto::auth::{LoginRequest, LoginResponse},
    error::AppError,
    services::auth_service,
    state::SharedState,
};

const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Login and logout endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/session", delete(logout))
}

/// Exchange credentials for a session token.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<LoginRequest>>,
) -> Result<Json<LoginResponse>, AppError> {
    Ok(Json(auth_service::login(&state, payload).await?))
}

/// Revoke the session identified by `X-Auth-Token`.
#[utoipa::path(
    delete,
    path = "/auth/session",
    tag = "auth",
    params(("X-Auth-Token" = String, Header, description = "Session token to revoke")),
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "Unknown or missing token")
    )
)]
pub async fn logout(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = headers
        .get(AUTH_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing header `X-Auth-Token`".into()))?;
    auth_service::logout(&state, token).await?;
    Ok(StatusCode::NO_CONTENT)
}
