use axum::{extract::State, response::Json, routing::post, Router};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{auth::TokenResponse, errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// The user to mint a token for
    pub user_id: Uuid,
}

/// Mint a bearer token for a user id. Development convenience only; the
/// route is not registered when the environment is `production`.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = crate::ApiResponse<crate::auth::TokenResponse>),
        (status = 400, description = "Bad request", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub(crate) async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ServiceError> {
    let token = state
        .auth
        .generate_token(request.user_id)
        .map_err(|e| ServiceError::InternalError(e.to_string()))?;

    info!(user_id = %request.user_id, "Issued development token");

    Ok(Json(ApiResponse::success(token)))
}

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}
