use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use tandem_shared::errors::AppResult;
use tandem_shared::middleware::AppJson;
use tandem_shared::types::auth::{AccessToken, AuthUser};
use tandem_shared::types::ApiResponse;

use crate::models::User;
use crate::services::{auth_service, token_service};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

impl CredentialsRequest {
    /// Validation sees the address the account is stored under.
    fn normalized(self) -> Self {
        Self {
            email: auth_service::normalize_email(&self.email),
            ..self
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: User,
    #[serde(flatten)]
    pub token: AccessToken,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
}

fn session(state: &AppState, user: User) -> AppResult<SessionResponse> {
    let token = token_service::issue_access_token(user.id, &state.config.jwt_secret, state.config.jwt_access_ttl)?;
    Ok(SessionResponse { user, token })
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CredentialsRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<SessionResponse>>)> {
    let req = req.normalized();
    req.validate()?;

    let user = auth_service::register(state.store.as_ref(), &req.email, &req.password)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(session(&state, user)?))))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CredentialsRequest>,
) -> AppResult<Json<ApiResponse<SessionResponse>>> {
    let req = req.normalized();
    req.validate()?;

    let user = auth_service::authenticate(state.store.as_ref(), &req.email, &req.password)?;
    Ok(Json(ApiResponse::ok(session(&state, user)?)))
}

/// GET /auth/me
pub async fn me(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<MeResponse>>> {
    let user = auth_service::current_user(state.store.as_ref(), auth_user.id)?;
    Ok(Json(ApiResponse::ok(MeResponse { user })))
}
