use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use tandem_shared::errors::AppResult;
use tandem_shared::middleware::AppPath;
use tandem_shared::types::auth::AuthUser;
use tandem_shared::types::ApiResponse;

use crate::services::match_service::{self, MatchSummary};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MatchListResponse {
    pub matches: Vec<MatchSummary>,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    #[serde(rename = "match")]
    pub record: MatchSummary,
}

/// GET /matches
pub async fn list_matches(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<MatchListResponse>>> {
    let matches = match_service::list_matches(state.store.as_ref(), auth_user.id)?;
    Ok(Json(ApiResponse::ok(MatchListResponse { matches })))
}

/// GET /matches/:match_id
pub async fn get_match(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    AppPath(match_id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<MatchResponse>>> {
    let record = match_service::get_match(state.store.as_ref(), match_id, auth_user.id)?;
    Ok(Json(ApiResponse::ok(MatchResponse { record })))
}
