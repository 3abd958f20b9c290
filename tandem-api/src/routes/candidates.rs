use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use tandem_shared::errors::AppResult;
use tandem_shared::middleware::AppQuery;
use tandem_shared::types::auth::AuthUser;
use tandem_shared::types::ApiResponse;

use crate::models::PublicProfile;
use crate::services::candidate_service;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CandidateParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CandidatesResponse {
    pub candidates: Vec<PublicProfile>,
}

/// GET /candidates?limit=
pub async fn list_candidates(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<CandidateParams>,
) -> AppResult<Json<ApiResponse<CandidatesResponse>>> {
    let limit = candidate_service::page_size(params.limit, state.config.candidate_page_size);
    let candidates = candidate_service::next_candidates(state.store.as_ref(), auth_user.id, limit)?;
    Ok(Json(ApiResponse::ok(CandidatesResponse { candidates })))
}
