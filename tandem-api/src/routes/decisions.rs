use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use tandem_shared::errors::AppResult;
use tandem_shared::middleware::AppJson;
use tandem_shared::types::auth::AuthUser;
use tandem_shared::types::ApiResponse;

use crate::models::DecisionAction;
use crate::services::decision_service::{self, DecisionOutcome};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    pub target_user_id: Uuid,
    pub action: DecisionAction,
}

/// POST /decisions - like or skip a candidate
pub async fn record_decision(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<DecisionRequest>,
) -> AppResult<Json<ApiResponse<DecisionOutcome>>> {
    let outcome = decision_service::record_decision(
        state.store.as_ref(),
        auth_user.id,
        req.target_user_id,
        req.action,
    )?;
    Ok(Json(ApiResponse::ok(outcome)))
}
