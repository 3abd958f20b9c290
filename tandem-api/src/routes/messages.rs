use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::Json;
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

use tandem_shared::errors::AppResult;
use tandem_shared::middleware::{AppJson, AppPath};
use tandem_shared::types::auth::AuthUser;
use tandem_shared::types::ApiResponse;

use crate::live::sse::live_stream;
use crate::models::{Message, MessageView};
use crate::services::message_service;
use crate::AppState;

// --- Request DTOs ---

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

// --- Response DTOs ---

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: Message,
}

#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Serialize)]
pub struct ReadResponse {
    pub updated: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

// --- Handlers ---

/// POST /messages/:match_id
pub async fn send_message(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    AppPath(match_id): AppPath<Uuid>,
    AppJson(req): AppJson<SendMessageRequest>,
) -> AppResult<Json<ApiResponse<MessageResponse>>> {
    let message = message_service::send_message(
        state.store.as_ref(),
        state.feed.as_ref(),
        match_id,
        auth_user.id,
        &req.content,
    )?;
    Ok(Json(ApiResponse::ok(MessageResponse { message })))
}

/// GET /messages/:match_id - full history; opening the thread reads it
pub async fn list_messages(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    AppPath(match_id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<MessageListResponse>>> {
    message_service::mark_read(state.store.as_ref(), state.feed.as_ref(), match_id, auth_user.id)?;
    let messages = message_service::list_messages(state.store.as_ref(), match_id, auth_user.id)?;
    Ok(Json(ApiResponse::ok(MessageListResponse { messages })))
}

/// POST /messages/:match_id/read
pub async fn mark_read(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    AppPath(match_id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<ReadResponse>>> {
    let updated = message_service::mark_read(state.store.as_ref(), state.feed.as_ref(), match_id, auth_user.id)?;
    Ok(Json(ApiResponse::ok(ReadResponse { updated })))
}

/// GET /messages/:match_id/unread
pub async fn unread_count(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    AppPath(match_id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<UnreadCountResponse>>> {
    let unread_count = message_service::unread_count(state.store.as_ref(), match_id, auth_user.id)?;
    Ok(Json(ApiResponse::ok(UnreadCountResponse { unread_count })))
}

/// GET /messages/:match_id/live - SSE stream of inserts and read updates
pub async fn live(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    AppPath(match_id): AppPath<Uuid>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let subscription =
        message_service::subscribe(state.store.as_ref(), state.feed.as_ref(), match_id, auth_user.id)?;
    Ok(live_stream(match_id, subscription))
}
