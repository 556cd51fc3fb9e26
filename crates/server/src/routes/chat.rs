use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::dispatch;
use crate::error::ChatError;
use crate::models::{AuthUser, Message};
use crate::store;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub receiver_id: String,
    pub text: Option<String>,
}

/// POST /api/chat/send
///
/// Plain-request twin of the WebSocket send_message event.
pub async fn send(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<SendRequest>,
) -> Result<Json<Message>, ChatError> {
    let message = dispatch::send_message(
        &state.db,
        state.presence.as_ref(),
        &user.id,
        &req.receiver_id,
        req.text,
        None,
    )
    .await?;

    Ok(Json(message))
}

/// GET /api/chat/history/{userId}
///
/// Fetching history marks everything the other user sent us as read;
/// the observed client has no separate mark-read call.
pub async fn history(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(other_id): Path<String>,
) -> Result<Json<serde_json::Value>, ChatError> {
    let messages = store::list_between(&state.db, &user.id, &other_id).await?;
    store::mark_read(&state.db, &other_id, &user.id).await?;

    Ok(Json(serde_json::json!({ "messages": messages })))
}

/// GET /api/chat/unread-count
pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<serde_json::Value>, ChatError> {
    let counts = store::unread_counts(&state.db, &user.id).await?;

    let unread: serde_json::Map<String, serde_json::Value> = counts
        .into_iter()
        .map(|(sender_id, count)| (sender_id, serde_json::json!(count)))
        .collect();

    Ok(Json(serde_json::json!({ "unread": unread })))
}
