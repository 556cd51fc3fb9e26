use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::dispatch;
use crate::error::ChatError;
use crate::models::{AuthUser, Message};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub text: String,
}

/// PUT /api/chat/message/{messageId}/edit
pub async fn edit_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<String>,
    Json(req): Json<EditRequest>,
) -> Result<Json<Message>, ChatError> {
    let updated = dispatch::edit_message(
        &state.db,
        state.presence.as_ref(),
        &message_id,
        &user.id,
        &req.text,
    )
    .await?;

    Ok(Json(updated))
}

/// DELETE /api/chat/message/{messageId}
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<String>,
) -> Result<Json<serde_json::Value>, ChatError> {
    dispatch::delete_message(
        &state.db,
        state.presence.as_ref(),
        &state.config.upload_dir,
        &message_id,
        &user.id,
    )
    .await?;

    Ok(Json(serde_json::json!({"success": true})))
}

/// DELETE /api/chat/clear/{userId}
pub async fn clear_conversation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(other_id): Path<String>,
) -> Result<Json<serde_json::Value>, ChatError> {
    let removed =
        dispatch::clear_conversation(&state.db, &state.config.upload_dir, &user.id, &other_id)
            .await?;

    Ok(Json(serde_json::json!({"success": true, "removed": removed})))
}
