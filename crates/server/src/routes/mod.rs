pub mod chat;
pub mod files;
pub mod messages;

use crate::ws;
use crate::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    // The framework's default body cap is smaller than the attachment
    // limit; raise it on the upload route, leaving headroom for the
    // multipart framing around the file field.
    let upload_body_limit = state.config.max_upload_bytes as usize + 64 * 1024;

    let api_routes = Router::new()
        // Sending + history
        .route("/chat/send", post(chat::send))
        .route("/chat/history/{userId}", get(chat::history))
        .route("/chat/unread-count", get(chat::unread_count))
        // Mutations
        .route("/chat/message/{messageId}/edit", put(messages::edit_message))
        .route("/chat/message/{messageId}", delete(messages::delete_message))
        .route("/chat/clear/{userId}", delete(messages::clear_conversation))
        // Attachments
        .route(
            "/chat/upload",
            post(files::upload).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route("/chat/files/{messageId}/{filename}", get(files::serve_file));

    Router::new()
        .nest("/api", api_routes)
        .route("/gateway", get(ws::handler::ws_handler))
        .with_state(state)
}
