use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Failure taxonomy for the messaging core. Every variant maps to a
/// structured JSON error the request/connection handler can surface.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    #[error("Message not found")]
    NotFound,

    #[error("Not your message")]
    Forbidden,

    #[error("Messages with attachments cannot be edited")]
    AttachmentPresent,

    #[error("Database error")]
    Storage(#[from] sqlx::Error),
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = match &self {
            ChatError::Validation(_) => StatusCode::BAD_REQUEST,
            ChatError::NotFound => StatusCode::NOT_FOUND,
            ChatError::Forbidden => StatusCode::FORBIDDEN,
            ChatError::AttachmentPresent => StatusCode::CONFLICT,
            ChatError::Storage(e) => {
                tracing::error!("storage failure: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}
