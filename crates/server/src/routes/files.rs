use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::dispatch;
use crate::models::{AuthUser, NewAttachment};
use crate::store;
use crate::AppState;

/// POST /api/chat/upload
///
/// Multipart boundary for attachment messages: `file` plus `receiverId`
/// and optional `text`. Writes the blob first, then creates and
/// dispatches the message in one step; a failed insert removes the blob.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut file: Option<(String, String, axum::body::Bytes)> = None;
    let mut receiver_id: Option<String> = None;
    let mut text: Option<String> = None;

    loop {
        // A body over the route's limit surfaces here as a 413, not as
        // a missing-field 400
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return (e.status(), Json(serde_json::json!({"error": e.body_text()})))
                    .into_response()
            }
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let original_filename = field.file_name().unwrap_or("file").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                match field.bytes().await {
                    Ok(data) => file = Some((original_filename, content_type, data)),
                    Err(e) => {
                        return (e.status(), Json(serde_json::json!({"error": e.body_text()})))
                            .into_response()
                    }
                }
            }
            "receiverId" => receiver_id = field.text().await.ok(),
            "text" => text = field.text().await.ok(),
            _ => {}
        }
    }

    let (original_filename, content_type, data) = match file {
        Some(f) => f,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "No file provided"})),
            )
                .into_response()
        }
    };

    let receiver_id = match receiver_id {
        Some(r) if !r.is_empty() => r,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "Receiver is required"})),
            )
                .into_response()
        }
    };

    let size = data.len() as u64;
    if size > state.config.max_upload_bytes {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(serde_json::json!({
                "error": format!("File too large. Max size: {} MB", state.config.max_upload_bytes / 1_048_576)
            })),
        )
            .into_response();
    }

    // Determine extension from original filename
    let ext = original_filename
        .rsplit('.')
        .next()
        .filter(|e| e.len() <= 10 && e.chars().all(|c| c.is_alphanumeric()))
        .unwrap_or("bin");
    let stored = format!("{}.{}", uuid::Uuid::new_v4(), ext);
    let file_path = std::path::Path::new(&state.config.upload_dir).join(&stored);

    if let Some(parent) = file_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    // Write blob to disk before the row exists
    if tokio::fs::write(&file_path, &data).await.is_err() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "Failed to save file"})),
        )
            .into_response();
    }

    let attachment = NewAttachment {
        stored,
        name: original_filename,
        content_type,
        size: size as i64,
    };

    let result = dispatch::send_message(
        &state.db,
        state.presence.as_ref(),
        &user.id,
        &receiver_id,
        text,
        Some(attachment),
    )
    .await;

    match result {
        Ok(message) => {
            Json(serde_json::json!({"success": true, "message": message})).into_response()
        }
        Err(e) => {
            // Clean up the orphaned blob on insert failure
            let _ = tokio::fs::remove_file(&file_path).await;
            e.into_response()
        }
    }
}

/// GET /api/chat/files/{messageId}/{filename}
pub async fn serve_file(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path((message_id, _filename)): Path<(String, String)>,
) -> impl IntoResponse {
    let message = match store::get(&state.db, &message_id).await {
        Ok(m) => m,
        Err(e) => return e.into_response(),
    };

    let (stored, name, content_type) = match (
        message.attachment_path,
        message.attachment_name,
        message.attachment_type,
    ) {
        (Some(p), Some(n), Some(t)) => (p, n, t),
        _ => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": "Message has no attachment"})),
            )
                .into_response()
        }
    };

    let file_path = std::path::Path::new(&state.config.upload_dir).join(&stored);
    let file = match tokio::fs::File::open(&file_path).await {
        Ok(f) => f,
        Err(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": "File not found on disk"})),
            )
                .into_response()
        }
    };

    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    let disposition = if content_type.starts_with("image/")
        || content_type.starts_with("video/")
        || content_type.starts_with("audio/")
    {
        "inline".to_string()
    } else {
        format!("attachment; filename=\"{}\"", name)
    };

    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CACHE_CONTROL, "private, max-age=3600".to_string()),
        ],
        body,
    )
        .into_response()
}
