//! Transport-agnostic core of the messaging subsystem. Everything here is
//! written against the narrow [`Publisher`] interface so it can be
//! exercised without a live socket.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::ChatError;
use crate::models::{Message, NewAttachment};
use crate::store;
use crate::ws::events::ServerEvent;

/// Push a serialized event to a user's live connection, if any.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn notify(&self, user_id: &str, event: &ServerEvent);
}

/// Persist a message, then push it to the receiver (if online) and echo
/// it back to the sender. Persistence failures abort before any push;
/// push failures never surface — the stored row stays authoritative.
pub async fn send_message(
    pool: &SqlitePool,
    publisher: &dyn Publisher,
    sender_id: &str,
    receiver_id: &str,
    text: Option<String>,
    attachment: Option<NewAttachment>,
) -> Result<Message, ChatError> {
    if receiver_id.is_empty() {
        return Err(ChatError::Validation("Receiver is required".into()));
    }

    let text = text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    if let Some(t) = &text {
        bridge_shared::validation::validate_message_text(t).map_err(ChatError::Validation)?;
    }

    let message = store::create(pool, sender_id, receiver_id, text, attachment).await?;

    let event = ServerEvent::Message {
        message: message.clone(),
    };
    publisher.notify(receiver_id, &event).await;
    // Echo to the sender as delivery confirmation / multi-tab sync
    publisher.notify(sender_id, &event).await;

    Ok(message)
}

/// Edit a text message in place. Only the sender may edit; attachment
/// messages are delete-only. The receiver is notified best-effort.
pub async fn edit_message(
    pool: &SqlitePool,
    publisher: &dyn Publisher,
    message_id: &str,
    requester_id: &str,
    new_text: &str,
) -> Result<Message, ChatError> {
    let message = store::get(pool, message_id).await?;

    if message.sender_id != requester_id {
        return Err(ChatError::Forbidden);
    }

    let new_text = new_text.trim();
    bridge_shared::validation::validate_message_text(new_text).map_err(ChatError::Validation)?;

    let updated = store::update_text(pool, message_id, new_text).await?;

    publisher
        .notify(
            &updated.receiver_id,
            &ServerEvent::MessageEdit {
                message_id: updated.id.clone(),
                text: new_text.to_string(),
                edited_at: updated.edited_at.clone().unwrap_or_default(),
            },
        )
        .await;

    Ok(updated)
}

/// Delete a message and its attachment blob. Blob removal is best-effort;
/// the row is removed regardless once ownership is verified.
pub async fn delete_message(
    pool: &SqlitePool,
    publisher: &dyn Publisher,
    upload_dir: &str,
    message_id: &str,
    requester_id: &str,
) -> Result<(), ChatError> {
    let message = store::get(pool, message_id).await?;

    if message.sender_id != requester_id {
        return Err(ChatError::Forbidden);
    }

    remove_attachment_blob(upload_dir, &message).await;
    store::delete(pool, message_id).await?;

    publisher
        .notify(
            &message.receiver_id,
            &ServerEvent::MessageDelete {
                message_id: message.id.clone(),
            },
        )
        .await;

    Ok(())
}

/// Remove every message between two users in either direction, cleaning
/// up attachment blobs along the way. Silent: no counterparty push.
pub async fn clear_conversation(
    pool: &SqlitePool,
    upload_dir: &str,
    user_a: &str,
    user_b: &str,
) -> Result<u64, ChatError> {
    let removed = store::clear_between(pool, user_a, user_b).await?;

    for message in &removed {
        remove_attachment_blob(upload_dir, message).await;
    }

    Ok(removed.len() as u64)
}

/// Typing indicators are fire-and-forget: forwarded to the target's
/// connection if online, never persisted.
pub async fn forward_typing(
    publisher: &dyn Publisher,
    from_user_id: &str,
    target_user_id: &str,
    active: bool,
) {
    publisher
        .notify(
            target_user_id,
            &ServerEvent::Typing {
                user_id: from_user_id.to_string(),
                active,
            },
        )
        .await;
}

async fn remove_attachment_blob(upload_dir: &str, message: &Message) {
    let Some(stored) = &message.attachment_path else {
        return;
    };

    let path = std::path::Path::new(upload_dir).join(stored);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        // Metadata consistency wins over blob cleanup completeness
        tracing::warn!("failed to remove attachment blob {:?}: {}", path, e);
    }
}
