use sqlx::SqlitePool;

use crate::error::ChatError;
use crate::models::{Message, NewAttachment};

/// Insert one message. Rejects a body with neither text nor attachment.
pub async fn create(
    pool: &SqlitePool,
    sender_id: &str,
    receiver_id: &str,
    text: Option<String>,
    attachment: Option<NewAttachment>,
) -> Result<Message, ChatError> {
    if text.is_none() && attachment.is_none() {
        return Err(ChatError::Validation("Message text is required".into()));
    }

    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let message = Message {
        id,
        sender_id: sender_id.to_string(),
        receiver_id: receiver_id.to_string(),
        text,
        attachment_path: attachment.as_ref().map(|a| a.stored.clone()),
        attachment_name: attachment.as_ref().map(|a| a.name.clone()),
        attachment_type: attachment.as_ref().map(|a| a.content_type.clone()),
        attachment_size: attachment.as_ref().map(|a| a.size),
        created_at: now,
        is_read: 0,
        edited: 0,
        edited_at: None,
    };

    sqlx::query(
        r#"INSERT INTO messages
           (id, sender_id, receiver_id, text,
            attachment_path, attachment_name, attachment_type, attachment_size,
            created_at, is_read, edited)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0)"#,
    )
    .bind(&message.id)
    .bind(&message.sender_id)
    .bind(&message.receiver_id)
    .bind(&message.text)
    .bind(&message.attachment_path)
    .bind(&message.attachment_name)
    .bind(&message.attachment_type)
    .bind(message.attachment_size)
    .bind(&message.created_at)
    .execute(pool)
    .await?;

    Ok(message)
}

/// Full conversation between two users in either direction, oldest first.
/// Ties on created_at are broken by id so the ordering is stable.
pub async fn list_between(
    pool: &SqlitePool,
    user_a: &str,
    user_b: &str,
) -> Result<Vec<Message>, ChatError> {
    let messages = sqlx::query_as::<_, Message>(
        r#"SELECT * FROM messages
           WHERE (sender_id = ? AND receiver_id = ?)
              OR (sender_id = ? AND receiver_id = ?)
           ORDER BY created_at ASC, id ASC"#,
    )
    .bind(user_a)
    .bind(user_b)
    .bind(user_b)
    .bind(user_a)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

/// Flip every unread message from `sender_id` to `receiver_id` to read.
/// Idempotent; re-running touches no rows.
pub async fn mark_read(
    pool: &SqlitePool,
    sender_id: &str,
    receiver_id: &str,
) -> Result<(), ChatError> {
    sqlx::query(
        "UPDATE messages SET is_read = 1 WHERE sender_id = ? AND receiver_id = ? AND is_read = 0",
    )
    .bind(sender_id)
    .bind(receiver_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Unread messages addressed to `user_id`, counted per sender.
pub async fn unread_counts(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<(String, i64)>, ChatError> {
    let counts = sqlx::query_as::<_, (String, i64)>(
        r#"SELECT sender_id, COUNT(*) FROM messages
           WHERE receiver_id = ? AND is_read = 0
           GROUP BY sender_id"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(counts)
}

pub async fn get(pool: &SqlitePool, message_id: &str) -> Result<Message, ChatError> {
    sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = ?")
        .bind(message_id)
        .fetch_optional(pool)
        .await?
        .ok_or(ChatError::NotFound)
}

/// In-place text edit. Attachment messages are delete-only.
pub async fn update_text(
    pool: &SqlitePool,
    message_id: &str,
    new_text: &str,
) -> Result<Message, ChatError> {
    let mut message = get(pool, message_id).await?;

    if message.has_attachment() {
        return Err(ChatError::AttachmentPresent);
    }

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query("UPDATE messages SET text = ?, edited = 1, edited_at = ? WHERE id = ?")
        .bind(new_text)
        .bind(&now)
        .bind(message_id)
        .execute(pool)
        .await?;

    message.text = Some(new_text.to_string());
    message.edited = 1;
    message.edited_at = Some(now);
    Ok(message)
}

/// Row removal only. Any attachment blob is the caller's to clean up.
pub async fn delete(pool: &SqlitePool, message_id: &str) -> Result<(), ChatError> {
    sqlx::query("DELETE FROM messages WHERE id = ?")
        .bind(message_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Delete every message between two users in either direction, returning
/// the removed rows so the caller can clean up attachment blobs. Runs in
/// a transaction so a row inserted mid-clear is never deleted without
/// appearing in the returned list.
pub async fn clear_between(
    pool: &SqlitePool,
    user_a: &str,
    user_b: &str,
) -> Result<Vec<Message>, ChatError> {
    let mut tx = pool.begin().await?;

    let removed = sqlx::query_as::<_, Message>(
        r#"SELECT * FROM messages
           WHERE (sender_id = ? AND receiver_id = ?)
              OR (sender_id = ? AND receiver_id = ?)
           ORDER BY created_at ASC, id ASC"#,
    )
    .bind(user_a)
    .bind(user_b)
    .bind(user_b)
    .bind(user_a)
    .fetch_all(&mut *tx)
    .await?;

    sqlx::query(
        r#"DELETE FROM messages
           WHERE (sender_id = ? AND receiver_id = ?)
              OR (sender_id = ? AND receiver_id = ?)"#,
    )
    .bind(user_a)
    .bind(user_b)
    .bind(user_b)
    .bind(user_a)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(removed)
}
