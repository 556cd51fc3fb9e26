use serde::{Deserialize, Serialize};

use crate::models::Message;

// ── Client → Server Events ──

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    SendMessage {
        #[serde(rename = "receiverId")]
        receiver_id: String,
        text: String,
    },
    Typing {
        #[serde(rename = "targetId")]
        target_id: String,
    },
    StopTyping {
        #[serde(rename = "targetId")]
        target_id: String,
    },
    Ping,
}

// ── Server → Client Events ──

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Message {
        message: Message,
    },
    MessageEdit {
        #[serde(rename = "messageId")]
        message_id: String,
        text: String,
        #[serde(rename = "editedAt")]
        edited_at: String,
    },
    MessageDelete {
        #[serde(rename = "messageId")]
        message_id: String,
    },
    Typing {
        #[serde(rename = "userId")]
        user_id: String,
        active: bool,
    },
    Error {
        message: String,
    },
}
