use serde::{Deserialize, Serialize};

/// One direct message row. Attachment columns are all present or all NULL.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub text: Option<String>,
    pub attachment_path: Option<String>,
    pub attachment_name: Option<String>,
    pub attachment_type: Option<String>,
    pub attachment_size: Option<i64>,
    pub created_at: String,
    pub is_read: i64,
    pub edited: i64,
    pub edited_at: Option<String>,
}

impl Message {
    pub fn has_attachment(&self) -> bool {
        self.attachment_path.is_some()
    }
}

/// Metadata for a blob already written by the upload boundary.
/// `stored` is the on-disk filename under the upload directory.
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub stored: String,
    pub name: String,
    pub content_type: String,
    pub size: i64,
}
