pub const APP_NAME: &str = "Bridge";

// Limits
pub const MAX_MESSAGE_LENGTH: usize = 4000;

// Attachments are capped at the boundary before a message is created
pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;
