mod message;

pub use message::*;

/// Identity resolved from the session layer. Auth itself lives outside
/// this service; we only consume the users/sessions tables it maintains.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
}
