#![allow(dead_code)]

pub mod ws_helpers;

use axum::Router;
use bridge_server::{config::Config, routes, ws, AppState};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::Arc;

pub const TEST_UPLOAD_DIR: &str = "/tmp/bridge-test-uploads";

/// Create an in-memory SQLite pool with schema applied.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .unwrap();

    // Run schema
    let schema = include_str!("../../src/db/schema.sql");
    for statement in schema.split(';') {
        let trimmed = statement.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(&pool).await.unwrap();
        }
    }

    pool
}

/// Build a test Axum app with the given pool.
pub fn create_test_app(pool: SqlitePool) -> Router {
    routes::build_router(test_state(pool))
}

pub fn test_state(pool: SqlitePool) -> Arc<AppState> {
    test_state_with_cap(pool, 1_048_576)
}

pub fn test_state_with_cap(pool: SqlitePool, max_upload_bytes: u64) -> Arc<AppState> {
    std::fs::create_dir_all(TEST_UPLOAD_DIR).ok();

    Arc::new(AppState {
        db: pool,
        config: Config {
            host: "127.0.0.1".into(),
            port: 0,
            database_path: ":memory:".into(),
            upload_dir: TEST_UPLOAD_DIR.into(),
            max_upload_bytes,
        },
        presence: Arc::new(ws::presence::PresenceTracker::new()),
    })
}

/// Create a test user with a valid session. Returns (user_id, session_token).
pub async fn create_test_user(pool: &SqlitePool, username: &str) -> (String, String) {
    let user_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query("INSERT INTO users (id, username, created_at) VALUES (?, ?, ?)")
        .bind(&user_id)
        .bind(username)
        .bind(&now)
        .execute(pool)
        .await
        .unwrap();

    let session_token = uuid::Uuid::new_v4().to_string();
    let session_id = uuid::Uuid::new_v4().to_string();
    let expires_at = (chrono::Utc::now() + chrono::Duration::days(30)).to_rfc3339();

    sqlx::query(
        "INSERT INTO sessions (id, user_id, token, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&session_id)
    .bind(&user_id)
    .bind(&session_token)
    .bind(&expires_at)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap();

    (user_id, session_token)
}

/// Insert a text message directly. Returns the message id.
pub async fn insert_message(
    pool: &SqlitePool,
    sender_id: &str,
    receiver_id: &str,
    text: &str,
    created_at: &str,
) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO messages (id, sender_id, receiver_id, text, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(sender_id)
    .bind(receiver_id)
    .bind(text)
    .bind(created_at)
    .execute(pool)
    .await
    .unwrap();
    id
}

/// Insert an attachment message, writing a small blob under the test
/// upload dir so deletion paths have something to remove.
pub async fn insert_attachment_message(
    pool: &SqlitePool,
    sender_id: &str,
    receiver_id: &str,
    filename: &str,
) -> (String, std::path::PathBuf) {
    let id = uuid::Uuid::new_v4().to_string();
    let stored = format!("{}.bin", id);
    let blob_path = std::path::Path::new(TEST_UPLOAD_DIR).join(&stored);
    std::fs::create_dir_all(TEST_UPLOAD_DIR).ok();
    std::fs::write(&blob_path, b"blob").unwrap();

    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        r#"INSERT INTO messages
           (id, sender_id, receiver_id, text,
            attachment_path, attachment_name, attachment_type, attachment_size, created_at)
           VALUES (?, ?, ?, NULL, ?, ?, 'application/octet-stream', 4, ?)"#,
    )
    .bind(&id)
    .bind(sender_id)
    .bind(receiver_id)
    .bind(&stored)
    .bind(filename)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap();

    (id, blob_path)
}

pub async fn message_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages")
        .fetch_one(pool)
        .await
        .unwrap()
}
