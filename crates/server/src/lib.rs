pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod store;
pub mod ws;

use config::Config;
use std::sync::Arc;

pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub config: Config,
    pub presence: Arc<ws::presence::PresenceTracker>,
}
