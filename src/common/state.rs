// Application state shared across all modules

use reqwest::Client;
use sqlx::SqlitePool;

/// Application state containing the database pool and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub http: Client,
    pub jwt_secret: String,
    pub google_client_id: Option<String>,
    /// Session token lifetime in hours
    pub session_ttl_hours: i64,
}
