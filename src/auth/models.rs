//! Authentication data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// JWT claims structure
///
/// Carries the subject id plus a snapshot of display claims. The snapshot is
/// superseded by a fresh database read on every validation, so a renamed or
/// re-avatarred account shows up without re-login.
#[derive(Serialize, Deserialize, Debug)]
pub struct Claims {
    pub sub: String,
    pub name: Option<String>,
    pub email: String,
    pub avatar: Option<String>,
    pub exp: usize,
}

/// User database model
///
/// password_hash stays out of serialized responses.
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub provider: Option<String>,
    pub provider_id: Option<String>,
    pub created_at: Option<String>,
}

/// Registration request body
#[derive(Deserialize, Debug)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Registration response body (no id, no hash)
#[derive(Serialize, Debug)]
pub struct RegisterResponse {
    pub name: String,
    pub email: String,
}

/// Credential login request body
#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Google ID token payload for OAuth
#[derive(Deserialize)]
pub struct GoogleIdTokenPayload {
    pub id_token: String,
}
