//! Authentication handlers

use axum::extract::{Extension, Json};
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::extractors::AuthedUser;
use super::models::{
    Claims, GoogleIdTokenPayload, LoginRequest, RegisterRequest, RegisterResponse, User,
};
use super::password::{hash_password, verify_password};
use super::validators::RegisterValidator;
use crate::common::{generate_user_id, safe_email_log, ApiError, AppState, Validator};

/// POST /api/register
/// Creates a credential-backed account
///
/// # Request Body
/// ```json
/// {
///   "name": "Ann",
///   "email": "ann@x.com",
///   "password": "longpassword"
/// }
/// ```
///
/// # Response
/// 201 with `{ "name": ..., "email": ... }`; 409 if the email is taken.
pub async fn register(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let state = state_lock.read().await.clone();

    let validation = RegisterValidator.validate(&payload);
    if !validation.is_valid {
        return Err(validation.into());
    }

    // Exact-match email lookup, case-sensitive as stored
    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(&payload.email)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    if existing.is_some() {
        warn!(
            email = %safe_email_log(&payload.email),
            "Registration rejected: email already exists"
        );
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    let password_hash = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "Password hashing failed during registration");
        ApiError::InternalServer("registration failed".to_string())
    })?;

    let id = generate_user_id();
    let name = payload.name.trim().to_string();

    sqlx::query(
        r#"
        INSERT INTO users (id, email, name, password_hash, created_at)
        VALUES (?, ?, ?, ?, datetime('now'))
        "#,
    )
    .bind(&id)
    .bind(&payload.email)
    .bind(&name)
    .bind(&password_hash)
    .execute(&state.db)
    .await
    .map_err(|e| {
        // A concurrent registration can slip past the lookup above
        if e.as_database_error()
            .map_or(false, |d| d.is_unique_violation())
        {
            ApiError::Conflict("Email already exists".to_string())
        } else {
            ApiError::DatabaseError(e)
        }
    })?;

    info!(
        user_id = %id,
        email = %safe_email_log(&payload.email),
        "New user account registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            name,
            email: payload.email,
        }),
    ))
}

/// POST /api/auth/login
/// Authenticates a user via email and password
///
/// # Response
/// ```json
/// {
///   "token": "<jwt token>",
///   "user": { ... }
/// }
/// ```
pub async fn login(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let user = match verify_credentials(&state.db, &payload.email, &payload.password).await? {
        Ok(user) => user,
        Err(rejection) => {
            // Internally distinct, externally uniform: the response never
            // reveals whether the account exists or is OAuth-only.
            warn!(
                email = %safe_email_log(&payload.email),
                reason = ?rejection,
                "Login rejected"
            );
            return Err(ApiError::Unauthorized(
                "invalid email or password".to_string(),
            ));
        }
    };

    let token = issue_token(&user, &state.jwt_secret, state.session_ttl_hours)?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        "User authentication successful via credentials"
    );

    let resp = serde_json::json!({
        "token": token,
        "user": {
            "id": user.id,
            "email": user.email,
            "name": user.name,
            "avatar": user.avatar,
        },
    });

    Ok(Json(resp))
}

/// POST /api/auth/google
/// Authenticates a user via Google OAuth ID token
///
/// # Request Body
/// ```json
/// {
///   "id_token": "<google id token>"
/// }
/// ```
///
/// # Response
/// ```json
/// {
///   "token": "<jwt token>",
///   "user": { ... }
/// }
/// ```
pub async fn google_auth(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<GoogleIdTokenPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    info!("Received Google auth request");
    let state = state_lock.read().await.clone();

    // Verify token with Google's tokeninfo endpoint
    // Docs: https://developers.google.com/identity/sign-in/web/backend-auth
    let tokeninfo_url = format!(
        "https://oauth2.googleapis.com/tokeninfo?id_token={}",
        payload.id_token
    );

    debug!("Initiating Google token validation with tokeninfo endpoint");

    let resp = state.http.get(&tokeninfo_url).send().await;
    let body = match resp {
        Ok(r) => {
            let status = r.status();
            if status.is_success() {
                r.json::<serde_json::Value>().await.map_err(|e| {
                    error!(error = %e, "Failed to parse Google tokeninfo JSON response");
                    ApiError::BadRequest("malformed id_token".to_string())
                })?
            } else {
                warn!(http_status = %status, "Google tokeninfo rejected the token");
                match status.as_u16() {
                    401 => {
                        return Err(ApiError::Unauthorized(
                            "expired or invalid id_token".to_string(),
                        ))
                    }
                    _ => {
                        return Err(ApiError::BadRequest(
                            "id_token validation failed".to_string(),
                        ))
                    }
                }
            }
        }
        Err(e) => {
            error!(
                error = %e,
                endpoint = "https://oauth2.googleapis.com/tokeninfo",
                "HTTP error contacting Google tokeninfo endpoint"
            );
            return Err(ApiError::ServiceUnavailable(
                "google token validation service unavailable".to_string(),
            ));
        }
    };

    // Extract required fields: email, sub
    let email = body
        .get("email")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let sub = body.get("sub").and_then(|v| v.as_str()).map(str::to_string);
    let name = body
        .get("name")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let picture = body
        .get("picture")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let (email, sub) = match (email, sub) {
        (Some(email), Some(sub)) => (email, sub),
        (email, sub) => {
            warn!(
                has_email = email.is_some(),
                has_sub = sub.is_some(),
                "Google token missing required fields (email/sub)"
            );
            return Err(ApiError::BadRequest(
                "token missing required fields".to_string(),
            ));
        }
    };

    // Check token expiration; tokeninfo reports exp as a decimal string
    let exp = body.get("exp").and_then(|v| {
        v.as_i64()
            .or_else(|| v.as_str().and_then(|s| s.parse::<i64>().ok()))
    });
    if let Some(exp) = exp {
        if exp < Utc::now().timestamp() {
            warn!(token_exp = exp, "Google token has expired");
            return Err(ApiError::Unauthorized("token has expired".to_string()));
        }
    }

    // Validate audience (client id) when configured
    if let Some(client_id) = &state.google_client_id {
        match body.get("aud").and_then(|v| v.as_str()) {
            Some(aud_val) if aud_val == client_id => {}
            Some(aud_val) => {
                warn!(
                    token_audience = %aud_val,
                    "Google token audience validation failed - rejecting token"
                );
                return Err(ApiError::Unauthorized(
                    "token audience mismatch".to_string(),
                ));
            }
            None => {
                warn!("Google token missing audience field - rejecting token");
                return Err(ApiError::Unauthorized("token missing audience".to_string()));
            }
        }
    }

    debug!(
        email = %safe_email_log(&email),
        provider = "google",
        provider_id = %sub,
        "Google token validation successful, proceeding with user lookup"
    );

    let user = find_or_create_google_user(&state.db, &email, &sub, name, picture).await?;

    let token = issue_token(&user, &state.jwt_secret, state.session_ttl_hours)?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        provider = "google",
        "User authentication successful via Google OAuth"
    );

    let resp = serde_json::json!({
        "token": token,
        "user": {
            "id": user.id,
            "email": user.email,
            "name": user.name,
            "avatar": user.avatar,
        },
    });

    Ok(Json(resp))
}

/// GET /api/me
/// Returns the current authenticated user's information
pub async fn me_handler(authed: AuthedUser) -> Result<Json<serde_json::Value>, ApiError> {
    // The extractor already refreshed the identity from the database
    let resp = serde_json::json!({
        "user": {
            "id": authed.id,
            "email": authed.email,
            "name": authed.name,
            "avatar": authed.avatar,
        },
    });
    Ok(Json(resp))
}

/// POST /api/auth/logout
/// Logout endpoint - sessions are stateless JWTs, so logout is the client
/// discarding its token. A token cannot be force-expired before its natural
/// expiry; this endpoint only confirms the request.
pub async fn logout_handler(_authed: AuthedUser) -> Result<Json<serde_json::Value>, ApiError> {
    info!("User logout successful");
    let resp = serde_json::json!({
        "message": "Logout successful"
    });
    Ok(Json(resp))
}

// ---- Helper Functions ----

/// Why a credential check failed. Logged internally, never surfaced
/// distinctly to the caller (account enumeration).
#[derive(Debug)]
pub enum CredentialRejection {
    NoSuchAccount,
    NoPasswordSet,
    BadCredentials,
}

/// Check an email/password pair against the stored account.
///
/// Read-only. The outer Result is an infrastructure failure; the inner one
/// is the verification verdict.
pub async fn verify_credentials(
    pool: &SqlitePool,
    email: &str,
    password: &str,
) -> Result<Result<User, CredentialRejection>, ApiError> {
    let user: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(ApiError::DatabaseError)?;

    let user = match user {
        Some(u) => u,
        None => return Ok(Err(CredentialRejection::NoSuchAccount)),
    };

    let hash = match &user.password_hash {
        Some(h) => h,
        // OAuth-only account, no password to compare against
        None => return Ok(Err(CredentialRejection::NoPasswordSet)),
    };

    if !verify_password(password, hash) {
        return Ok(Err(CredentialRejection::BadCredentials));
    }

    Ok(Ok(user))
}

/// Mint a session token for a verified identity
///
/// Claims carry the subject id and a snapshot of display fields; the
/// snapshot is overwritten from the database on every validation.
pub fn issue_token(user: &User, secret: &str, ttl_hours: i64) -> Result<String, ApiError> {
    let exp = (Utc::now() + Duration::hours(ttl_hours)).timestamp() as usize;
    let claims = Claims {
        sub: user.id.clone(),
        name: user.name.clone(),
        email: user.email.clone(),
        avatar: user.avatar.clone(),
        exp,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        error!(error = %e, user_id = %user.id, "JWT encoding error during authentication");
        ApiError::InternalServer("jwt error".to_string())
    })
}

async fn find_or_create_google_user(
    pool: &SqlitePool,
    email: &str,
    sub: &str,
    name: Option<String>,
    picture: Option<String>,
) -> Result<User, ApiError> {
    let existing: Option<User> = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE provider = ? AND provider_id = ?",
    )
    .bind("google")
    .bind(sub)
    .fetch_optional(pool)
    .await
    .map_err(ApiError::DatabaseError)?;

    if let Some(user) = existing {
        debug!(user_id = %user.id, provider = "google", "Found existing user in database");
        return Ok(user);
    }

    let id = generate_user_id();
    info!(
        user_id = %id,
        email = %safe_email_log(email),
        provider = "google",
        "Creating new user account via Google OAuth"
    );

    sqlx::query(
        r#"
        INSERT INTO users (id, email, name, avatar, provider, provider_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, datetime('now'))
        "#,
    )
    .bind(&id)
    .bind(email)
    .bind(name.as_deref())
    .bind(picture.as_deref())
    .bind("google")
    .bind(sub)
    .execute(pool)
    .await
    .map_err(ApiError::DatabaseError)?;

    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&id)
        .fetch_one(pool)
        .await
        .map_err(ApiError::DatabaseError)
}
