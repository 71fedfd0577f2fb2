//! Tests for auth module
//!
//! These tests verify core authentication functionality including:
//! - JWT session token issue and validation
//! - Credential verification against stored Argon2 hashes
//! - Registration input validation

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::auth::handlers::{issue_token, verify_credentials, CredentialRejection};
    use crate::auth::password::hash_password;
    use crate::auth::validators::RegisterValidator;
    use crate::common::{migrations, Validator};
    use crate::common::{ApiError, AppState};
    use axum::extract::FromRequestParts;
    use axum::http::request::Parts;
    use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    async fn test_pool() -> SqlitePool {
        // Single connection so the in-memory database is shared
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory database");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    async fn test_state() -> Arc<RwLock<AppState>> {
        Arc::new(RwLock::new(AppState {
            db: test_pool().await,
            http: reqwest::Client::new(),
            jwt_secret: "test_secret_key".to_string(),
            google_client_id: None,
            session_ttl_hours: 24,
        }))
    }

    /// Request parts carrying the app state extension, the way the router
    /// layers hand them to the extractor
    fn request_parts(state: Arc<RwLock<AppState>>, auth: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().uri("/api/tasks");
        if let Some(auth) = auth {
            builder = builder.header(axum::http::header::AUTHORIZATION, auth);
        }
        let (mut parts, ()) = builder
            .body(())
            .expect("Failed to build request")
            .into_parts();
        parts.extensions.insert(state);
        parts
    }

    fn sample_user(id: &str, email: &str) -> models::User {
        models::User {
            id: id.to_string(),
            email: email.to_string(),
            name: Some("Ann".to_string()),
            avatar: None,
            password_hash: None,
            provider: None,
            provider_id: None,
            created_at: None,
        }
    }

    async fn insert_user(pool: &SqlitePool, id: &str, email: &str, password: Option<&str>) {
        let hash = password.map(|p| hash_password(p).expect("Failed to hash password"));
        sqlx::query(
            "INSERT INTO users (id, email, name, password_hash) VALUES (?, ?, ?, ?)",
        )
        .bind(id)
        .bind(email)
        .bind("Test User")
        .bind(hash)
        .execute(pool)
        .await
        .expect("Failed to insert user");
    }

    #[test]
    fn test_claims_structure() {
        let claims = models::Claims {
            sub: "U_TEST01".to_string(),
            name: Some("Ann".to_string()),
            email: "ann@x.com".to_string(),
            avatar: None,
            exp: 9999999999,
        };

        assert_eq!(claims.sub, "U_TEST01");
        assert_eq!(claims.email, "ann@x.com");
    }

    #[test]
    fn test_issue_token_round_trip() {
        let user = models::User {
            id: "U_TEST01".to_string(),
            email: "ann@x.com".to_string(),
            name: Some("Ann".to_string()),
            avatar: None,
            password_hash: None,
            provider: None,
            provider_id: None,
            created_at: None,
        };

        let token = issue_token(&user, "test_secret_key", 24).expect("Failed to issue token");

        let decoded = decode::<models::Claims>(
            &token,
            &DecodingKey::from_secret("test_secret_key".as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .expect("Failed to decode token");

        assert_eq!(decoded.claims.sub, "U_TEST01");
        assert_eq!(decoded.claims.email, "ann@x.com");
        assert_eq!(decoded.claims.name, Some("Ann".to_string()));
    }

    #[test]
    fn test_jwt_validation_fails_with_wrong_secret() {
        let claims = models::Claims {
            sub: "U_TEST01".to_string(),
            name: None,
            email: "ann@x.com".to_string(),
            avatar: None,
            exp: 9999999999,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret("test_secret_key".as_bytes()),
        )
        .expect("Failed to encode token");

        let result = decode::<models::Claims>(
            &token,
            &DecodingKey::from_secret("wrong_secret_key".as_bytes()),
            &Validation::new(Algorithm::HS256),
        );

        assert!(
            result.is_err(),
            "Token validation should fail with wrong secret"
        );
    }

    #[test]
    fn test_jwt_validation_fails_when_expired() {
        let claims = models::Claims {
            sub: "U_TEST01".to_string(),
            name: None,
            email: "ann@x.com".to_string(),
            avatar: None,
            exp: 1000, // 1970, far beyond any leeway
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret("test_secret_key".as_bytes()),
        )
        .expect("Failed to encode token");

        let result = decode::<models::Claims>(
            &token,
            &DecodingKey::from_secret("test_secret_key".as_bytes()),
            &Validation::new(Algorithm::HS256),
        );

        assert!(result.is_err(), "Expired token must not validate");
    }

    #[test]
    fn test_jwt_validation_fails_when_tampered() {
        let user = models::User {
            id: "U_TEST01".to_string(),
            email: "ann@x.com".to_string(),
            name: None,
            avatar: None,
            password_hash: None,
            provider: None,
            provider_id: None,
            created_at: None,
        };

        let token = issue_token(&user, "test_secret_key", 24).expect("Failed to issue token");

        // Corrupt the signature segment
        let mut tampered = token.clone();
        let last = tampered.pop().expect("token is non-empty");
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        let result = decode::<models::Claims>(
            &tampered,
            &DecodingKey::from_secret("test_secret_key".as_bytes()),
            &Validation::new(Algorithm::HS256),
        );

        assert!(result.is_err(), "Tampered token must not validate");
    }

    #[tokio::test]
    async fn test_verify_credentials_success() {
        let pool = test_pool().await;
        insert_user(&pool, "U_TEST01", "ann@x.com", Some("longpassword")).await;

        let verdict = verify_credentials(&pool, "ann@x.com", "longpassword")
            .await
            .expect("Lookup failed");

        let user = verdict.expect("Expected verified identity");
        assert_eq!(user.id, "U_TEST01");
    }

    #[tokio::test]
    async fn test_verify_credentials_no_such_account() {
        let pool = test_pool().await;

        let verdict = verify_credentials(&pool, "nobody@x.com", "longpassword")
            .await
            .expect("Lookup failed");

        assert!(matches!(verdict, Err(CredentialRejection::NoSuchAccount)));
    }

    #[tokio::test]
    async fn test_verify_credentials_oauth_only_account() {
        let pool = test_pool().await;
        insert_user(&pool, "U_TEST01", "ann@x.com", None).await;

        let verdict = verify_credentials(&pool, "ann@x.com", "longpassword")
            .await
            .expect("Lookup failed");

        assert!(matches!(verdict, Err(CredentialRejection::NoPasswordSet)));
    }

    #[tokio::test]
    async fn test_verify_credentials_bad_password() {
        let pool = test_pool().await;
        insert_user(&pool, "U_TEST01", "ann@x.com", Some("longpassword")).await;

        let verdict = verify_credentials(&pool, "ann@x.com", "wrongpassword")
            .await
            .expect("Lookup failed");

        assert!(matches!(verdict, Err(CredentialRejection::BadCredentials)));
    }

    #[tokio::test]
    async fn test_extractor_rejects_missing_header() {
        let state = test_state().await;
        let mut parts = request_parts(state, None);

        let result = AuthedUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_extractor_rejects_tampered_token() {
        let state = test_state().await;
        {
            let s = state.read().await;
            insert_user(&s.db, "U_TEST01", "ann@x.com", None).await;
        }

        let token = issue_token(&sample_user("U_TEST01", "ann@x.com"), "test_secret_key", 24)
            .expect("Failed to issue token");
        let mut tampered = token.clone();
        let last = tampered.pop().expect("token is non-empty");
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        let mut parts = request_parts(state, Some(&format!("Bearer {}", tampered)));
        let result = AuthedUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_extractor_rejects_expired_token() {
        let state = test_state().await;
        {
            let s = state.read().await;
            insert_user(&s.db, "U_TEST01", "ann@x.com", None).await;
        }

        let claims = models::Claims {
            sub: "U_TEST01".to_string(),
            name: None,
            email: "ann@x.com".to_string(),
            avatar: None,
            exp: 1000,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret("test_secret_key".as_bytes()),
        )
        .expect("Failed to encode token");

        let mut parts = request_parts(state, Some(&format!("Bearer {}", token)));
        let result = AuthedUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_extractor_rejects_deleted_account() {
        let state = test_state().await;

        // Well-signed token whose subject no longer exists: revoked
        let token = issue_token(&sample_user("U_GONE01", "gone@x.com"), "test_secret_key", 24)
            .expect("Failed to issue token");

        let mut parts = request_parts(state, Some(&format!("Bearer {}", token)));
        let result = AuthedUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_extractor_refreshes_display_claims() {
        let state = test_state().await;
        {
            let s = state.read().await;
            insert_user(&s.db, "U_TEST01", "ann@x.com", None).await;
        }

        let token = issue_token(&sample_user("U_TEST01", "ann@x.com"), "test_secret_key", 24)
            .expect("Failed to issue token");

        // Rename after the token was minted
        {
            let s = state.read().await;
            sqlx::query("UPDATE users SET name = ? WHERE id = ?")
                .bind("Ann Renamed")
                .bind("U_TEST01")
                .execute(&s.db)
                .await
                .expect("Failed to rename user");
        }

        let mut parts = request_parts(state, Some(&format!("Bearer {}", token)));
        let authed = AuthedUser::from_request_parts(&mut parts, &())
            .await
            .expect("Extractor should accept a valid token");

        assert_eq!(authed.id, "U_TEST01");
        assert_eq!(
            authed.name,
            Some("Ann Renamed".to_string()),
            "Identity must reflect the current account row, not the claim snapshot"
        );
    }

    #[tokio::test]
    async fn test_extractor_accepts_bearer_and_raw_token() {
        let state = test_state().await;
        {
            let s = state.read().await;
            insert_user(&s.db, "U_TEST01", "ann@x.com", None).await;
        }

        let token = issue_token(&sample_user("U_TEST01", "ann@x.com"), "test_secret_key", 24)
            .expect("Failed to issue token");

        for header in [format!("Bearer {}", token), token] {
            let mut parts = request_parts(state.clone(), Some(&header));
            let authed = AuthedUser::from_request_parts(&mut parts, &())
                .await
                .expect("Extractor should accept a valid token");
            assert_eq!(authed.id, "U_TEST01");
        }
    }

    #[test]
    fn test_register_validator_valid_request() {
        let request = models::RegisterRequest {
            name: "Ann".to_string(),
            email: "ann@x.com".to_string(),
            password: "longpassword".to_string(),
        };

        let result = RegisterValidator.validate(&request);
        assert!(result.is_valid);
        assert_eq!(result.errors.len(), 0);
    }

    #[test]
    fn test_register_validator_reports_every_violated_field() {
        let request = models::RegisterRequest {
            name: "A".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
        };

        let result = RegisterValidator.validate(&request);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 3);

        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"password"));
    }

    #[test]
    fn test_register_validator_rejects_malformed_emails() {
        for email in ["plain", "@x.com", "ann@", "ann@nodot", "a@b@c.com", "ann@.com"] {
            let request = models::RegisterRequest {
                name: "Ann".to_string(),
                email: email.to_string(),
                password: "longpassword".to_string(),
            };
            let result = RegisterValidator.validate(&request);
            assert!(!result.is_valid, "Email '{}' should be rejected", email);
        }
    }
}
