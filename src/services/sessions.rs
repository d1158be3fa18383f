//! Cookie-backed sign-in sessions and password hashing.
//!
//! The cookie carries a random URL-safe token; the database only stores its
//! SHA-256 digest, so a leaked table cannot be replayed as cookies.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use rand::RngCore;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    database::models::{sessions, users},
    errors::AppError,
};

pub const SESSION_COOKIE: &str = "session_token";

const TOKEN_BYTES: usize = 32;

pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn hash_token(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}

/// Runs bcrypt on the blocking pool, off the actix worker.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| {
            log::error!("password hash task panicked: {}", e);
            AppError::Internal("password hashing failed".to_string())
        })?
        .map_err(AppError::from)
}

/// Stored hashes that fail to parse count as a mismatch.
pub async fn verify_password(password: &str, hash: &str) -> bool {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .unwrap_or_else(|e| {
            log::error!("password verify task panicked: {}", e);
            false
        })
}

/// Same bcrypt work as a real check, for sign-ins with an unknown email.
pub async fn burn_password_check(password: &str, cost: u32) {
    if let Err(e) = hash_password(password, cost).await {
        log::debug!("dummy password hash failed: {}", e);
    }
}

/// Opens a session for `user_id` and returns the raw cookie token.
pub async fn create_session(
    db: &DatabaseConnection,
    user_id: &str,
    ttl: chrono::Duration,
) -> Result<(String, sessions::Model), AppError> {
    let token = generate_token();
    let now = Utc::now();

    let session = sessions::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        token_hash: Set(hash_token(&token)),
        user_id: Set(user_id.to_string()),
        created_at: Set(now),
        expires_at: Set(now + ttl),
    }
    .insert(db)
    .await?;

    log::debug!("session opened for user {}", user_id);
    Ok((token, session))
}

/// Resolves a cookie token to its user. Expired sessions are removed.
pub async fn find_session_user(
    db: &DatabaseConnection,
    token: &str,
) -> Result<Option<users::Model>, AppError> {
    let session = sessions::Entity::find()
        .filter(sessions::Column::TokenHash.eq(hash_token(token)))
        .one(db)
        .await?;

    let Some(session) = session else {
        return Ok(None);
    };

    if session.expires_at <= Utc::now() {
        log::debug!("session {} expired", session.id);
        session.delete(db).await?;
        return Ok(None);
    }

    let user = users::Entity::find_by_id(session.user_id.clone())
        .one(db)
        .await?;
    Ok(user)
}

pub async fn revoke_session(db: &DatabaseConnection, token: &str) -> Result<(), AppError> {
    let result = sessions::Entity::delete_many()
        .filter(sessions::Column::TokenHash.eq(hash_token(token)))
        .exec(db)
        .await?;
    log::debug!("revoked {} session(s)", result.rows_affected);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_random_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn token_hash_is_stable() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
        assert_ne!(hash_token("abc"), "abc");
    }

    #[actix_web::test]
    async fn password_round_trip() {
        let hash = hash_password("correct horse", 4).await.unwrap();
        assert!(verify_password("correct horse", &hash).await);
        assert!(!verify_password("wrong horse", &hash).await);
        assert!(!verify_password("anything", "not-a-bcrypt-hash").await);
    }

    #[actix_web::test]
    async fn hashing_does_not_stall_the_worker() {
        let started = std::time::Instant::now();
        let timer = actix_web::rt::spawn(async move {
            actix_web::rt::time::sleep(std::time::Duration::from_millis(5)).await;
            started.elapsed()
        });

        let hash = hash_password("correct horse", 12).await.unwrap();
        assert!(hash.starts_with("$2b$12$"));

        let waited = timer.await.unwrap();
        assert!(
            waited < std::time::Duration::from_millis(200),
            "timer fired after {:?}",
            waited
        );
    }
}
