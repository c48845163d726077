//! Stored session CRUD operations

use crate::encryption::{SealedToken, SessionEncryptor};
use aimi_core::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Locally remembered sign-in (encrypted token stored separately)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub id: i64,
    pub user_id: String,
    pub email: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_verified: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl StoredSession {
    /// Whether the token's own expiry has passed (unknown expiry counts as valid)
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Database row for a session
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: i64,
    user_id: String,
    email: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    last_verified: Option<DateTime<Utc>>,
    is_active: i32,
}

impl From<SessionRow> for StoredSession {
    fn from(row: SessionRow) -> Self {
        StoredSession {
            id: row.id,
            user_id: row.user_id,
            email: row.email,
            expires_at: row.expires_at,
            last_verified: row.last_verified,
            is_active: row.is_active != 0,
        }
    }
}

/// Seal `access_token` for `user_id` and make it the active session.
///
/// Signing in again as the same user replaces the stored token. The
/// deactivation and the upsert commit together.
pub async fn save_session(
    pool: &SqlitePool,
    encryptor: &SessionEncryptor,
    user_id: &str,
    email: Option<&str>,
    access_token: &str,
    expires_at: Option<DateTime<Utc>>,
) -> Result<i64> {
    let sealed = encryptor.seal(user_id, access_token)?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    sqlx::query("UPDATE sessions SET is_active = 0")
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO sessions (user_id, email, token_encrypted, iv, expires_at, last_verified, is_active)
        VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP, 1)
        ON CONFLICT(user_id) DO UPDATE SET
            email = excluded.email,
            token_encrypted = excluded.token_encrypted,
            iv = excluded.iv,
            expires_at = excluded.expires_at,
            last_verified = CURRENT_TIMESTAMP,
            is_active = 1
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(email)
    .bind(&sealed.ciphertext)
    .bind(&sealed.nonce[..])
    .bind(expires_at)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    tx.commit()
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(id)
}

/// Get the currently active session
pub async fn get_active_session(pool: &SqlitePool) -> Result<Option<StoredSession>> {
    let row: Option<SessionRow> = sqlx::query_as(
        r#"
        SELECT id, user_id, email, expires_at, last_verified, is_active
        FROM sessions
        WHERE is_active = 1
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(row.map(StoredSession::from))
}

/// Open the access token stored on session row `id`.
///
/// The token only opens for the user id on that same row; a blob copied
/// from another row gives `EncryptionError`.
pub async fn get_session_token(
    pool: &SqlitePool,
    encryptor: &SessionEncryptor,
    id: i64,
) -> Result<Option<String>> {
    let row: Option<(String, Vec<u8>, Vec<u8>)> = sqlx::query_as(
        r#"
        SELECT user_id, token_encrypted, iv
        FROM sessions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    let Some((user_id, ciphertext, nonce)) = row else {
        return Ok(None);
    };
    let sealed = SealedToken::from_columns(ciphertext, &nonce)?;
    encryptor.open(&user_id, &sealed).map(Some)
}

/// Update the last_verified timestamp for a session
pub async fn update_last_verified(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE sessions
        SET last_verified = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(())
}

/// Delete one session
pub async fn delete_session(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(())
}

/// Forget every stored session (logout)
pub async fn clear_sessions(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions")
        .execute(pool)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.rows_affected())
}
