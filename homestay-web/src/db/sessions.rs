//! Login sessions
//!
//! A session row exists only for an authenticated browser. `expires_at` is
//! stored as an RFC 3339 UTC string so it compares lexicographically.

use chrono::{Duration, SecondsFormat, Utc};
use homestay_common::Result;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use super::users::{user_from_row, User};

fn timestamp_after(hours: i64) -> String {
    (Utc::now() + Duration::hours(hours)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Open a session for a user and return its token
pub async fn create_session(pool: &SqlitePool, user_guid: Uuid, ttl_hours: i64) -> Result<String> {
    let token = Uuid::new_v4().simple().to_string();

    sqlx::query("INSERT INTO sessions (token, user_guid, expires_at) VALUES (?, ?, ?)")
        .bind(&token)
        .bind(user_guid.to_string())
        .bind(timestamp_after(ttl_hours))
        .execute(pool)
        .await?;

    Ok(token)
}

/// Resolve a token to its user, ignoring expired sessions
pub async fn load_session_user(pool: &SqlitePool, token: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT u.guid, u.email, u.first_name, u.last_name, u.user_type
        FROM sessions s
        JOIN users u ON u.guid = s.user_guid
        WHERE s.token = ? AND s.expires_at > ?
        "#,
    )
    .bind(token)
    .bind(now())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(user_from_row).transpose()
}

pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Remove expired sessions; returns how many were removed
pub async fn purge_expired_sessions(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(now())
        .execute(pool)
        .await?;

    let removed = result.rows_affected();
    if removed > 0 {
        info!(removed, "Purged expired sessions");
    }
    Ok(removed)
}
