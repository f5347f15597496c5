//! Single-use sign-in tokens sent by email.

use chrono::{DateTime, Duration, Utc};

use super::{generate_token, hash_token};
use crate::db::Db;

/// Issue a fresh token for `email`, replacing any earlier unused ones.
///
/// Returns the plain token for the email link; only its hash is stored.
pub async fn issue_sign_in_token(pool: &Db, email: &str, minutes: i64) -> sqlx::Result<String> {
    sqlx::query("DELETE FROM verification_tokens WHERE identifier = ?")
        .bind(email)
        .execute(pool)
        .await?;

    let token = generate_token();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO verification_tokens (identifier, token_hash, expires, created_at)
         VALUES (?, ?, ?, ?)",
    )
    .bind(email)
    .bind(hash_token(&token))
    .bind(now + Duration::minutes(minutes))
    .bind(now)
    .execute(pool)
    .await?;

    Ok(token)
}

/// Burn the token. `true` only if it existed for this email and had not expired.
///
/// The row is removed and read back in one statement, so of several
/// concurrent callers at most one sees it.
pub async fn consume_sign_in_token(pool: &Db, email: &str, token: &str) -> sqlx::Result<bool> {
    let expires: Option<DateTime<Utc>> = sqlx::query_scalar(
        "DELETE FROM verification_tokens WHERE identifier = ? AND token_hash = ?
         RETURNING expires",
    )
    .bind(email)
    .bind(hash_token(token))
    .fetch_optional(pool)
    .await?;

    Ok(expires.is_some_and(|expires| expires > Utc::now()))
}
