//! Cookie-backed sessions.

use chrono::{DateTime, Duration, Utc};
use tower_cookies::{
    cookie::{time::Duration as CookieDuration, SameSite},
    Cookie, Cookies,
};
use uuid::Uuid;

use super::generate_token;
use crate::{db::Db, middleware::auth_guard::AuthUser};

pub const SESSION_COOKIE: &str = "session";

pub async fn create_session(pool: &Db, user_id: &str, days: i64) -> sqlx::Result<String> {
    let token = generate_token();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO sessions (id, session_token, user_id, expires, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&token)
    .bind(user_id)
    .bind(now + Duration::days(days))
    .bind(now)
    .execute(pool)
    .await?;

    Ok(token)
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    user_id: String,
    email:   Option<String>,
    expires: DateTime<Utc>,
}

/// Resolve a session token to its user, ignoring expired sessions.
pub async fn find_session_user(pool: &Db, token: &str) -> sqlx::Result<Option<AuthUser>> {
    let row = sqlx::query_as::<_, SessionRow>(
        "SELECT s.user_id, u.email, s.expires
         FROM sessions s
         JOIN users u ON u.id = s.user_id
         WHERE s.session_token = ?
         LIMIT 1",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row
        .filter(|r| r.expires > Utc::now())
        .map(|r| AuthUser { user_id: r.user_id, email: r.email }))
}

pub async fn delete_session(pool: &Db, token: &str) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM sessions WHERE session_token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

pub fn session_token(cookies: &Cookies) -> Option<String> {
    cookies.get(SESSION_COOKIE).map(|c| c.value().to_owned())
}

pub fn set_session_cookie(cookies: &Cookies, token: &str, days: i64, secure: bool) {
    let cookie = Cookie::build((SESSION_COOKIE, token.to_owned()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .path("/")
        .max_age(CookieDuration::days(days))
        .build();
    cookies.add(cookie);
}

pub fn clear_session_cookie(cookies: &Cookies) {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .path("/")
        .max_age(CookieDuration::ZERO)
        .build();
    cookies.add(cookie);
}
