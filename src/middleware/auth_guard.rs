//! Session middleware.
//!
//! `resolve_session` runs on every API request: it reads the `session` cookie,
//! validates it against `sessions`, and injects an `AuthUser` extension when
//! the session is live. It never rejects; actions answer a missing session
//! with their own `UNAUTHORIZED` envelope. `require_auth` guards the read
//! routes and turns a missing `AuthUser` into a 401.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use tower_cookies::Cookies;

use crate::{
    auth::session::{find_session_user, session_token},
    errors::AppError,
    state::AppState,
};

/// Authenticated caller, resolved from a live session.
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub user_id: String,
    pub email:   Option<String>,
}

pub async fn resolve_session(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(token) = session_token(&cookies) {
        match find_session_user(&state.pool, &token).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(user);
            }
            Ok(None) => {}
            Err(err) => {
                tracing::error!(error = %err, "Session lookup failed");
            }
        }
    }

    next.run(req).await
}

/// Middleware: require a resolved session.
pub async fn require_auth(req: Request, next: Next) -> Result<Response, AppError> {
    if req.extensions().get::<AuthUser>().is_none() {
        return Err(AppError::Unauthorized);
    }
    Ok(next.run(req).await)
}
