use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_cookies::Cookies;
use validator::Validate;

use crate::{
    auth::{
        email::send_magic_link_email,
        magic_link::{consume_sign_in_token, issue_sign_in_token},
        normalize_email,
        session::{clear_session_cookie, create_session, delete_session, session_token, set_session_cookie},
    },
    errors::{AppError, AppResult},
    middleware::auth_guard::AuthUser,
    services::users,
    state::AppState,
};

// ── Request types ─────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct SignInForm {
    #[validate(email)]
    email: String,
}

#[derive(Deserialize)]
struct CallbackQuery {
    token: String,
    email: String,
}

// ── Router ────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/sign-in",  post(sign_in))
        .route("/auth/callback", get(callback))
        .route("/auth/sign-out", post(sign_out))
        .route("/auth/session",  get(session))
}

// ── Handlers ──────────────────────────────────────────────────

/// POST /auth/sign-in: email a single-use sign-in link.
async fn sign_in(
    State(state): State<AppState>,
    Form(mut form): Form<SignInForm>,
) -> AppResult<impl IntoResponse> {
    form.email = normalize_email(&form.email);
    form.validate()
        .map_err(|_| AppError::BadRequest("A valid email address is required".into()))?;

    let token = issue_sign_in_token(&state.pool, &form.email, state.config.magic_link_minutes).await?;

    // Same answer whether or not delivery worked.
    if let Err(err) = send_magic_link_email(&state.config, &form.email, &token).await {
        tracing::warn!(error = %err, "Failed to send sign-in link");
    }

    Ok(Json(json!({ "message": "Check your email for a sign-in link." })))
}

/// GET /auth/callback: consume the link, create the account on first use, start a session.
async fn callback(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(query): Query<CallbackQuery>,
) -> AppResult<impl IntoResponse> {
    let pool = &state.pool;
    let email = normalize_email(&query.email);

    if !consume_sign_in_token(pool, &email, &query.token).await? {
        return Err(AppError::BadRequest("Invalid or expired sign-in link".into()));
    }

    let user = match users::get_user_by_email(pool, &email).await? {
        Some(user) => {
            users::mark_email_verified(pool, &user.id).await?;
            user
        }
        None => users::create_user(pool, &email).await?,
    };

    let token = create_session(pool, &user.id, state.config.session_days).await?;
    set_session_cookie(&cookies, &token, state.config.session_days, !state.config.is_development());

    tracing::info!(user_id = %user.id, "Signed in");
    Ok(Redirect::to("/"))
}

/// POST /auth/sign-out: end the current session.
async fn sign_out(State(state): State<AppState>, cookies: Cookies) -> AppResult<impl IntoResponse> {
    if let Some(token) = session_token(&cookies) {
        delete_session(&state.pool, &token).await?;
    }
    clear_session_cookie(&cookies);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/session: the signed-in user, or `null`.
async fn session(user: Option<Extension<AuthUser>>) -> impl IntoResponse {
    Json(json!({ "user": user.map(|Extension(user)| user) }))
}
