//! `/users/me`: the signed-in user's profile and data export.
//!
//! `GET  /users/me`  profile
//! `GET  /users/me/export`  everything the user owns, as one JSON document
//! `POST /actions/users/name`  set or clear the display name
//! `POST /actions/users/delete-account`  delete the account and end the session

use axum::{
    extract::{Extension, State},
    routing::{get, post},
    Json, Router,
};
use tower_cookies::Cookies;

use crate::{
    actions::{
        users::{delete_account_action, update_user_name_action, UserNameForm},
        ActionForm, Deleted, Envelope,
    },
    auth::session::clear_session_cookie,
    errors::{AppError, AppResult},
    middleware::auth_guard::AuthUser,
    models::User,
    services::users::{self, UserExport},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/me",        get(get_me))
        .route("/users/me/export", get(export_me))
}

pub fn action_router() -> Router<AppState> {
    Router::new()
        .route("/actions/users/name",           post(update_name))
        .route("/actions/users/delete-account", post(delete_account))
}

// ── Handlers ─────────────────────────────────────────────────

async fn get_me(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
) -> AppResult<Json<User>> {
    let user = users::get_user_by_id(&state.pool, &auth.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(user))
}

/// Data portability export.
async fn export_me(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
) -> AppResult<Json<UserExport>> {
    let export = users::export_user_data(&state.pool, &auth.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!(user_id = %auth.user_id, "User data exported");
    Ok(Json(export))
}

async fn update_name(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    ActionForm(form): ActionForm<UserNameForm>,
) -> Envelope<User> {
    let session = auth.as_ref().map(|Extension(user)| user);
    Envelope(update_user_name_action(&state, session, form).await)
}

async fn delete_account(
    State(state): State<AppState>,
    cookies: Cookies,
    auth: Option<Extension<AuthUser>>,
) -> Envelope<Deleted> {
    let session = auth.as_ref().map(|Extension(user)| user);
    let result = delete_account_action(&state, session).await;
    if result.is_ok() {
        clear_session_cookie(&cookies);
    }
    Envelope(result)
}
