use axum::{
    extract::{Extension, State},
    routing::{get, post},
    Json, Router,
};

use crate::{
    actions::{
        preferences::{update_preferences_action, PreferencesForm},
        ActionForm, Envelope,
    },
    errors::AppResult,
    middleware::auth_guard::AuthUser,
    models::UserPreferences,
    services::preferences,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/preferences", get(get_preferences))
}

pub fn action_router() -> Router<AppState> {
    Router::new().route("/actions/preferences", post(update_preferences))
}

/// Created with defaults on first read.
async fn get_preferences(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
) -> AppResult<Json<UserPreferences>> {
    let prefs = preferences::get_user_preferences(&state.pool, &auth.user_id).await?;
    Ok(Json(prefs))
}

async fn update_preferences(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    ActionForm(form): ActionForm<PreferencesForm>,
) -> Envelope<UserPreferences> {
    let session = auth.as_ref().map(|Extension(user)| user);
    Envelope(update_preferences_action(&state, session, form).await)
}
