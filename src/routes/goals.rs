use axum::{
    extract::{Extension, Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::{
    actions::{
        goals::{create_goal_action, delete_goal_action, update_goal_action, GoalForm},
        ActionForm, Deleted, Envelope,
    },
    errors::{AppError, AppResult},
    middleware::auth_guard::AuthUser,
    models::{DeletionImpact, Goal},
    services::goals,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/goals",                      get(list_goals))
        .route("/goals/{id}",                 get(get_goal))
        .route("/goals/{id}/deletion-impact", get(deletion_impact))
}

pub fn action_router() -> Router<AppState> {
    Router::new()
        .route("/actions/goals",             post(create_goal))
        .route("/actions/goals/{id}",        post(update_goal))
        .route("/actions/goals/{id}/delete", post(delete_goal))
}

// ── Reads ────────────────────────────────────────────────────

async fn list_goals(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Goal>>> {
    Ok(Json(goals::get_goals_for_user(&state.pool, &auth.user_id).await?))
}

async fn get_goal(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Goal>> {
    let goal = goals::get_goal_by_id(&state.pool, &id, &auth.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(goal))
}

async fn deletion_impact(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DeletionImpact>> {
    let impact = goals::goal_deletion_impact(&state.pool, &id, &auth.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(impact))
}

// ── Actions ──────────────────────────────────────────────────

async fn create_goal(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    ActionForm(form): ActionForm<GoalForm>,
) -> Envelope<Goal> {
    let session = auth.as_ref().map(|Extension(user)| user);
    Envelope(create_goal_action(&state, session, form).await)
}

async fn update_goal(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<String>,
    ActionForm(form): ActionForm<GoalForm>,
) -> Envelope<Goal> {
    let session = auth.as_ref().map(|Extension(user)| user);
    Envelope(update_goal_action(&state, session, &id, form).await)
}

async fn delete_goal(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<String>,
) -> Envelope<Deleted> {
    let session = auth.as_ref().map(|Extension(user)| user);
    Envelope(delete_goal_action(&state, session, &id).await)
}
