use axum::{
    extract::{Extension, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    actions::{
        weekly_tasks::{
            create_weekly_task_action, delete_weekly_task_action, update_weekly_task_action,
            update_weekly_task_status_action, NewWeeklyTaskForm, WeeklyTaskForm, WeeklyTaskStatusForm,
        },
        ActionForm, Deleted, Envelope,
    },
    errors::{AppError, AppResult},
    middleware::auth_guard::AuthUser,
    models::WeeklyTask,
    services::weekly_tasks,
    state::AppState,
    week::{parse_day, WeekStart},
};

#[derive(Deserialize)]
struct WeeklyFilter {
    task_id: Option<String>,
    /// Any day inside the wanted week; defaults to the current week.
    week:    Option<String>,
}

/// One week of weekly tasks plus the neighbouring weeks for navigation.
#[derive(Serialize)]
struct WeekView {
    week_start:    WeekStart,
    previous_week: WeekStart,
    next_week:     WeekStart,
    weekly_tasks:  Vec<WeeklyTask>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/weekly-tasks",      get(list_weekly_tasks))
        .route("/weekly-tasks/{id}", get(get_weekly_task))
}

pub fn action_router() -> Router<AppState> {
    Router::new()
        .route("/actions/weekly-tasks",             post(create_weekly_task))
        .route("/actions/weekly-tasks/{id}",        post(update_weekly_task))
        .route("/actions/weekly-tasks/{id}/status", post(update_weekly_task_status))
        .route("/actions/weekly-tasks/{id}/delete", post(delete_weekly_task))
}

// ── Reads ────────────────────────────────────────────────────

async fn list_weekly_tasks(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
    Query(filter): Query<WeeklyFilter>,
) -> AppResult<Json<WeekView>> {
    let week = match filter.week.as_deref().filter(|w| !w.trim().is_empty()) {
        Some(raw) => parse_day(raw)
            .map(WeekStart::containing)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid week '{raw}'")))?,
        None => WeekStart::current(),
    };
    let task_id = filter.task_id.as_deref().filter(|id| !id.is_empty());

    let rows = weekly_tasks::get_weekly_tasks_for_task(&state.pool, task_id, &auth.user_id, Some(week)).await?;

    Ok(Json(WeekView {
        week_start:    week,
        previous_week: week.previous(),
        next_week:     week.next(),
        weekly_tasks:  rows,
    }))
}

async fn get_weekly_task(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<WeeklyTask>> {
    let weekly = weekly_tasks::get_weekly_task_by_id(&state.pool, &id, &auth.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(weekly))
}

// ── Actions ──────────────────────────────────────────────────

async fn create_weekly_task(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    ActionForm(form): ActionForm<NewWeeklyTaskForm>,
) -> Envelope<WeeklyTask> {
    let session = auth.as_ref().map(|Extension(user)| user);
    Envelope(create_weekly_task_action(&state, session, form).await)
}

async fn update_weekly_task(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<String>,
    ActionForm(form): ActionForm<WeeklyTaskForm>,
) -> Envelope<WeeklyTask> {
    let session = auth.as_ref().map(|Extension(user)| user);
    Envelope(update_weekly_task_action(&state, session, &id, form).await)
}

async fn update_weekly_task_status(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<String>,
    ActionForm(form): ActionForm<WeeklyTaskStatusForm>,
) -> Envelope<WeeklyTask> {
    let session = auth.as_ref().map(|Extension(user)| user);
    Envelope(update_weekly_task_status_action(&state, session, &id, form).await)
}

async fn delete_weekly_task(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<String>,
) -> Envelope<Deleted> {
    let session = auth.as_ref().map(|Extension(user)| user);
    Envelope(delete_weekly_task_action(&state, session, &id).await)
}
