use axum::{
    extract::{Extension, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::{
    actions::{
        tasks::{
            create_task_action, delete_task_action, update_task_action, update_task_status_action,
            NewTaskForm, TaskForm, TaskStatusForm,
        },
        ActionForm, Deleted, Envelope,
    },
    errors::{AppError, AppResult},
    middleware::auth_guard::AuthUser,
    models::{DeletionImpact, Task},
    services::tasks,
    state::AppState,
};

#[derive(Deserialize)]
struct TaskFilter {
    region_id: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks",                      get(list_tasks))
        .route("/tasks/{id}",                 get(get_task))
        .route("/tasks/{id}/deletion-impact", get(deletion_impact))
}

pub fn action_router() -> Router<AppState> {
    Router::new()
        .route("/actions/tasks",             post(create_task))
        .route("/actions/tasks/{id}",        post(update_task))
        .route("/actions/tasks/{id}/status", post(update_task_status))
        .route("/actions/tasks/{id}/delete", post(delete_task))
}

// ── Reads ────────────────────────────────────────────────────

async fn list_tasks(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> AppResult<Json<Vec<Task>>> {
    let region_id = filter.region_id.as_deref().filter(|id| !id.is_empty());
    Ok(Json(tasks::get_tasks_for_region(&state.pool, region_id, &auth.user_id).await?))
}

async fn get_task(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Task>> {
    let task = tasks::get_task_by_id(&state.pool, &id, &auth.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(task))
}

async fn deletion_impact(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DeletionImpact>> {
    let impact = tasks::task_deletion_impact(&state.pool, &id, &auth.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(impact))
}

// ── Actions ──────────────────────────────────────────────────

async fn create_task(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    ActionForm(form): ActionForm<NewTaskForm>,
) -> Envelope<Task> {
    let session = auth.as_ref().map(|Extension(user)| user);
    Envelope(create_task_action(&state, session, form).await)
}

async fn update_task(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<String>,
    ActionForm(form): ActionForm<TaskForm>,
) -> Envelope<Task> {
    let session = auth.as_ref().map(|Extension(user)| user);
    Envelope(update_task_action(&state, session, &id, form).await)
}

async fn update_task_status(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<String>,
    ActionForm(form): ActionForm<TaskStatusForm>,
) -> Envelope<Task> {
    let session = auth.as_ref().map(|Extension(user)| user);
    Envelope(update_task_status_action(&state, session, &id, form).await)
}

async fn delete_task(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<String>,
) -> Envelope<Deleted> {
    let session = auth.as_ref().map(|Extension(user)| user);
    Envelope(delete_task_action(&state, session, &id).await)
}
