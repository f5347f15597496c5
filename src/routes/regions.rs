use axum::{
    extract::{Extension, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::{
    actions::{
        regions::{create_region_action, delete_region_action, update_region_action, NewRegionForm, RegionForm},
        ActionForm, Deleted, Envelope,
    },
    errors::{AppError, AppResult},
    middleware::auth_guard::AuthUser,
    models::{DeletionImpact, Region},
    services::regions,
    state::AppState,
};

#[derive(Deserialize)]
struct RegionFilter {
    goal_id: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/regions",                      get(list_regions))
        .route("/regions/{id}",                 get(get_region))
        .route("/regions/{id}/deletion-impact", get(deletion_impact))
}

pub fn action_router() -> Router<AppState> {
    Router::new()
        .route("/actions/regions",             post(create_region))
        .route("/actions/regions/{id}",        post(update_region))
        .route("/actions/regions/{id}/delete", post(delete_region))
}

// ── Reads ────────────────────────────────────────────────────

/// Regions of one goal (`?goal_id=`), or all of the user's regions.
async fn list_regions(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
    Query(filter): Query<RegionFilter>,
) -> AppResult<Json<Vec<Region>>> {
    let goal_id = filter.goal_id.as_deref().filter(|id| !id.is_empty());
    Ok(Json(regions::get_regions_for_goal(&state.pool, goal_id, &auth.user_id).await?))
}

async fn get_region(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Region>> {
    let region = regions::get_region_by_id(&state.pool, &id, &auth.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(region))
}

async fn deletion_impact(
    Extension(auth): Extension<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DeletionImpact>> {
    let impact = regions::region_deletion_impact(&state.pool, &id, &auth.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(impact))
}

// ── Actions ──────────────────────────────────────────────────

async fn create_region(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    ActionForm(form): ActionForm<NewRegionForm>,
) -> Envelope<Region> {
    let session = auth.as_ref().map(|Extension(user)| user);
    Envelope(create_region_action(&state, session, form).await)
}

async fn update_region(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<String>,
    ActionForm(form): ActionForm<RegionForm>,
) -> Envelope<Region> {
    let session = auth.as_ref().map(|Extension(user)| user);
    Envelope(update_region_action(&state, session, &id, form).await)
}

async fn delete_region(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<String>,
) -> Envelope<Deleted> {
    let session = auth.as_ref().map(|Extension(user)| user);
    Envelope(delete_region_action(&state, session, &id).await)
}
