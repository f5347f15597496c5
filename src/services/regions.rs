use chrono::Utc;

use super::{new_id, ServiceResult, USER_GOAL_IDS, USER_REGION_IDS};
use crate::{
    db::Db,
    models::{DeletionImpact, Region},
};

#[derive(Debug, Clone)]
pub struct NewRegion {
    pub goal_id:     String,
    pub title:       String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RegionUpdate {
    pub title:       String,
    pub description: Option<String>,
}

const REGION_COLUMNS: &str = "r.id, r.goal_id, r.title, r.description, r.created_at, r.updated_at";

const RETURNING_REGION: &str = "RETURNING id, goal_id, title, description, created_at, updated_at";

/// Regions of one goal, or of every goal the user owns when `goal_id` is `None`.
pub async fn get_regions_for_goal(
    pool: &Db,
    goal_id: Option<&str>,
    user_id: &str,
) -> ServiceResult<Vec<Region>> {
    let regions = sqlx::query_as::<_, Region>(&format!(
        "SELECT {REGION_COLUMNS}
         FROM regions r
         JOIN goals g ON g.id = r.goal_id
         WHERE g.user_id = ?1 AND (?2 IS NULL OR r.goal_id = ?2)
         ORDER BY r.created_at DESC, r.rowid DESC"
    ))
    .bind(user_id)
    .bind(goal_id)
    .fetch_all(pool)
    .await?;
    Ok(regions)
}

pub async fn get_region_by_id(pool: &Db, id: &str, user_id: &str) -> ServiceResult<Option<Region>> {
    let region = sqlx::query_as::<_, Region>(&format!(
        "SELECT {REGION_COLUMNS}
         FROM regions r
         JOIN goals g ON g.id = r.goal_id
         WHERE r.id = ? AND g.user_id = ?"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(region)
}

/// Create a region under an owned goal. `None` if the goal is not the user's.
pub async fn create_region(pool: &Db, user_id: &str, data: &NewRegion) -> ServiceResult<Option<Region>> {
    let now = Utc::now();
    let region = Region {
        id:          new_id(),
        goal_id:     data.goal_id.clone(),
        title:       data.title.clone(),
        description: data.description.clone(),
        created_at:  now,
        updated_at:  now,
    };

    let inserted = sqlx::query(&format!(
        "INSERT INTO regions (id, goal_id, title, description, created_at, updated_at)
         SELECT ?, ?, ?, ?, ?, ?
         WHERE ? IN ({USER_GOAL_IDS})"
    ))
    .bind(&region.id)
    .bind(&region.goal_id)
    .bind(&region.title)
    .bind(&region.description)
    .bind(region.created_at)
    .bind(region.updated_at)
    .bind(&region.goal_id)
    .bind(user_id)
    .execute(pool)
    .await?
    .rows_affected();

    if inserted == 0 {
        tracing::debug!(goal_id = %data.goal_id, user_id, "Refused region for foreign goal");
        return Ok(None);
    }
    Ok(Some(region))
}

pub async fn update_region(
    pool: &Db,
    id: &str,
    user_id: &str,
    data: &RegionUpdate,
) -> ServiceResult<Option<Region>> {
    let region = sqlx::query_as::<_, Region>(&format!(
        "UPDATE regions SET title = ?, description = ?, updated_at = ?
         WHERE id = ? AND goal_id IN ({USER_GOAL_IDS})
         {RETURNING_REGION}"
    ))
    .bind(&data.title)
    .bind(&data.description)
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(region)
}

pub async fn delete_region(pool: &Db, id: &str, user_id: &str) -> ServiceResult<bool> {
    let deleted = sqlx::query(&format!(
        "DELETE FROM regions WHERE id = ? AND id IN ({USER_REGION_IDS})"
    ))
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(deleted > 0)
}

pub async fn region_deletion_impact(
    pool: &Db,
    id: &str,
    user_id: &str,
) -> ServiceResult<Option<DeletionImpact>> {
    let impact = sqlx::query_as::<_, DeletionImpact>(
        "SELECT
            0 AS regions,
            (SELECT COUNT(*) FROM tasks t WHERE t.region_id = r.id) AS tasks,
            (SELECT COUNT(*) FROM weekly_tasks wt
               JOIN tasks t ON t.id = wt.task_id
              WHERE t.region_id = r.id) AS weekly_tasks
         FROM regions r
         JOIN goals g ON g.id = r.goal_id
         WHERE r.id = ? AND g.user_id = ?",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(impact)
}
