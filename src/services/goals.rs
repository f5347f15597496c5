use chrono::Utc;

use super::{new_id, ServiceResult};
use crate::{
    db::Db,
    models::{DeletionImpact, Goal},
};

#[derive(Debug, Clone)]
pub struct NewGoal {
    pub title:       String,
    pub description: Option<String>,
}

pub type GoalUpdate = NewGoal;

const GOAL_COLUMNS: &str = "g.id, g.user_id, g.title, g.description, g.created_at, g.updated_at";

/// All goals of the user, newest first.
pub async fn get_goals_for_user(pool: &Db, user_id: &str) -> ServiceResult<Vec<Goal>> {
    let goals = sqlx::query_as::<_, Goal>(&format!(
        "SELECT {GOAL_COLUMNS} FROM goals g
         WHERE g.user_id = ?
         ORDER BY g.created_at DESC, g.rowid DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(goals)
}

pub async fn get_goal_by_id(pool: &Db, id: &str, user_id: &str) -> ServiceResult<Option<Goal>> {
    let goal = sqlx::query_as::<_, Goal>(&format!(
        "SELECT {GOAL_COLUMNS} FROM goals g WHERE g.id = ? AND g.user_id = ?"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(goal)
}

pub async fn create_goal(pool: &Db, user_id: &str, data: &NewGoal) -> ServiceResult<Goal> {
    let now = Utc::now();
    let goal = Goal {
        id:          new_id(),
        user_id:     user_id.to_owned(),
        title:       data.title.clone(),
        description: data.description.clone(),
        created_at:  now,
        updated_at:  now,
    };

    sqlx::query(
        "INSERT INTO goals (id, user_id, title, description, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&goal.id)
    .bind(&goal.user_id)
    .bind(&goal.title)
    .bind(&goal.description)
    .bind(goal.created_at)
    .bind(goal.updated_at)
    .execute(pool)
    .await?;

    tracing::debug!(goal_id = %goal.id, user_id, "Created goal");
    Ok(goal)
}

/// Update an owned goal. `None` when the goal is missing or belongs to someone else.
pub async fn update_goal(
    pool: &Db,
    id: &str,
    user_id: &str,
    data: &GoalUpdate,
) -> ServiceResult<Option<Goal>> {
    let goal = sqlx::query_as::<_, Goal>(
        "UPDATE goals SET title = ?, description = ?, updated_at = ?
         WHERE id = ? AND user_id = ?
         RETURNING id, user_id, title, description, created_at, updated_at",
    )
    .bind(&data.title)
    .bind(&data.description)
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(goal)
}

/// Delete an owned goal together with its regions, tasks and weekly tasks.
pub async fn delete_goal(pool: &Db, id: &str, user_id: &str) -> ServiceResult<bool> {
    let deleted = sqlx::query("DELETE FROM goals WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Ok(false);
    }

    tracing::debug!(goal_id = id, user_id, "Deleted goal");
    Ok(true)
}

/// Descendant counts shown before a goal is deleted.
pub async fn goal_deletion_impact(
    pool: &Db,
    id: &str,
    user_id: &str,
) -> ServiceResult<Option<DeletionImpact>> {
    let impact = sqlx::query_as::<_, DeletionImpact>(
        "SELECT
            (SELECT COUNT(*) FROM regions r WHERE r.goal_id = g.id) AS regions,
            (SELECT COUNT(*) FROM tasks t
               JOIN regions r ON r.id = t.region_id
              WHERE r.goal_id = g.id) AS tasks,
            (SELECT COUNT(*) FROM weekly_tasks wt
               JOIN tasks t   ON t.id = wt.task_id
               JOIN regions r ON r.id = t.region_id
              WHERE r.goal_id = g.id) AS weekly_tasks
         FROM goals g
         WHERE g.id = ? AND g.user_id = ?",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(impact)
}
