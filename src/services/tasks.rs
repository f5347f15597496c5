use chrono::{NaiveDate, Utc};

use super::{new_id, ServiceResult, USER_REGION_IDS, USER_TASK_IDS};
use crate::{
    db::Db,
    models::{DeletionImpact, Task, TaskStatus},
};

#[derive(Debug, Clone)]
pub struct NewTask {
    pub region_id:   String,
    pub title:       String,
    pub description: Option<String>,
    pub deadline:    NaiveDate,
    pub status:      TaskStatus,
}

/// Replacement values for a task. `status: None` keeps the current status.
#[derive(Debug, Clone)]
pub struct TaskUpdate {
    pub title:       String,
    pub description: Option<String>,
    pub deadline:    NaiveDate,
    pub status:      Option<TaskStatus>,
}

const TASK_COLUMNS: &str =
    "t.id, t.region_id, t.title, t.description, t.deadline, t.status, t.created_at, t.updated_at";

const RETURNING_TASK: &str =
    "RETURNING id, region_id, title, description, deadline, status, created_at, updated_at";

const OWNED_TASK: &str = "FROM tasks t
         JOIN regions r ON r.id = t.region_id
         JOIN goals g   ON g.id = r.goal_id";

/// Tasks of one region, or of every region the user owns when `region_id` is `None`.
pub async fn get_tasks_for_region(
    pool: &Db,
    region_id: Option<&str>,
    user_id: &str,
) -> ServiceResult<Vec<Task>> {
    let tasks = sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} {OWNED_TASK}
         WHERE g.user_id = ?1 AND (?2 IS NULL OR t.region_id = ?2)
         ORDER BY t.created_at DESC, t.rowid DESC"
    ))
    .bind(user_id)
    .bind(region_id)
    .fetch_all(pool)
    .await?;
    Ok(tasks)
}

pub async fn get_task_by_id(pool: &Db, id: &str, user_id: &str) -> ServiceResult<Option<Task>> {
    let task = sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} {OWNED_TASK} WHERE t.id = ? AND g.user_id = ?"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(task)
}

/// Create a task under an owned region. `None` if the region is not the user's.
pub async fn create_task(pool: &Db, user_id: &str, data: &NewTask) -> ServiceResult<Option<Task>> {
    let now = Utc::now();
    let task = Task {
        id:          new_id(),
        region_id:   data.region_id.clone(),
        title:       data.title.clone(),
        description: data.description.clone(),
        deadline:    data.deadline,
        status:      data.status,
        created_at:  now,
        updated_at:  now,
    };

    let inserted = sqlx::query(&format!(
        "INSERT INTO tasks (id, region_id, title, description, deadline, status, created_at, updated_at)
         SELECT ?, ?, ?, ?, ?, ?, ?, ?
         WHERE ? IN ({USER_REGION_IDS})"
    ))
    .bind(&task.id)
    .bind(&task.region_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.deadline)
    .bind(task.status)
    .bind(task.created_at)
    .bind(task.updated_at)
    .bind(&task.region_id)
    .bind(user_id)
    .execute(pool)
    .await?
    .rows_affected();

    if inserted == 0 {
        tracing::debug!(region_id = %data.region_id, user_id, "Refused task for foreign region");
        return Ok(None);
    }
    Ok(Some(task))
}

pub async fn update_task(
    pool: &Db,
    id: &str,
    user_id: &str,
    data: &TaskUpdate,
) -> ServiceResult<Option<Task>> {
    let task = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks
         SET title = ?, description = ?, deadline = ?, status = COALESCE(?, status), updated_at = ?
         WHERE id = ? AND region_id IN ({USER_REGION_IDS})
         {RETURNING_TASK}"
    ))
    .bind(&data.title)
    .bind(&data.description)
    .bind(data.deadline)
    .bind(data.status)
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(task)
}

/// Move a task to any status; transitions are unrestricted.
pub async fn update_task_status(
    pool: &Db,
    id: &str,
    user_id: &str,
    status: TaskStatus,
) -> ServiceResult<Option<Task>> {
    let task = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks SET status = ?, updated_at = ?
         WHERE id = ? AND region_id IN ({USER_REGION_IDS})
         {RETURNING_TASK}"
    ))
    .bind(status)
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(task)
}

pub async fn delete_task(pool: &Db, id: &str, user_id: &str) -> ServiceResult<bool> {
    let deleted = sqlx::query(&format!(
        "DELETE FROM tasks WHERE id = ? AND id IN ({USER_TASK_IDS})"
    ))
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(deleted > 0)
}

pub async fn task_deletion_impact(
    pool: &Db,
    id: &str,
    user_id: &str,
) -> ServiceResult<Option<DeletionImpact>> {
    let impact = sqlx::query_as::<_, DeletionImpact>(&format!(
        "SELECT
            0 AS regions,
            0 AS tasks,
            (SELECT COUNT(*) FROM weekly_tasks wt WHERE wt.task_id = t.id) AS weekly_tasks
         {OWNED_TASK}
         WHERE t.id = ? AND g.user_id = ?"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(impact)
}
