//! Weekly tasks: the per-week breakdown of a task.
//!
//! Rows are bucketed by [`WeekStart`]. Filtering compares the stored week
//! exactly, so callers normalize arbitrary dates through `WeekStart` first.

use chrono::Utc;

use super::{new_id, ServiceResult, USER_TASK_IDS};
use crate::{
    db::Db,
    models::{WeeklyTask, WeeklyTaskStatus},
    week::WeekStart,
};

#[derive(Debug, Clone)]
pub struct NewWeeklyTask {
    pub task_id:         String,
    pub title:           String,
    pub description:     Option<String>,
    pub priority:        i32,
    pub week_start_date: WeekStart,
    pub status:          WeeklyTaskStatus,
}

/// Replacement values. `status: None` keeps the current status.
#[derive(Debug, Clone)]
pub struct WeeklyTaskUpdate {
    pub title:           String,
    pub description:     Option<String>,
    pub priority:        i32,
    pub week_start_date: WeekStart,
    pub status:          Option<WeeklyTaskStatus>,
}

const WEEKLY_TASK_COLUMNS: &str = "wt.id, wt.task_id, wt.title, wt.description, wt.priority,
            wt.week_start_date, wt.status, wt.created_at, wt.updated_at";

const RETURNING_WEEKLY_TASK: &str = "RETURNING id, task_id, title, description, priority,
            week_start_date, status, created_at, updated_at";

const OWNED_WEEKLY_TASK: &str = "FROM weekly_tasks wt
         JOIN tasks t   ON t.id = wt.task_id
         JOIN regions r ON r.id = t.region_id
         JOIN goals g   ON g.id = r.goal_id";

/// Weekly tasks, optionally narrowed to one task and/or one week.
///
/// Ordered by priority (1 first), then oldest first within a priority.
pub async fn get_weekly_tasks_for_task(
    pool: &Db,
    task_id: Option<&str>,
    user_id: &str,
    week: Option<WeekStart>,
) -> ServiceResult<Vec<WeeklyTask>> {
    let rows = sqlx::query_as::<_, WeeklyTask>(&format!(
        "SELECT {WEEKLY_TASK_COLUMNS} {OWNED_WEEKLY_TASK}
         WHERE g.user_id = ?1
           AND (?2 IS NULL OR wt.task_id = ?2)
           AND (?3 IS NULL OR wt.week_start_date = ?3)
         ORDER BY wt.priority ASC, wt.created_at ASC, wt.rowid ASC"
    ))
    .bind(user_id)
    .bind(task_id)
    .bind(week)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_weekly_task_by_id(
    pool: &Db,
    id: &str,
    user_id: &str,
) -> ServiceResult<Option<WeeklyTask>> {
    let row = sqlx::query_as::<_, WeeklyTask>(&format!(
        "SELECT {WEEKLY_TASK_COLUMNS} {OWNED_WEEKLY_TASK} WHERE wt.id = ? AND g.user_id = ?"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Create a weekly task under an owned task. `None` if the task is not the user's.
pub async fn create_weekly_task(
    pool: &Db,
    user_id: &str,
    data: &NewWeeklyTask,
) -> ServiceResult<Option<WeeklyTask>> {
    let now = Utc::now();
    let weekly = WeeklyTask {
        id:              new_id(),
        task_id:         data.task_id.clone(),
        title:           data.title.clone(),
        description:     data.description.clone(),
        priority:        data.priority,
        week_start_date: data.week_start_date,
        status:          data.status,
        created_at:      now,
        updated_at:      now,
    };

    let inserted = sqlx::query(&format!(
        "INSERT INTO weekly_tasks
            (id, task_id, title, description, priority, week_start_date, status, created_at, updated_at)
         SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?
         WHERE ? IN ({USER_TASK_IDS})"
    ))
    .bind(&weekly.id)
    .bind(&weekly.task_id)
    .bind(&weekly.title)
    .bind(&weekly.description)
    .bind(weekly.priority)
    .bind(weekly.week_start_date)
    .bind(weekly.status)
    .bind(weekly.created_at)
    .bind(weekly.updated_at)
    .bind(&weekly.task_id)
    .bind(user_id)
    .execute(pool)
    .await?
    .rows_affected();

    if inserted == 0 {
        tracing::debug!(task_id = %data.task_id, user_id, "Refused weekly task for foreign task");
        return Ok(None);
    }
    Ok(Some(weekly))
}

pub async fn update_weekly_task(
    pool: &Db,
    id: &str,
    user_id: &str,
    data: &WeeklyTaskUpdate,
) -> ServiceResult<Option<WeeklyTask>> {
    let row = sqlx::query_as::<_, WeeklyTask>(&format!(
        "UPDATE weekly_tasks
         SET title = ?, description = ?, priority = ?, week_start_date = ?,
             status = COALESCE(?, status), updated_at = ?
         WHERE id = ? AND task_id IN ({USER_TASK_IDS})
         {RETURNING_WEEKLY_TASK}"
    ))
    .bind(&data.title)
    .bind(&data.description)
    .bind(data.priority)
    .bind(data.week_start_date)
    .bind(data.status)
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn update_weekly_task_status(
    pool: &Db,
    id: &str,
    user_id: &str,
    status: WeeklyTaskStatus,
) -> ServiceResult<Option<WeeklyTask>> {
    let row = sqlx::query_as::<_, WeeklyTask>(&format!(
        "UPDATE weekly_tasks SET status = ?, updated_at = ?
         WHERE id = ? AND task_id IN ({USER_TASK_IDS})
         {RETURNING_WEEKLY_TASK}"
    ))
    .bind(status)
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Delete an owned weekly task. Returns the parent task id, `None` if nothing was deleted.
pub async fn delete_weekly_task(pool: &Db, id: &str, user_id: &str) -> ServiceResult<Option<String>> {
    let task_id: Option<String> = sqlx::query_scalar(&format!(
        "DELETE FROM weekly_tasks WHERE id = ? AND task_id IN ({USER_TASK_IDS})
         RETURNING task_id"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(task_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;
    use crate::models::TaskStatus;
    use crate::services::goals::{create_goal, NewGoal};
    use crate::services::regions::{create_region, NewRegion};
    use crate::services::tasks::{create_task, NewTask};
    use crate::services::users::create_user;
    use chrono::{NaiveDate, TimeZone};

    async fn task_for(pool: &Db, user_id: &str) -> String {
        let goal = create_goal(pool, user_id, &NewGoal { title: "Goal".into(), description: None })
            .await
            .unwrap();
        let region = create_region(
            pool,
            user_id,
            &NewRegion { goal_id: goal.id, title: "Region".into(), description: None },
        )
        .await
        .unwrap()
        .unwrap();
        create_task(
            pool,
            user_id,
            &NewTask {
                region_id:   region.id,
                title:       "Task".into(),
                description: None,
                deadline:    NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
                status:      TaskStatus::Active,
            },
        )
        .await
        .unwrap()
        .unwrap()
        .id
    }

    fn weekly(task_id: &str, title: &str, priority: i32, week: WeekStart) -> NewWeeklyTask {
        NewWeeklyTask {
            task_id:         task_id.into(),
            title:           title.into(),
            description:     None,
            priority,
            week_start_date: week,
            status:          WeeklyTaskStatus::default(),
        }
    }

    fn week_of(y: i32, m: u32, d: u32) -> WeekStart {
        WeekStart::containing(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[tokio::test]
    async fn week_filter_matches_exact_sunday_only() {
        let pool = connect_in_memory().await;
        let user = create_user(&pool, "u@example.com").await.unwrap();
        let task_id = task_for(&pool, &user.id).await;

        let this_week = week_of(2026, 10, 21);
        create_weekly_task(&pool, &user.id, &weekly(&task_id, "This week", 2, this_week))
            .await
            .unwrap()
            .unwrap();
        create_weekly_task(&pool, &user.id, &weekly(&task_id, "Next week", 1, this_week.next()))
            .await
            .unwrap()
            .unwrap();

        let wednesday = Utc.with_ymd_and_hms(2026, 10, 21, 12, 0, 0).unwrap();
        let rows = get_weekly_tasks_for_task(&pool, Some(&task_id), &user.id, Some(WeekStart::of(wednesday)))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "This week");
        assert_eq!(
            rows[0].week_start_date.as_datetime(),
            Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap()
        );

        let all = get_weekly_tasks_for_task(&pool, Some(&task_id), &user.id, None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn ordered_by_priority_ascending() {
        let pool = connect_in_memory().await;
        let user = create_user(&pool, "u@example.com").await.unwrap();
        let task_id = task_for(&pool, &user.id).await;
        let week = week_of(2026, 10, 19);

        for (title, priority) in [("low", 3), ("high", 1), ("mid", 2)] {
            create_weekly_task(&pool, &user.id, &weekly(&task_id, title, priority, week))
                .await
                .unwrap()
                .unwrap();
        }

        let titles: Vec<String> = get_weekly_tasks_for_task(&pool, None, &user.id, Some(week))
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.title)
            .collect();
        assert_eq!(titles, vec!["high", "mid", "low"]);
    }

    #[tokio::test]
    async fn foreign_task_parent_and_foreign_access_are_refused() {
        let pool = connect_in_memory().await;
        let owner = create_user(&pool, "owner@example.com").await.unwrap();
        let intruder = create_user(&pool, "intruder@example.com").await.unwrap();
        let task_id = task_for(&pool, &owner.id).await;
        let week = week_of(2026, 10, 19);

        assert!(create_weekly_task(&pool, &intruder.id, &weekly(&task_id, "Nope", 1, week))
            .await
            .unwrap()
            .is_none());
        assert!(get_weekly_tasks_for_task(&pool, Some(&task_id), &owner.id, None)
            .await
            .unwrap()
            .is_empty());

        let created = create_weekly_task(&pool, &owner.id, &weekly(&task_id, "Mine", 1, week))
            .await
            .unwrap()
            .unwrap();
        assert!(get_weekly_task_by_id(&pool, &created.id, &intruder.id).await.unwrap().is_none());
        assert!(update_weekly_task_status(&pool, &created.id, &intruder.id, WeeklyTaskStatus::Completed)
            .await
            .unwrap()
            .is_none());
        assert!(delete_weekly_task(&pool, &created.id, &intruder.id).await.unwrap().is_none());

        let stored = get_weekly_task_by_id(&pool, &created.id, &owner.id).await.unwrap().unwrap();
        assert_eq!(stored.status, WeeklyTaskStatus::Pending);

        let parent = delete_weekly_task(&pool, &created.id, &owner.id).await.unwrap();
        assert_eq!(parent.as_deref(), Some(task_id.as_str()));
        assert!(delete_weekly_task(&pool, &created.id, &owner.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_moves_week_and_keeps_status_when_unset() {
        let pool = connect_in_memory().await;
        let user = create_user(&pool, "u@example.com").await.unwrap();
        let task_id = task_for(&pool, &user.id).await;
        let week = week_of(2026, 10, 19);
        let created = create_weekly_task(&pool, &user.id, &weekly(&task_id, "Plan", 2, week))
            .await
            .unwrap()
            .unwrap();
        update_weekly_task_status(&pool, &created.id, &user.id, WeeklyTaskStatus::InProgress)
            .await
            .unwrap()
            .unwrap();

        let change = WeeklyTaskUpdate {
            title:           "Plan v2".into(),
            description:     None,
            priority:        3,
            week_start_date: week.next(),
            status:          None,
        };
        let updated = update_weekly_task(&pool, &created.id, &user.id, &change).await.unwrap().unwrap();
        assert_eq!(updated.status, WeeklyTaskStatus::InProgress);
        assert_eq!(updated.priority, 3);

        let in_next = get_weekly_tasks_for_task(&pool, Some(&task_id), &user.id, Some(week.next()))
            .await
            .unwrap();
        assert_eq!(in_next.len(), 1);
        assert!(get_weekly_tasks_for_task(&pool, Some(&task_id), &user.id, Some(week))
            .await
            .unwrap()
            .is_empty());
    }
}
