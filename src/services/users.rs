//! User accounts. Users are created by the magic-link sign-in on first use.

use chrono::Utc;
use serde::Serialize;

use super::{new_id, ServiceResult};
use crate::{
    db::Db,
    models::{Goal, Region, Task, User, UserPreferences, WeeklyTask},
};

const USER_COLUMNS: &str = "id, name, email, email_verified, image, created_at, updated_at";

pub async fn get_user_by_id(pool: &Db, user_id: &str) -> ServiceResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn get_user_by_email(pool: &Db, email: &str) -> ServiceResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Insert a new account for a verified email address.
pub async fn create_user(pool: &Db, email: &str) -> ServiceResult<User> {
    let now = Utc::now();
    let user = User {
        id:             new_id(),
        name:           None,
        email:          Some(email.to_owned()),
        email_verified: Some(now),
        image:          None,
        created_at:     now,
        updated_at:     now,
    };

    sqlx::query(
        "INSERT INTO users (id, name, email, email_verified, image, created_at, updated_at)
         VALUES (?, NULL, ?, ?, NULL, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(user.email_verified)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await?;

    tracing::info!(user_id = %user.id, "Created user account");
    Ok(user)
}

/// Stamp `email_verified` the first time a link is used for an existing account.
pub async fn mark_email_verified(pool: &Db, user_id: &str) -> ServiceResult<()> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE users SET email_verified = ?, updated_at = ?
         WHERE id = ? AND email_verified IS NULL",
    )
    .bind(now)
    .bind(now)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Set or clear the display name. `None` stores SQL NULL.
pub async fn update_user_name(
    pool: &Db,
    user_id: &str,
    name: Option<&str>,
) -> ServiceResult<Option<User>> {
    let affected = sqlx::query("UPDATE users SET name = ?, updated_at = ? WHERE id = ?")
        .bind(name)
        .bind(Utc::now())
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();

    if affected == 0 {
        return Ok(None);
    }
    get_user_by_id(pool, user_id).await
}

/// Hard delete; FK cascades remove preferences, sessions and the goal tree.
pub async fn delete_user(pool: &Db, user_id: &str) -> ServiceResult<bool> {
    let affected = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(affected > 0)
}

// ── Export ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UserExport {
    pub exported_at:  chrono::DateTime<Utc>,
    pub user:         User,
    pub preferences:  UserPreferences,
    pub goals:        Vec<Goal>,
    pub regions:      Vec<Region>,
    pub tasks:        Vec<Task>,
    pub weekly_tasks: Vec<WeeklyTask>,
}

/// Everything the user owns, for data portability.
pub async fn export_user_data(pool: &Db, user_id: &str) -> ServiceResult<Option<UserExport>> {
    let Some(user) = get_user_by_id(pool, user_id).await? else {
        return Ok(None);
    };

    let preferences  = super::preferences::get_user_preferences(pool, user_id).await?;
    let goals        = super::goals::get_goals_for_user(pool, user_id).await?;
    let regions      = super::regions::get_regions_for_goal(pool, None, user_id).await?;
    let tasks        = super::tasks::get_tasks_for_region(pool, None, user_id).await?;
    let weekly_tasks = super::weekly_tasks::get_weekly_tasks_for_task(pool, None, user_id, None).await?;

    Ok(Some(UserExport {
        exported_at: Utc::now(),
        user,
        preferences,
        goals,
        regions,
        tasks,
        weekly_tasks,
    }))
}
