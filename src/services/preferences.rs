//! Per-user preferences, created lazily on first read.

use chrono::Utc;

use super::{new_id, ServiceError, ServiceResult};
use crate::{
    db::Db,
    models::{Language, Theme, UserPreferences},
};

const PREFERENCE_COLUMNS: &str = "id, user_id, language, theme, created_at, updated_at";

/// Fields to change; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct PreferencesUpdate {
    pub language: Option<Language>,
    pub theme:    Option<Theme>,
}

async fn find_preferences(pool: &Db, user_id: &str) -> ServiceResult<Option<UserPreferences>> {
    let prefs = sqlx::query_as::<_, UserPreferences>(&format!(
        "SELECT {PREFERENCE_COLUMNS} FROM user_preferences WHERE user_id = ?"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(prefs)
}

/// Return the user's preferences, inserting the defaults if none exist yet.
pub async fn get_user_preferences(pool: &Db, user_id: &str) -> ServiceResult<UserPreferences> {
    if let Some(prefs) = find_preferences(pool, user_id).await? {
        return Ok(prefs);
    }

    let now = Utc::now();
    // Two first reads may race; the unique user_id makes the second insert a no-op.
    sqlx::query(
        "INSERT INTO user_preferences (id, user_id, language, theme, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT(user_id) DO NOTHING",
    )
    .bind(new_id())
    .bind(user_id)
    .bind(Language::default())
    .bind(Theme::default())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    tracing::debug!(user_id, "Initialised default preferences");

    find_preferences(pool, user_id)
        .await?
        .ok_or_else(|| ServiceError::Invariant(format!("preferences missing after insert for {user_id}")))
}

pub async fn update_user_preferences(
    pool: &Db,
    user_id: &str,
    update: &PreferencesUpdate,
) -> ServiceResult<UserPreferences> {
    let current = get_user_preferences(pool, user_id).await?;
    if current.user_id != user_id {
        tracing::error!(user_id, prefs_id = %current.id, "Preferences row owned by another user");
        return Err(ServiceError::Invariant("preferences row does not belong to caller".into()));
    }

    let updated = UserPreferences {
        language:   update.language.unwrap_or(current.language),
        theme:      update.theme.unwrap_or(current.theme),
        updated_at: Utc::now(),
        ..current
    };

    sqlx::query("UPDATE user_preferences SET language = ?, theme = ?, updated_at = ? WHERE id = ? AND user_id = ?")
        .bind(updated.language)
        .bind(updated.theme)
        .bind(updated.updated_at)
        .bind(&updated.id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(updated)
}
