//! Ownership-scoped data access.
//!
//! Every function takes the acting user's id and filters through the parent
//! chain up to `goals.user_id`. A row that is missing and a row owned by
//! someone else look the same to the caller: `None` or `false`. Only
//! infrastructure failures come back as `Err`.
//!
//! Writes carry the ownership check inside the statement itself, so a check
//! and its mutation can never interleave with another connection's write.

use thiserror::Error;
use uuid::Uuid;

pub mod goals;
pub mod preferences;
pub mod regions;
pub mod tasks;
pub mod users;
pub mod weekly_tasks;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invariant violated: {0}")]
    Invariant(String),
}

/// Ids of the goals owned by the bound user id.
pub(crate) const USER_GOAL_IDS: &str = "SELECT id FROM goals WHERE user_id = ?";

/// Ids of the regions under the bound user id's goals.
pub(crate) const USER_REGION_IDS: &str = "SELECT r.id FROM regions r
         JOIN goals g ON g.id = r.goal_id
         WHERE g.user_id = ?";

/// Ids of the tasks under the bound user id's regions.
pub(crate) const USER_TASK_IDS: &str = "SELECT t.id FROM tasks t
         JOIN regions r ON r.id = t.region_id
         JOIN goals g   ON g.id = r.goal_id
         WHERE g.user_id = ?";

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}
