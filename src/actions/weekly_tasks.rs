use serde::Deserialize;
use validator::Validate;

use super::validation::{
    non_empty, parse_priority, parse_week_start, parse_weekly_status, parsed, trim_in_place,
    validate_priority, validate_required_weekly_status, validate_title, validate_week_start,
    validate_weekly_status,
};
use super::{authenticate, ActionError, ActionResult, Deleted};
use crate::{
    middleware::auth_guard::AuthUser,
    models::WeeklyTask,
    services::weekly_tasks::{self, NewWeeklyTask, WeeklyTaskUpdate},
    state::AppState,
    week::WeekStart,
};

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct NewWeeklyTaskForm {
    #[validate(length(min = 1, message = "Task is required"))]
    pub task_id: String,
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: String,
    #[validate(custom(function = "validate_priority"))]
    pub priority: String,
    #[validate(custom(function = "validate_week_start"))]
    pub week_start_date: String,
    #[validate(custom(function = "validate_weekly_status"))]
    pub status: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct WeeklyTaskForm {
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: String,
    #[validate(custom(function = "validate_priority"))]
    pub priority: String,
    #[validate(custom(function = "validate_week_start"))]
    pub week_start_date: String,
    #[validate(custom(function = "validate_weekly_status"))]
    pub status: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct WeeklyTaskStatusForm {
    #[validate(custom(function = "validate_required_weekly_status"))]
    pub status: String,
}

/// Any day of the week is accepted and stored as that week's Sunday.
fn week_of(raw: &str) -> ActionResult<WeekStart> {
    parsed("week_start_date", parse_week_start(raw)).map(WeekStart::containing)
}

impl NewWeeklyTaskForm {
    fn normalized(mut self) -> Self {
        for field in [
            &mut self.task_id,
            &mut self.title,
            &mut self.description,
            &mut self.priority,
            &mut self.week_start_date,
            &mut self.status,
        ] {
            trim_in_place(field);
        }
        self
    }

    fn into_weekly_task(self) -> ActionResult<NewWeeklyTask> {
        Ok(NewWeeklyTask {
            priority:        parsed("priority", parse_priority(&self.priority))?,
            week_start_date: week_of(&self.week_start_date)?,
            status:          parsed("status", parse_weekly_status(&self.status))?.unwrap_or_default(),
            description:     non_empty(&self.description),
            task_id:         self.task_id,
            title:           self.title,
        })
    }
}

impl WeeklyTaskForm {
    fn normalized(mut self) -> Self {
        for field in [
            &mut self.title,
            &mut self.description,
            &mut self.priority,
            &mut self.week_start_date,
            &mut self.status,
        ] {
            trim_in_place(field);
        }
        self
    }

    fn into_update(self) -> ActionResult<WeeklyTaskUpdate> {
        Ok(WeeklyTaskUpdate {
            priority:        parsed("priority", parse_priority(&self.priority))?,
            week_start_date: week_of(&self.week_start_date)?,
            status:          parsed("status", parse_weekly_status(&self.status))?,
            description:     non_empty(&self.description),
            title:           self.title,
        })
    }
}

/// The weekly view and the parent task page both list weekly tasks.
fn revalidate_weekly_task(state: &AppState, task_id: &str) {
    state.revalidator.revalidate_all([
        "/weekly-tasks",
        format!("/tasks/{task_id}").as_str(),
    ]);
}

pub async fn create_weekly_task_action(
    state: &AppState,
    session: Option<&AuthUser>,
    form: NewWeeklyTaskForm,
) -> ActionResult<WeeklyTask> {
    let user = authenticate(session)?;
    let form = form.normalized();
    form.validate()?;
    let data = form.into_weekly_task()?;

    let weekly = weekly_tasks::create_weekly_task(&state.pool, &user.user_id, &data)
        .await
        .map_err(|e| ActionError::service("create weekly task", e))?
        .ok_or_else(|| ActionError::not_found("Task"))?;

    revalidate_weekly_task(state, &weekly.task_id);
    Ok(weekly)
}

pub async fn update_weekly_task_action(
    state: &AppState,
    session: Option<&AuthUser>,
    weekly_task_id: &str,
    form: WeeklyTaskForm,
) -> ActionResult<WeeklyTask> {
    let user = authenticate(session)?;
    let form = form.normalized();
    form.validate()?;
    let data = form.into_update()?;

    let weekly = weekly_tasks::update_weekly_task(&state.pool, weekly_task_id, &user.user_id, &data)
        .await
        .map_err(|e| ActionError::service("update weekly task", e))?
        .ok_or_else(|| ActionError::not_found("Weekly task"))?;

    revalidate_weekly_task(state, &weekly.task_id);
    Ok(weekly)
}

pub async fn update_weekly_task_status_action(
    state: &AppState,
    session: Option<&AuthUser>,
    weekly_task_id: &str,
    mut form: WeeklyTaskStatusForm,
) -> ActionResult<WeeklyTask> {
    let user = authenticate(session)?;
    trim_in_place(&mut form.status);
    form.validate()?;
    let status = parsed("status", parse_weekly_status(&form.status))?.unwrap_or_default();

    let weekly = weekly_tasks::update_weekly_task_status(&state.pool, weekly_task_id, &user.user_id, status)
        .await
        .map_err(|e| ActionError::service("update weekly task status", e))?
        .ok_or_else(|| ActionError::not_found("Weekly task"))?;

    revalidate_weekly_task(state, &weekly.task_id);
    Ok(weekly)
}

pub async fn delete_weekly_task_action(
    state: &AppState,
    session: Option<&AuthUser>,
    weekly_task_id: &str,
) -> ActionResult<Deleted> {
    let user = authenticate(session)?;

    let task_id = weekly_tasks::delete_weekly_task(&state.pool, weekly_task_id, &user.user_id)
        .await
        .map_err(|e| ActionError::service("delete weekly task", e))?
        .ok_or_else(|| ActionError::not_found("Weekly task"))?;

    revalidate_weekly_task(state, &task_id);
    Ok(Deleted::YES)
}
