use serde::Deserialize;
use validator::Validate;

use super::validation::{
    non_empty, parse_deadline, parse_task_status, parsed, trim_in_place, validate_deadline,
    validate_required_task_status, validate_task_status, validate_title,
};
use super::{authenticate, ActionError, ActionResult, Deleted};
use crate::{
    middleware::auth_guard::AuthUser,
    models::Task,
    services::tasks::{self, NewTask, TaskUpdate},
    state::AppState,
};

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct NewTaskForm {
    #[validate(length(min = 1, message = "Region is required"))]
    pub region_id: String,
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: String,
    #[validate(custom(function = "validate_deadline"))]
    pub deadline: String,
    #[validate(custom(function = "validate_task_status"))]
    pub status: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct TaskForm {
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: String,
    #[validate(custom(function = "validate_deadline"))]
    pub deadline: String,
    #[validate(custom(function = "validate_task_status"))]
    pub status: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct TaskStatusForm {
    #[validate(custom(function = "validate_required_task_status"))]
    pub status: String,
}

impl NewTaskForm {
    fn normalized(mut self) -> Self {
        for field in [
            &mut self.region_id,
            &mut self.title,
            &mut self.description,
            &mut self.deadline,
            &mut self.status,
        ] {
            trim_in_place(field);
        }
        self
    }

    fn into_task(self) -> ActionResult<NewTask> {
        Ok(NewTask {
            deadline:    parsed("deadline", parse_deadline(&self.deadline))?,
            status:      parsed("status", parse_task_status(&self.status))?.unwrap_or_default(),
            description: non_empty(&self.description),
            region_id:   self.region_id,
            title:       self.title,
        })
    }
}

impl TaskForm {
    fn normalized(mut self) -> Self {
        for field in [&mut self.title, &mut self.description, &mut self.deadline, &mut self.status] {
            trim_in_place(field);
        }
        self
    }

    fn into_update(self) -> ActionResult<TaskUpdate> {
        Ok(TaskUpdate {
            deadline:    parsed("deadline", parse_deadline(&self.deadline))?,
            status:      parsed("status", parse_task_status(&self.status))?,
            description: non_empty(&self.description),
            title:       self.title,
        })
    }
}

fn revalidate_task(state: &AppState, task: &Task) {
    state.revalidator.revalidate_all([
        format!("/regions/{}", task.region_id).as_str(),
        format!("/tasks/{}", task.id).as_str(),
    ]);
}

pub async fn create_task_action(
    state: &AppState,
    session: Option<&AuthUser>,
    form: NewTaskForm,
) -> ActionResult<Task> {
    let user = authenticate(session)?;
    let form = form.normalized();
    form.validate()?;
    let data = form.into_task()?;

    let task = tasks::create_task(&state.pool, &user.user_id, &data)
        .await
        .map_err(|e| ActionError::service("create task", e))?
        .ok_or_else(|| ActionError::not_found("Region"))?;

    revalidate_task(state, &task);
    Ok(task)
}

pub async fn update_task_action(
    state: &AppState,
    session: Option<&AuthUser>,
    task_id: &str,
    form: TaskForm,
) -> ActionResult<Task> {
    let user = authenticate(session)?;
    let form = form.normalized();
    form.validate()?;
    let data = form.into_update()?;

    let task = tasks::update_task(&state.pool, task_id, &user.user_id, &data)
        .await
        .map_err(|e| ActionError::service("update task", e))?
        .ok_or_else(|| ActionError::not_found("Task"))?;

    revalidate_task(state, &task);
    Ok(task)
}

pub async fn update_task_status_action(
    state: &AppState,
    session: Option<&AuthUser>,
    task_id: &str,
    mut form: TaskStatusForm,
) -> ActionResult<Task> {
    let user = authenticate(session)?;
    trim_in_place(&mut form.status);
    form.validate()?;
    let status = parsed("status", parse_task_status(&form.status))?.unwrap_or_default();

    let task = tasks::update_task_status(&state.pool, task_id, &user.user_id, status)
        .await
        .map_err(|e| ActionError::service("update task status", e))?
        .ok_or_else(|| ActionError::not_found("Task"))?;

    revalidate_task(state, &task);
    Ok(task)
}

pub async fn delete_task_action(
    state: &AppState,
    session: Option<&AuthUser>,
    task_id: &str,
) -> ActionResult<Deleted> {
    let user = authenticate(session)?;

    let deleted = tasks::delete_task(&state.pool, task_id, &user.user_id)
        .await
        .map_err(|e| ActionError::service("delete task", e))?;
    if !deleted {
        return Err(ActionError::not_found("Task"));
    }

    state.revalidator.revalidate_all(["/goals", format!("/tasks/{task_id}").as_str()]);
    Ok(Deleted::YES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::goals::{create_goal_action, GoalForm};
    use crate::actions::regions::{create_region_action, NewRegionForm};
    use crate::actions::ErrorCode;
    use crate::models::TaskStatus;
    use crate::test_support::{count, signed_in, test_state};
    use chrono::NaiveDate;

    async fn region_id(state: &AppState, user: &AuthUser) -> String {
        let goal = create_goal_action(state, Some(user), GoalForm { title: "Goal".into(), ..Default::default() })
            .await
            .unwrap();
        create_region_action(
            state,
            Some(user),
            NewRegionForm { goal_id: goal.id, title: "Region".into(), ..Default::default() },
        )
        .await
        .unwrap()
        .id
    }

    fn new_task(region_id: &str, deadline: &str, status: &str) -> NewTaskForm {
        NewTaskForm {
            region_id:   region_id.into(),
            title:       "Write report".into(),
            description: String::new(),
            deadline:    deadline.into(),
            status:      status.into(),
        }
    }

    #[tokio::test]
    async fn create_parses_deadline_and_defaults_status() {
        let state = test_state().await;
        let user = signed_in(&state, "u@example.com").await;
        let region_id = region_id(&state, &user).await;

        let task = create_task_action(&state, Some(&user), new_task(&region_id, "2026-12-31", ""))
            .await
            .unwrap();
        assert_eq!(task.deadline, NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
        assert_eq!(task.status, TaskStatus::Active);

        let task = create_task_action(
            &state,
            Some(&user),
            new_task(&region_id, "2026-11-01T23:30:00-02:00", "completed"),
        )
        .await
        .unwrap();
        assert_eq!(task.deadline, NaiveDate::from_ymd_opt(2026, 11, 2).unwrap());
        assert_eq!(task.status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn bad_deadline_and_status_are_reported_per_field() {
        let state = test_state().await;
        let user = signed_in(&state, "u@example.com").await;
        let region_id = region_id(&state, &user).await;

        let err = create_task_action(&state, Some(&user), new_task(&region_id, "someday", "done"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        let fields = err.validation_errors.unwrap();
        assert_eq!(fields[0].field, "deadline");
        assert_eq!(fields[0].message, "Deadline must be a valid date");
        assert_eq!(fields[1].field, "status");
        assert_eq!(count(&state, "tasks").await, 0);
    }

    #[tokio::test]
    async fn status_action_requires_a_status_and_ownership() {
        let state = test_state().await;
        let owner = signed_in(&state, "owner@example.com").await;
        let intruder = signed_in(&state, "intruder@example.com").await;
        let region_id = region_id(&state, &owner).await;
        let task = create_task_action(&state, Some(&owner), new_task(&region_id, "2026-12-31", ""))
            .await
            .unwrap();

        let err = update_task_status_action(&state, Some(&owner), &task.id, TaskStatusForm::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let done = TaskStatusForm { status: "completed".into() };
        let err = update_task_status_action(&state, Some(&intruder), &task.id, done).await.unwrap_err();
        assert_eq!(err, ActionError::not_found("Task"));

        let done = TaskStatusForm { status: "completed".into() };
        let task = update_task_status_action(&state, Some(&owner), &task.id, done).await.unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn update_with_empty_status_keeps_it() {
        let state = test_state().await;
        let user = signed_in(&state, "u@example.com").await;
        let region_id = region_id(&state, &user).await;
        let task = create_task_action(&state, Some(&user), new_task(&region_id, "2026-12-31", "incomplete"))
            .await
            .unwrap();

        let change = TaskForm {
            title:       "Rewrite report".into(),
            description: String::new(),
            deadline:    "2027-01-10".into(),
            status:      String::new(),
        };
        let task = update_task_action(&state, Some(&user), &task.id, change).await.unwrap();
        assert_eq!(task.title, "Rewrite report");
        assert_eq!(task.status, TaskStatus::Incomplete);
    }

    #[tokio::test]
    async fn delete_twice_is_not_found() {
        let state = test_state().await;
        let user = signed_in(&state, "u@example.com").await;
        let region_id = region_id(&state, &user).await;
        let task = create_task_action(&state, Some(&user), new_task(&region_id, "2026-12-31", ""))
            .await
            .unwrap();

        assert_eq!(delete_task_action(&state, Some(&user), &task.id).await.unwrap(), Deleted::YES);
        let err = delete_task_action(&state, Some(&user), &task.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
