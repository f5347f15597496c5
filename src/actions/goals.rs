use serde::Deserialize;
use validator::Validate;

use super::validation::{non_empty, trim_in_place, validate_title};
use super::{authenticate, ActionError, ActionResult, Deleted};
use crate::{
    middleware::auth_guard::AuthUser,
    models::Goal,
    services::goals::{self, NewGoal},
    state::AppState,
};

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct GoalForm {
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: String,
}

impl GoalForm {
    fn normalized(mut self) -> Self {
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.description);
        self
    }

    fn into_goal(self) -> NewGoal {
        NewGoal { title: self.title, description: non_empty(&self.description) }
    }
}

fn revalidate_goal(state: &AppState, goal_id: &str) {
    state.revalidator.revalidate_all(["/goals", format!("/goals/{goal_id}").as_str()]);
}

pub async fn create_goal_action(
    state: &AppState,
    session: Option<&AuthUser>,
    form: GoalForm,
) -> ActionResult<Goal> {
    let user = authenticate(session)?;
    let form = form.normalized();
    form.validate()?;

    let goal = goals::create_goal(&state.pool, &user.user_id, &form.into_goal())
        .await
        .map_err(|e| ActionError::service("create goal", e))?;

    revalidate_goal(state, &goal.id);
    Ok(goal)
}

pub async fn update_goal_action(
    state: &AppState,
    session: Option<&AuthUser>,
    goal_id: &str,
    form: GoalForm,
) -> ActionResult<Goal> {
    let user = authenticate(session)?;
    let form = form.normalized();
    form.validate()?;

    let goal = goals::update_goal(&state.pool, goal_id, &user.user_id, &form.into_goal())
        .await
        .map_err(|e| ActionError::service("update goal", e))?
        .ok_or_else(|| ActionError::not_found("Goal"))?;

    revalidate_goal(state, &goal.id);
    Ok(goal)
}

pub async fn delete_goal_action(
    state: &AppState,
    session: Option<&AuthUser>,
    goal_id: &str,
) -> ActionResult<Deleted> {
    let user = authenticate(session)?;

    let deleted = goals::delete_goal(&state.pool, goal_id, &user.user_id)
        .await
        .map_err(|e| ActionError::service("delete goal", e))?;
    if !deleted {
        return Err(ActionError::not_found("Goal"));
    }

    revalidate_goal(state, goal_id);
    Ok(Deleted::YES)
}
