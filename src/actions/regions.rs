use serde::Deserialize;
use validator::Validate;

use super::validation::{non_empty, trim_in_place, validate_title};
use super::{authenticate, ActionError, ActionResult, Deleted};
use crate::{
    middleware::auth_guard::AuthUser,
    models::Region,
    services::regions::{self, NewRegion, RegionUpdate},
    state::AppState,
};

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct NewRegionForm {
    #[validate(length(min = 1, message = "Goal is required"))]
    pub goal_id: String,
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegionForm {
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: String,
}

impl NewRegionForm {
    fn normalized(mut self) -> Self {
        trim_in_place(&mut self.goal_id);
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.description);
        self
    }
}

impl RegionForm {
    fn normalized(mut self) -> Self {
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.description);
        self
    }
}

fn revalidate_region(state: &AppState, region: &Region) {
    state.revalidator.revalidate_all([
        format!("/goals/{}", region.goal_id).as_str(),
        format!("/regions/{}", region.id).as_str(),
    ]);
}

pub async fn create_region_action(
    state: &AppState,
    session: Option<&AuthUser>,
    form: NewRegionForm,
) -> ActionResult<Region> {
    let user = authenticate(session)?;
    let form = form.normalized();
    form.validate()?;

    let data = NewRegion {
        description: non_empty(&form.description),
        goal_id:     form.goal_id,
        title:       form.title,
    };

    let region = regions::create_region(&state.pool, &user.user_id, &data)
        .await
        .map_err(|e| ActionError::service("create region", e))?
        .ok_or_else(|| ActionError::not_found("Goal"))?;

    revalidate_region(state, &region);
    Ok(region)
}

pub async fn update_region_action(
    state: &AppState,
    session: Option<&AuthUser>,
    region_id: &str,
    form: RegionForm,
) -> ActionResult<Region> {
    let user = authenticate(session)?;
    let form = form.normalized();
    form.validate()?;

    let data = RegionUpdate { description: non_empty(&form.description), title: form.title };

    let region = regions::update_region(&state.pool, region_id, &user.user_id, &data)
        .await
        .map_err(|e| ActionError::service("update region", e))?
        .ok_or_else(|| ActionError::not_found("Region"))?;

    revalidate_region(state, &region);
    Ok(region)
}

pub async fn delete_region_action(
    state: &AppState,
    session: Option<&AuthUser>,
    region_id: &str,
) -> ActionResult<Deleted> {
    let user = authenticate(session)?;

    let deleted = regions::delete_region(&state.pool, region_id, &user.user_id)
        .await
        .map_err(|e| ActionError::service("delete region", e))?;
    if !deleted {
        return Err(ActionError::not_found("Region"));
    }

    state.revalidator.revalidate_all(["/goals", format!("/regions/{region_id}").as_str()]);
    Ok(Deleted::YES)
}
