use serde::Deserialize;
use validator::Validate;

use super::validation::{non_empty, strip_markup};
use super::{authenticate, ActionError, ActionResult, Deleted};
use crate::{
    middleware::auth_guard::AuthUser,
    models::User,
    services::users,
    state::AppState,
};

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UserNameForm {
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: String,
}

impl UserNameForm {
    /// Markup is dropped before trimming so `<b> </b>` counts as empty.
    fn normalized(self) -> Self {
        Self { name: strip_markup(&self.name).trim().to_owned() }
    }
}

pub async fn update_user_name_action(
    state: &AppState,
    session: Option<&AuthUser>,
    form: UserNameForm,
) -> ActionResult<User> {
    let user = authenticate(session)?;
    let form = form.normalized();
    form.validate()?;

    let name = non_empty(&form.name);
    let updated = users::update_user_name(&state.pool, &user.user_id, name.as_deref())
        .await
        .map_err(|e| ActionError::service("update name", e))?
        .ok_or_else(|| ActionError::not_found("User"))?;

    state.revalidator.revalidate_all(["/settings", "/"]);
    Ok(updated)
}

/// Remove the account and everything it owns. Sessions go with the user row;
/// the HTTP handler clears the cookie.
pub async fn delete_account_action(state: &AppState, session: Option<&AuthUser>) -> ActionResult<Deleted> {
    let user = authenticate(session)?;

    let deleted = users::delete_user(&state.pool, &user.user_id)
        .await
        .map_err(|e| ActionError::service("delete account", e))?;
    if !deleted {
        return Err(ActionError::not_found("User"));
    }

    tracing::info!(user_id = %user.user_id, "Account deleted");
    state.revalidator.revalidate("/");
    Ok(Deleted::YES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ErrorCode;
    use crate::services::users::get_user_by_id;
    use crate::test_support::{count, signed_in, test_state};

    fn name(value: &str) -> UserNameForm {
        UserNameForm { name: value.into() }
    }

    #[tokio::test]
    async fn empty_name_is_stored_as_null() {
        let state = test_state().await;
        let user = signed_in(&state, "u@example.com").await;

        let updated = update_user_name_action(&state, Some(&user), name("")).await.unwrap();
        assert_eq!(updated.name, None);

        let stored = get_user_by_id(&state.pool, &user.user_id).await.unwrap().unwrap();
        assert_eq!(stored.name, None);
    }

    #[tokio::test]
    async fn name_is_trimmed_and_stripped_of_markup() {
        let state = test_state().await;
        let user = signed_in(&state, "u@example.com").await;

        let updated = update_user_name_action(&state, Some(&user), name("  Jane Doe  ")).await.unwrap();
        assert_eq!(updated.name.as_deref(), Some("Jane Doe"));

        let updated = update_user_name_action(&state, Some(&user), name("<script>x()</script><i>Jo</i>"))
            .await
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("Jo"));
    }

    #[tokio::test]
    async fn overlong_name_is_rejected() {
        let state = test_state().await;
        let user = signed_in(&state, "u@example.com").await;

        let err = update_user_name_action(&state, Some(&user), name(&"a".repeat(101))).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.validation_errors.unwrap()[0].field, "name");
    }

    #[tokio::test]
    async fn deleting_the_account_removes_the_user() {
        let state = test_state().await;
        let user = signed_in(&state, "u@example.com").await;

        assert_eq!(delete_account_action(&state, Some(&user)).await.unwrap(), Deleted::YES);
        assert_eq!(count(&state, "users").await, 0);
        assert_eq!(count(&state, "sessions").await, 0);

        let err = delete_account_action(&state, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }
}
