use serde::Deserialize;
use validator::Validate;

use super::validation::{parse_language, parse_theme, parsed, trim_in_place, validate_language, validate_theme};
use super::{authenticate, ActionError, ActionResult};
use crate::{
    middleware::auth_guard::AuthUser,
    models::UserPreferences,
    services::preferences::{self, PreferencesUpdate},
    state::AppState,
};

/// Both fields optional; empty leaves the stored value unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct PreferencesForm {
    #[validate(custom(function = "validate_language"))]
    pub language: String,
    #[validate(custom(function = "validate_theme"))]
    pub theme: String,
}

pub async fn update_preferences_action(
    state: &AppState,
    session: Option<&AuthUser>,
    mut form: PreferencesForm,
) -> ActionResult<UserPreferences> {
    let user = authenticate(session)?;
    trim_in_place(&mut form.language);
    trim_in_place(&mut form.theme);
    form.validate()?;

    let update = PreferencesUpdate {
        language: parsed("language", parse_language(&form.language))?,
        theme:    parsed("theme", parse_theme(&form.theme))?,
    };

    let prefs = preferences::update_user_preferences(&state.pool, &user.user_id, &update)
        .await
        .map_err(|e| ActionError::service("update preferences", e))?;

    state.revalidator.revalidate_all(["/settings", "/"]);
    Ok(prefs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ErrorCode;
    use crate::models::{Language, Theme};
    use crate::test_support::{signed_in, test_state};

    #[tokio::test]
    async fn updates_only_submitted_fields() {
        let state = test_state().await;
        let user = signed_in(&state, "u@example.com").await;

        let prefs = update_preferences_action(
            &state,
            Some(&user),
            PreferencesForm { language: "de".into(), theme: String::new() },
        )
        .await
        .unwrap();
        assert_eq!(prefs.language, Language::De);
        assert_eq!(prefs.theme, Theme::System);
        assert_eq!(prefs.user_id, user.user_id);
    }

    #[tokio::test]
    async fn unknown_language_is_rejected() {
        let state = test_state().await;
        let user = signed_in(&state, "u@example.com").await;

        let err = update_preferences_action(
            &state,
            Some(&user),
            PreferencesForm { language: "fr".into(), theme: "neon".into() },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        let fields: Vec<String> = err.validation_errors.unwrap().into_iter().map(|f| f.field).collect();
        assert_eq!(fields, vec!["language", "theme"]);
    }

    #[tokio::test]
    async fn requires_a_session() {
        let state = test_state().await;
        let err = update_preferences_action(&state, None, PreferencesForm::default()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }
}
