use axum::{middleware, Router};
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::auth_guard::{require_auth, resolve_session},
    state::AppState,
};

mod auth;
mod goals;
mod preferences;
mod regions;
mod tasks;
mod users;
mod weekly_tasks;

/// Build the full `/api/v1` router.
///
/// Every route sees the resolved session, if any. Read routes are wrapped in
/// [`require_auth`]; action routes stay open so they can answer a missing
/// session with their own `UNAUTHORIZED` envelope.
pub fn all_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(
            Router::new()
                .merge(users::router())
                .merge(preferences::router())
                .merge(goals::router())
                .merge(regions::router())
                .merge(tasks::router())
                .merge(weekly_tasks::router())
                .route_layer(middleware::from_fn(require_auth)),
        )
        .merge(users::action_router())
        .merge(preferences::action_router())
        .merge(goals::action_router())
        .merge(regions::action_router())
        .merge(tasks::action_router())
        .merge(weekly_tasks::action_router())
        .layer(middleware::from_fn_with_state(state, resolve_session))
}

/// The complete application with cookie, CORS and tracing layers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", all_routes(state.clone()))
        .layer(CookieManagerLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        auth::{magic_link::issue_sign_in_token, session::create_session},
        services::users::get_user_by_email,
        test_support::{count, signed_in, test_state},
    };

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut req = Request::builder().method("GET").uri(uri);
        if let Some(token) = cookie {
            req = req.header(header::COOKIE, format!("session={token}"));
        }
        req.body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
        let mut req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(token) = cookie {
            req = req.header(header::COOKIE, format!("session={token}"));
        }
        req.body(Body::from(body.to_owned())).unwrap()
    }

    #[tokio::test]
    async fn reads_without_session_are_401() {
        let state = test_state().await;

        let response = app(state).oneshot(get("/api/v1/goals", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({ "error": "Unauthorized" }));
    }

    #[tokio::test]
    async fn actions_without_session_answer_with_envelope() {
        let state = test_state().await;

        let response = app(state.clone())
            .oneshot(post_form("/api/v1/actions/goals", None, "title=Run"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({ "error": "Unauthorized", "code": "UNAUTHORIZED" }));
        assert_eq!(count(&state, "goals").await, 0);
    }

    #[tokio::test]
    async fn session_cookie_drives_actions_and_reads() {
        let state = test_state().await;
        let user = signed_in(&state, "u@example.com").await;
        let token = create_session(&state.pool, &user.user_id, 30).await.unwrap();

        let response = app(state.clone())
            .oneshot(post_form("/api/v1/actions/goals", Some(&token), "title=+Run+a+marathon+"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["title"], "Run a marathon");

        let response = app(state.clone()).oneshot(get("/api/v1/goals", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let goals = body_json(response).await;
        assert_eq!(goals.as_array().unwrap().len(), 1);

        let response = app(state).oneshot(get("/api/v1/auth/session", Some(&token))).await.unwrap();
        assert_eq!(body_json(response).await["user"]["user_id"], user.user_id);
    }

    #[tokio::test]
    async fn validation_failures_are_422_with_field_errors() {
        let state = test_state().await;
        let user = signed_in(&state, "u@example.com").await;
        let token = create_session(&state.pool, &user.user_id, 30).await.unwrap();

        let response = app(state)
            .oneshot(post_form("/api/v1/actions/goals", Some(&token), "title=++"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["validation_errors"][0]["field"], "title");
    }

    #[tokio::test]
    async fn undecodable_action_bodies_keep_the_envelope() {
        let state = test_state().await;
        let user = signed_in(&state, "u@example.com").await;
        let token = create_session(&state.pool, &user.user_id, 30).await.unwrap();

        let json_body = |cookie: Option<&str>| {
            let mut req = Request::builder()
                .method("POST")
                .uri("/api/v1/actions/goals")
                .header(header::CONTENT_TYPE, "application/json");
            if let Some(token) = cookie {
                req = req.header(header::COOKIE, format!("session={token}"));
            }
            req.body(Body::from(r#"{"title":"Run"}"#)).unwrap()
        };

        let response = app(state.clone()).oneshot(json_body(Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["validation_errors"][0]["field"], "form");

        let response = app(state.clone()).oneshot(json_body(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
        assert_eq!(count(&state, "goals").await, 0);
    }

    #[tokio::test]
    async fn anonymous_session_lookup_returns_null_user() {
        let state = test_state().await;

        let response = app(state).oneshot(get("/api/v1/auth/session", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "user": null }));
    }

    #[tokio::test]
    async fn weekly_view_includes_neighbouring_weeks() {
        let state = test_state().await;
        let user = signed_in(&state, "u@example.com").await;
        let token = create_session(&state.pool, &user.user_id, 30).await.unwrap();

        let response = app(state.clone())
            .oneshot(get("/api/v1/weekly-tasks?week=2026-10-21", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["week_start"], "2026-10-18T00:00:00Z");
        assert_eq!(body["previous_week"], "2026-10-11T00:00:00Z");
        assert_eq!(body["next_week"], "2026-10-25T00:00:00Z");
        assert_eq!(body["weekly_tasks"], json!([]));

        let response = app(state)
            .oneshot(get("/api/v1/weekly-tasks?week=soon", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn magic_link_callback_creates_user_and_sets_cookie() {
        let state = test_state().await;
        let token = issue_sign_in_token(&state.pool, "new@example.com", 15).await.unwrap();

        let uri = format!("/api/v1/auth/callback?token={token}&email=New%40Example.com");
        let response = app(state.clone()).oneshot(get(&uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("session="));

        let user = get_user_by_email(&state.pool, "new@example.com").await.unwrap().unwrap();
        assert!(user.email_verified.is_some());
        assert_eq!(count(&state, "sessions").await, 1);

        // Single use.
        let response = app(state).oneshot(get(&uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sign_in_rejects_malformed_email() {
        let state = test_state().await;

        let response = app(state.clone())
            .oneshot(post_form("/api/v1/auth/sign-in", None, "email=not-an-email"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(count(&state, "verification_tokens").await, 0);

        let response = app(state.clone())
            .oneshot(post_form("/api/v1/auth/sign-in", None, "email=me%40example.com"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(count(&state, "verification_tokens").await, 1);
    }
}
