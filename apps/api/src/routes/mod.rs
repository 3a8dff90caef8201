pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::board::handlers as board;
use crate::courses::handlers as courses;
use crate::dashboard::handlers as dashboard;
use crate::state::AppState;
use crate::wizard::handlers as wizard;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Wizard
        .route("/api/v1/sessions", post(wizard::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(wizard::handle_get_session).delete(wizard::handle_reset_session),
        )
        .route(
            "/api/v1/sessions/:id/details",
            post(wizard::handle_submit_details),
        )
        .route(
            "/api/v1/sessions/:id/suggestions",
            post(wizard::handle_suggest_more),
        )
        .route(
            "/api/v1/sessions/:id/skills",
            post(wizard::handle_confirm_skills),
        )
        .route(
            "/api/v1/sessions/:id/skills/custom",
            post(wizard::handle_add_custom_skill),
        )
        .route(
            "/api/v1/sessions/:id/ratings",
            post(wizard::handle_submit_ratings),
        )
        .route(
            "/api/v1/sessions/:id/answers",
            post(wizard::handle_submit_answers),
        )
        .route(
            "/api/v1/sessions/:id/recommendation",
            post(wizard::handle_recommend),
        )
        .route("/api/v1/sessions/:id/trends", get(wizard::handle_trends))
        .route(
            "/api/v1/sessions/:id/report.pdf",
            get(wizard::handle_report),
        )
        // Course authoring
        .route(
            "/api/v1/courses",
            get(courses::handle_list_courses).post(courses::handle_create_course),
        )
        .route("/api/v1/courses/draft", post(courses::handle_draft_course))
        .route("/api/v1/courses/:id", get(courses::handle_get_course))
        // Discussion board
        .route(
            "/api/v1/posts",
            get(board::handle_list_posts).post(board::handle_create_post),
        )
        // Progress dashboard
        .route("/api/v1/progress", put(dashboard::handle_record_progress))
        .route(
            "/api/v1/users/:id/dashboard",
            get(dashboard::handle_get_dashboard),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::db::test_pool;
    use crate::llm_client::testing::ScriptedModel;

    async fn app() -> Router {
        let model = ScriptedModel::new()
            .on("suggest 8-10 key skills", "SQL, Excel")
            .on("instructional designer", "Short intro.\nModule 1: Basics");
        build_router(AppState::for_tests(test_pool().await, Arc::new(model)))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let app = app().await;
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "skillpath");
    }

    #[tokio::test]
    async fn test_session_details_and_conflict() {
        let app = app().await;
        let (status, session) = send(&app, Method::POST, "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = session["id"].as_str().unwrap().to_string();

        let details = json!({"name": "Asha", "email": "asha@example.com", "profession": "Analyst"});
        let (status, step) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/details"),
            Some(details.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(step["session"]["stage"], "details_submitted");
        assert_eq!(step["session"]["suggested_skills"], json!(["SQL", "Excel"]));

        let (status, err) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/details"),
            Some(details),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["error"]["code"], "INVALID_STEP");

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/ratings"),
            Some(json!({"ratings": [{"skill": "SQL", "rating": 4}]})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_invalid_email_is_bad_request() {
        let app = app().await;
        let (_, session) = send(&app, Method::POST, "/api/v1/sessions", None).await;
        let id = session["id"].as_str().unwrap().to_string();
        let (status, err) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/details"),
            Some(json!({"name": "Asha", "email": "nope", "profession": "Analyst"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let app = app().await;
        let (status, err) = send(
            &app,
            Method::GET,
            "/api/v1/sessions/00000000-0000-4000-8000-000000000000",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_course_routes() {
        let app = app().await;
        let (status, course) = send(
            &app,
            Method::POST,
            "/api/v1/courses",
            Some(json!({"title": "SQL 101", "skill": "SQL", "level": "beginner"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = course["id"].as_i64().unwrap();

        let (status, fetched) = send(&app, Method::GET, &format!("/api/v1/courses/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["level"], "Beginner");

        let (_, listed) = send(&app, Method::GET, "/api/v1/courses?skill=sql&level=Beginner", None).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, Method::GET, "/api/v1/courses?level=Expert", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, draft) = send(
            &app,
            Method::POST,
            "/api/v1/courses/draft",
            Some(json!({"title": "SQL 101", "skill": "SQL", "level": "Beginner"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(draft["modules"], json!(["Module 1: Basics"]));
    }

    #[tokio::test]
    async fn test_progress_and_dashboard_routes() {
        let app = app().await;
        let (_, session) = send(&app, Method::POST, "/api/v1/sessions", None).await;
        let id = session["id"].as_str().unwrap().to_string();
        let (_, step) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/details"),
            Some(json!({"name": "Asha", "email": "asha@example.com", "profession": "Analyst"})),
        )
        .await;
        let user_id = step["session"]["user_id"].as_i64().unwrap();

        let (_, course) = send(
            &app,
            Method::POST,
            "/api/v1/courses",
            Some(json!({"title": "SQL 101", "skill": "SQL", "level": "Beginner"})),
        )
        .await;
        let course_id = course["id"].as_i64().unwrap();

        let (status, update) = send(
            &app,
            Method::PUT,
            "/api/v1/progress",
            Some(json!({"user_id": user_id, "course_id": course_id, "percent": 100})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(update["new_badges"], json!(["First Steps", "Finished: SQL 101"]));

        let (status, post) = send(
            &app,
            Method::POST,
            "/api/v1/posts",
            Some(json!({"user_id": user_id, "course_id": course_id, "body": "Done!"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(post["author_name"], "Asha");

        let (_, dashboard) = send(
            &app,
            Method::GET,
            &format!("/api/v1/users/{user_id}/dashboard"),
            None,
        )
        .await;
        assert_eq!(dashboard["completed_courses"], 1);
        assert_eq!(dashboard["badges"].as_array().unwrap().len(), 2);
    }
}
