use std::time::Duration;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    handlers::{
        health::{healthz, livez},
        notifications::{list_notifications, list_unread_notifications, mark_notification_read},
        tasks::{
            assign_task, complete_task, create_task, delete_task, get_task, list_deleted_tasks,
            list_my_tasks, list_pending_tasks, list_tasks, restore_task, update_task,
        },
        users::{create_user, get_user},
    },
    state::AppState,
};

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    // CORS configuration for API endpoints
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-user-id")]);

    let api_routes = Router::new()
        // User routes
        .route("/users", post(create_user))
        .route("/users/{id}", get(get_user))
        // Task routes
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/pending", get(list_pending_tasks))
        .route("/tasks/mine", get(list_my_tasks))
        .route("/tasks/deleted", get(list_deleted_tasks))
        .route(
            "/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/tasks/{id}/assign", put(assign_task))
        .route("/tasks/{id}/complete", put(complete_task))
        .route("/tasks/{id}/restore", post(restore_task))
        // Notification routes
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread", get(list_unread_notifications))
        .route("/notifications/{id}/read", put(mark_notification_read))
        .layer(cors);

    Router::new()
        .route("/livez", get(livez))
        .route("/healthz", get(healthz))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(10),
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_state() -> AppState {
        AppState::in_memory(&Config {
            notification_workers: 1,
            queue_poll_interval_ms: 10,
            ..Config::default()
        })
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        user: Option<Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            request = request.header("x-user-id", user.to_string());
        }
        let body = match body {
            Some(json) => {
                request = request.header("Content-Type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    async fn create_test_user(app: &Router, username: &str) -> Uuid {
        let (status, body) = send(
            app,
            "POST",
            "/api/users",
            None,
            Some(json!({ "username": username, "email": format!("{username}@example.com") })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn test_livez_and_healthz() {
        let app = create_test_app();

        let (live, _) = send(&app, "GET", "/livez", None, None).await;
        let (health, body) = send(&app, "GET", "/healthz", None, None).await;

        assert_eq!(live, StatusCode::OK);
        assert_eq!(health, StatusCode::OK);
        assert_eq!(body["queue"]["pending"], 0);
        assert_eq!(body["queue"]["dead_letters"], 0);
    }

    #[tokio::test]
    async fn test_identity_header_is_required() {
        let app = create_test_app();

        let (missing, _) = send(&app, "GET", "/api/tasks/mine", None, None).await;
        let request = Request::builder()
            .uri("/api/notifications")
            .header("x-user-id", "alice")
            .body(Body::empty())
            .unwrap();
        let invalid = app.clone().oneshot(request).await.unwrap().status();

        assert_eq!(missing, StatusCode::UNAUTHORIZED);
        assert_eq!(invalid, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let app = create_test_app();
        let id = create_test_user(&app, "alice").await;

        let (status, body) = send(&app, "GET", &format!("/api/users/{id}"), None, None).await;
        let (missing, _) = send(
            &app,
            "GET",
            &format!("/api/users/{}", Uuid::new_v4()),
            None,
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
        assert_eq!(missing, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_task_validation_and_not_found() {
        let app = create_test_app();
        let alice = create_test_user(&app, "alice").await;

        let (empty_title, _) = send(
            &app,
            "POST",
            "/api/tasks",
            Some(alice),
            Some(json!({ "title": " ", "due_date": "2024-06-15T10:30:00Z" })),
        )
        .await;
        let (unknown_task, _) = send(
            &app,
            "GET",
            &format!("/api/tasks/{}", Uuid::new_v4()),
            Some(alice),
            None,
        )
        .await;

        assert_eq!(empty_title, StatusCode::BAD_REQUEST);
        assert_eq!(unknown_task, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_task_lifecycle_over_http() {
        let app = create_test_app();
        let alice = create_test_user(&app, "alice").await;
        let bob = create_test_user(&app, "bob").await;

        let (status, task) = send(
            &app,
            "POST",
            "/api/tasks",
            Some(alice),
            Some(json!({ "title": "Ship release", "due_date": "2024-06-15T10:30:00Z" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(task["status"], "Pending");
        let task_id = task["id"].as_str().unwrap().to_string();

        let (status, assigned) = send(
            &app,
            "PUT",
            &format!("/api/tasks/{task_id}/assign"),
            Some(alice),
            Some(json!({ "assigned_to": bob })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(assigned["assigned_to_username"], "bob");

        let (_, pending) = send(&app, "GET", "/api/tasks/pending", Some(bob), None).await;
        assert_eq!(pending.as_array().unwrap().len(), 1);

        let (status, completed) = send(
            &app,
            "PUT",
            &format!("/api/tasks/{task_id}/complete"),
            Some(bob),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(completed["status"], "Completed");

        let (_, pending) = send(&app, "GET", "/api/tasks/pending", Some(bob), None).await;
        let (_, mine) = send(&app, "GET", "/api/tasks/mine", Some(bob), None).await;
        assert!(pending.as_array().unwrap().is_empty());
        assert_eq!(mine[0]["status"], "Completed");

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/tasks/{task_id}"),
            Some(alice),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, all) = send(&app, "GET", "/api/tasks", Some(alice), None).await;
        let (_, deleted) = send(&app, "GET", "/api/tasks/deleted", Some(alice), None).await;
        assert!(all.as_array().unwrap().is_empty());
        assert_eq!(deleted[0]["id"], task_id.as_str());

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/tasks/{task_id}/restore"),
            Some(alice),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, all) = send(&app, "GET", "/api/tasks", Some(alice), None).await;
        assert_eq!(all.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_assignment_notification_is_delivered_and_marked_read() {
        let app = create_test_app();
        let alice = create_test_user(&app, "alice").await;
        let bob = create_test_user(&app, "bob").await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/tasks",
            Some(alice),
            Some(json!({
                "title": "Review budget",
                "due_date": "2024-06-15T10:30:00Z",
                "assigned_to": bob
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let mut unread = Value::Null;
        for _ in 0..100 {
            (_, unread) = send(&app, "GET", "/api/notifications/unread", Some(bob), None).await;
            if unread.as_array().is_some_and(|items| !items.is_empty()) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let items = unread.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0]["message"],
            "You have been assigned to task: Review budget"
        );
        assert_eq!(items[0]["task_title"], "Review budget");

        let notification_id = items[0]["id"].as_str().unwrap().to_string();
        let (status, read) = send(
            &app,
            "PUT",
            &format!("/api/notifications/{notification_id}/read"),
            Some(bob),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(read["is_read"], true);

        let (_, unread) = send(&app, "GET", "/api/notifications/unread", Some(bob), None).await;
        let (_, all) = send(&app, "GET", "/api/notifications", Some(bob), None).await;
        assert!(unread.as_array().unwrap().is_empty());
        assert_eq!(all.as_array().unwrap().len(), 1);

        let (alice_status, alice_items) =
            send(&app, "GET", "/api/notifications", Some(alice), None).await;
        assert_eq!(alice_status, StatusCode::OK);
        assert!(alice_items.as_array().unwrap().is_empty());
    }

    fn create_test_app() -> Router {
        create_app(test_state())
    }
}
