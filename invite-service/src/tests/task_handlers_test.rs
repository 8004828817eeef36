use axum::http::StatusCode;
use axum::Router;
use partyplanner_shared::auth::create_test_request;
use partyplanner_shared::models::TaskStatus;
use partyplanner_shared::store::TaskStore;
use partyplanner_shared::test_utils::http_test_utils::response_to_json;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::{create_test_app, seed_event, OWNER};

async fn call(app: &Router, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(create_test_request(method, path, OWNER, body))
        .await
        .unwrap();
    let status = response.status();
    (status, response_to_json(response).await)
}

#[tokio::test]
async fn test_create_task_defaults() {
    let (app, store) = create_test_app();
    seed_event(&store, "ev-1", OWNER, None).await;

    let (status, task) = call(
        &app,
        "POST",
        "/events/ev-1/tasks",
        Some(json!({ "name": "  Comprar balões ", "dueDate": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["name"], "Comprar balões");
    assert_eq!(task["category"], "geral");
    assert_eq!(task["status"], "pending");
    assert_eq!(task["dueDate"], Value::Null);
    assert_eq!(store.get_tasks("ev-1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_task_validation() {
    let (app, store) = create_test_app();
    seed_event(&store, "ev-1", OWNER, None).await;

    let (status, body) = call(&app, "POST", "/events/ev-1/tasks", Some(json!({ "name": " " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Task name is required.");

    let (status, body) = call(
        &app,
        "POST",
        "/events/ev-1/tasks",
        Some(json!({ "name": "Bolo", "dueDate": "20/03/2025" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Due date must be YYYY-MM-DD.");
    assert!(store.get_tasks("ev-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_progress_follows_status_updates() {
    let (app, store) = create_test_app();
    seed_event(&store, "ev-1", OWNER, None).await;

    let (_, first) = call(&app, "POST", "/events/ev-1/tasks", Some(json!({ "name": "Bolo" }))).await;
    call(
        &app,
        "POST",
        "/events/ev-1/tasks",
        Some(json!({ "name": "Convites", "category": "papelaria", "dueDate": "2025-03-01" })),
    )
    .await;

    let task_id = first["id"].as_str().unwrap();
    let (status, updated) = call(
        &app,
        "PATCH",
        &format!("/events/ev-1/tasks/{}", task_id),
        Some(json!({ "status": "done", "dueDate": "2025-03-10" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "done");
    assert_eq!(updated["dueDate"], "2025-03-10");
    assert_eq!(
        store.get_task("ev-1", task_id).await.unwrap().status,
        TaskStatus::Done
    );

    let (_, body) = call(&app, "GET", "/events/ev-1/tasks", None).await;
    assert_eq!(body["tasks"].as_array().unwrap().len(), 2);
    assert_eq!(body["progress"], json!({ "done": 1, "total": 2, "percent": 50 }));

    // an empty due date clears it
    let (_, cleared) = call(
        &app,
        "PATCH",
        &format!("/events/ev-1/tasks/{}", task_id),
        Some(json!({ "dueDate": "" })),
    )
    .await;
    assert_eq!(cleared["dueDate"], Value::Null);
}

#[tokio::test]
async fn test_delete_task() {
    let (app, store) = create_test_app();
    seed_event(&store, "ev-1", OWNER, None).await;
    let (_, task) = call(&app, "POST", "/events/ev-1/tasks", Some(json!({ "name": "Bolo" }))).await;
    let path = format!("/events/ev-1/tasks/{}", task["id"].as_str().unwrap());

    let (status, _) = call(&app, "DELETE", &path, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(store.get_tasks("ev-1").await.unwrap().is_empty());

    let (status, _) = call(&app, "DELETE", &path, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tasks_need_event_access() {
    let (app, store) = create_test_app();
    seed_event(&store, "ev-1", OWNER, None).await;

    let response = app
        .oneshot(create_test_request(
            "POST",
            "/events/ev-1/tasks",
            "stranger",
            Some(json!({ "name": "Bolo" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(store.get_tasks("ev-1").await.unwrap().is_empty());
}
