use axum::http::StatusCode;
use axum::Router;
use partyplanner_shared::auth::create_test_request;
use partyplanner_shared::models::Event;
use partyplanner_shared::store::{EventStore, ExpenseStore};
use partyplanner_shared::test_utils::http_test_utils::response_to_json;
use partyplanner_shared::test_utils::mock_store::MockStore;
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

async fn seed_budgeted_event(store: &MockStore, budget: f64) {
    store
        .create_event(Event {
            id: "ev-1".into(),
            owner_id: OWNER.into(),
            name: "Festa da Bia".into(),
            year: 2025,
            date: "2025-03-20".into(),
            location: None,
            budget: Some(budget),
            created_at: 1_700_000_000_000,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_expenses_are_checked_against_budget() {
    let (app, store) = create_test_app();
    seed_budgeted_event(&store, 300.0).await;

    let (status, body) = call(
        &app,
        "POST",
        "/events/ev-1/expenses",
        Some(json!({ "item": "Bolo", "category": "comida", "value": 120.5, "date": "2025-03-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expense"]["item"], "Bolo");
    assert_eq!(body["summary"]["totalSpent"], 120.5);
    assert_eq!(body["summary"]["remaining"], 179.5);
    assert_eq!(body["summary"]["spentPercent"], 40);
    assert_eq!(body["summary"]["overBudget"], false);

    let (_, body) = call(
        &app,
        "POST",
        "/events/ev-1/expenses",
        Some(json!({ "item": "Balões", "value": 200, "date": "2025-03-02" })),
    )
    .await;
    assert_eq!(body["expense"]["category"], "geral");
    assert_eq!(body["summary"]["overBudget"], true);
    assert_eq!(body["summary"]["spentPercent"], 100);

    let (status, body) = call(&app, "GET", "/events/ev-1/expenses", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expenses"].as_array().unwrap().len(), 2);
    assert_eq!(body["summary"]["byCategory"], json!({ "comida": 120.5, "geral": 200.0 }));
    assert_eq!(body["summary"]["byDay"]["2025-03-02"], 200.0);
}

#[tokio::test]
async fn test_expense_validation() {
    let (app, store) = create_test_app();
    seed_event(&store, "ev-1", OWNER, None).await;

    for (payload, error) in [
        (json!({ "item": "", "value": 10, "date": "2025-03-01" }), "Expense item is required."),
        (
            json!({ "item": "Bolo", "value": 0, "date": "2025-03-01" }),
            "Expense value must be a positive amount.",
        ),
        (
            json!({ "item": "Bolo", "value": -3.5, "date": "2025-03-01" }),
            "Expense value must be a positive amount.",
        ),
        (json!({ "item": "Bolo", "value": 10 }), "Expense date must be YYYY-MM-DD."),
    ] {
        let (status, body) = call(&app, "POST", "/events/ev-1/expenses", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], error);
    }
    assert!(store.get_expenses("ev-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_and_delete_expense() {
    let (app, store) = create_test_app();
    seed_budgeted_event(&store, 100.0).await;
    let (_, body) = call(
        &app,
        "POST",
        "/events/ev-1/expenses",
        Some(json!({
            "item": "Bolo",
            "value": 50,
            "date": "2025-03-01",
            "imageUrl": "https://res.cloudinary.com/demo/recibo.jpg"
        })),
    )
    .await;
    let path = format!("/events/ev-1/expenses/{}", body["expense"]["id"].as_str().unwrap());

    let (status, body) = call(&app, "PATCH", &path, Some(json!({ "value": 75, "imageUrl": "" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expense"]["value"], 75.0);
    assert_eq!(body["expense"]["imageUrl"], Value::Null);
    assert_eq!(body["summary"]["spentPercent"], 75);

    let (status, _) = call(&app, "PATCH", &path, Some(json!({ "value": -1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, "DELETE", &path, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(store.get_expenses("ev-1").await.unwrap().is_empty());
    let (status, _) = call(&app, "PATCH", &path, Some(json!({ "value": 5 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
