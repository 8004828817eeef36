use axum::body::Body;
use axum::http::StatusCode;
use http_body_util::BodyExt;
use partyplanner_shared::auth::create_test_request;
use partyplanner_shared::store::GuestStore;
use partyplanner_shared::test_utils::http_test_utils::response_to_json;
use serde_json::json;
use std::time::Duration;
use tower::ServiceExt;

use super::{create_test_app, seed_event, seed_guest, BASE_URL, OWNER};

/// Reads the next non-empty data frame of a streaming body as text
async fn next_chunk(body: &mut Body) -> String {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
            .await
            .expect("timed out waiting for an event")
            .expect("stream ended")
            .expect("body error");
        if let Ok(data) = frame.into_data() {
            if !data.is_empty() {
                return String::from_utf8(data.to_vec()).unwrap();
            }
        }
    }
}

#[tokio::test]
async fn test_add_and_list_guests() {
    let (app, store) = create_test_app();
    seed_event(&store, "ev-1", OWNER, None).await;

    let response = app
        .clone()
        .oneshot(create_test_request(
            "POST",
            "/events/ev-1/guests",
            OWNER,
            Some(json!({ "name": "Ana", "type": "child" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let guest = response_to_json(response).await;
    assert_eq!(guest["name"], "Ana");
    assert_eq!(guest["type"], "child");
    assert_eq!(guest["eventId"], "ev-1");

    // public link resolution goes through the guest index
    let guest_id = guest["id"].as_str().unwrap();
    assert_eq!(
        store.find_guest_event(guest_id).await.unwrap().as_deref(),
        Some("ev-1")
    );

    let response = app
        .oneshot(create_test_request("GET", "/events/ev-1/guests", OWNER, None))
        .await
        .unwrap();
    let body = response_to_json(response).await;
    assert_eq!(body["guests"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_blank_guest_name_is_rejected() {
    let (app, store) = create_test_app();
    seed_event(&store, "ev-1", OWNER, None).await;

    let response = app
        .oneshot(create_test_request(
            "POST",
            "/events/ev-1/guests",
            OWNER,
            Some(json!({ "name": "   " })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(store.get_guests("ev-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_and_delete_guest() {
    let (app, store) = create_test_app();
    seed_event(&store, "ev-1", OWNER, None).await;
    seed_guest(&store, "ev-1", "g-1", "Ana").await;

    let response = app
        .clone()
        .oneshot(create_test_request(
            "PATCH",
            "/events/ev-1/guests/g-1",
            OWNER,
            Some(json!({ "name": "Ana Clara" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.get_guest("ev-1", "g-1").await.unwrap().name, "Ana Clara");

    let response = app
        .clone()
        .oneshot(create_test_request("DELETE", "/events/ev-1/guests/g-1", OWNER, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.find_guest_event("g-1").await.unwrap(), None);

    let response = app
        .oneshot(create_test_request("DELETE", "/events/ev-1/guests/g-1", OWNER, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_share_payload() {
    let (app, store) = create_test_app();
    seed_event(&store, "ev-1", OWNER, None).await;
    seed_guest(&store, "ev-1", "g-1", "Ana").await;

    let response = app
        .oneshot(create_test_request(
            "GET",
            "/events/ev-1/guests/g-1/share",
            OWNER,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_to_json(response).await;
    assert_eq!(body["title"], "Convite: Festa da Bia");
    assert_eq!(body["text"], "Você foi convidado para Festa da Bia!");
    assert_eq!(body["url"], format!("{}/invite/g-1", BASE_URL));
}

#[tokio::test]
async fn test_guest_stream_sends_snapshots() {
    let (app, store) = create_test_app();
    seed_event(&store, "ev-1", OWNER, None).await;
    seed_guest(&store, "ev-1", "g-1", "Ana").await;

    let response = app
        .clone()
        .oneshot(create_test_request("GET", "/events/ev-1/guests/stream", OWNER, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );
    let mut body = response.into_body();

    let first = next_chunk(&mut body).await;
    assert!(first.contains("event: snapshot"));
    assert!(first.contains("\"Ana\""));

    let response = app
        .oneshot(create_test_request(
            "POST",
            "/events/ev-1/guests",
            OWNER,
            Some(json!({ "name": "Bruno" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let second = next_chunk(&mut body).await;
    assert!(second.contains("\"Bruno\""));
    assert!(second.contains("\"Ana\""));
}

#[tokio::test]
async fn test_stream_requires_access() {
    let (app, store) = create_test_app();
    seed_event(&store, "ev-1", OWNER, None).await;

    let response = app
        .oneshot(create_test_request(
            "GET",
            "/events/ev-1/guests/stream",
            "stranger",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
