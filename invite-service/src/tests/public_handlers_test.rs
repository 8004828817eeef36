use axum::http::StatusCode;
use partyplanner_shared::auth::public_test_request;
use partyplanner_shared::invite::{default_template, InviteElement, TextContent};
use partyplanner_shared::store::TemplateStore;
use partyplanner_shared::test_utils::http_test_utils::{
    response_to_bytes, response_to_json, response_to_string,
};
use partyplanner_shared::test_utils::mock_store::MockStore;
use serde_json::json;
use tower::ServiceExt;

use super::{create_test_app, seed_event, seed_guest, BASE_URL, OWNER};

async fn seed_card(store: &MockStore, image_url: Option<&str>) {
    let mut template = default_template();
    template.elements = vec![InviteElement::text(
        "hello",
        3,
        TextContent {
            text: "Olá {{guestName}}, dia {{eventDate}} em {{eventLocal}}".into(),
            ..Default::default()
        },
    )
    .with_box(20.0, 20.0, 560.0, 120.0)];
    if let Some(url) = image_url {
        template.elements.push(InviteElement::image("pic", 4, url));
    }
    store.put_template("ev-1", &template).await.unwrap();
}

#[tokio::test]
async fn test_public_invitation_view() {
    let (app, store) = create_test_app();
    seed_event(&store, "ev-1", OWNER, Some("Rua A, 10")).await;
    seed_guest(&store, "ev-1", "g-1", "Ana").await;
    seed_card(&store, None).await;

    let response = app
        .oneshot(public_test_request("GET", "/invite/g-1?viewport=300", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_to_json(response).await;
    assert_eq!(body["guest"]["name"], "Ana");
    assert_eq!(body["event"]["formattedDate"], "20 de março de 2025");
    assert_eq!(
        body["mapLink"],
        "https://www.google.com/maps/search/?api=1&query=Rua+A%2C+10"
    );
    assert_eq!(body["share"]["url"], format!("{}/invite/g-1", BASE_URL));
    // compact public viewport scales the card
    assert_eq!(body["card"]["transform"]["scale"], 0.5);
    // the guest index is read exactly once per resolution
    assert_eq!(store.guest_index_reads(), 1);
}

#[tokio::test]
async fn test_card_svg_substitutes_tokens() {
    let (app, store) = create_test_app();
    seed_event(&store, "ev-1", OWNER, None).await;
    seed_guest(&store, "ev-1", "g-1", "Ana").await;
    seed_card(&store, None).await;

    let response = app
        .oneshot(public_test_request("GET", "/invite/g-1/card.svg", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let svg = response_to_string(response).await;
    assert!(svg.contains("Olá Ana, dia 20 de março de 2025 em"));
    assert!(!svg.contains("{{"));
    assert!(!svg.contains("undefined"));
    assert!(!svg.contains("stroke-dasharray"));
}

#[tokio::test]
async fn test_unknown_guest_is_not_found() {
    let (app, _store) = create_test_app();

    for path in ["/invite/nobody", "/invite/nobody/card.svg", "/invite/nobody/card.png"] {
        let response = app
            .clone()
            .oneshot(public_test_request("GET", path, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response_to_json(response).await["error"], "Convite não encontrado.");
    }
}

#[tokio::test]
async fn test_missing_template_falls_back_to_default() {
    let (app, store) = create_test_app();
    seed_event(&store, "ev-1", OWNER, None).await;
    seed_guest(&store, "ev-1", "g-1", "Ana").await;

    let response = app
        .oneshot(public_test_request("GET", "/invite/g-1", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_to_json(response).await;
    assert_eq!(body["template"]["elements"].as_array().unwrap().len(), 5);
    assert_eq!(body["mapLink"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_legacy_card_is_served_as_canvas() {
    let (app, store) = create_test_app();
    seed_event(&store, "ev-1", OWNER, None).await;
    seed_guest(&store, "ev-1", "g-1", "Ana").await;
    store.insert_raw_template(
        "ev-1",
        json!({ "baseColor": "#fef3c7", "font": "fun", "titleColor": "#b45309" }),
    );

    let response = app
        .oneshot(public_test_request("GET", "/invite/g-1/card.svg", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let svg = response_to_string(response).await;
    assert!(svg.contains("Festa da Bia"));
    assert!(svg.contains("#fef3c7"));
}

#[tokio::test]
async fn test_card_png_download() {
    let (app, store) = create_test_app();
    seed_event(&store, "ev-1", OWNER, None).await;
    seed_guest(&store, "ev-1", "g-1", "Ana").await;
    seed_card(&store, Some("https://cdn.example/ok.png")).await;

    let response = app
        .oneshot(public_test_request("GET", "/invite/g-1/card.png", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    assert!(response.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .contains("filename=\"convite-Ana.png\""));

    let png = response_to_bytes(response).await;
    // pixel ratio 3 on a 600x800 canvas
    assert_eq!(u32::from_be_bytes([png[16], png[17], png[18], png[19]]), 1800);
    assert_eq!(u32::from_be_bytes([png[20], png[21], png[22], png[23]]), 2400);
}

#[tokio::test]
async fn test_card_png_image_failure() {
    let (app, store) = create_test_app();
    seed_event(&store, "ev-1", OWNER, None).await;
    seed_guest(&store, "ev-1", "g-1", "Ana").await;
    seed_card(&store, Some("https://cdn.example/broken.png")).await;

    let response = app
        .oneshot(public_test_request("GET", "/invite/g-1/card.png", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(response_to_json(response).await["error"], "Erro ao exportar convite.");
}
