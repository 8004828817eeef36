use axum::body::{Body, Bytes};
use axum::response::Response;
use http_body_util::BodyExt;

pub async fn response_to_bytes(response: Response<Body>) -> Bytes {
    response
        .into_body()
        .collect()
        .await
        .expect("failed to read response body")
        .to_bytes()
}

pub async fn response_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response_to_bytes(response).await;
    serde_json::from_slice(&bytes).expect("response body is not JSON")
}

pub async fn response_to_string(response: Response<Body>) -> String {
    let bytes = response_to_bytes(response).await;
    String::from_utf8(bytes.to_vec()).expect("response body is not UTF-8")
}
