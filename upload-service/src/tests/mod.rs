
use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::Router;
use partyplanner_shared::test_utils::test_logging::init_test_logging;
use std::sync::{Arc, Mutex};

use crate::media::{MediaError, MediaFile, MediaHost, UploadedMedia};
use crate::routes::create_router_with_state;
use crate::state::AppState;

pub const BOUNDARY: &str = "partyplanner-test-boundary";

/// Records every file it receives; fails when `fail` is set
#[derive(Default)]
pub struct FakeMediaHost {
    pub fail: bool,
    pub received: Mutex<Vec<MediaFile>>,
}

#[async_trait]
impl MediaHost for FakeMediaHost {
    async fn upload(&self, file: MediaFile) -> Result<UploadedMedia, MediaError> {
        if self.fail {
            return Err(MediaError::Upload("HTTP 500: cdn down".into()));
        }
        let n = {
            let mut received = self.received.lock().unwrap();
            received.push(file);
            received.len()
        };
        Ok(UploadedMedia {
            secure_url: format!("https://res.cloudinary.com/demo/image/upload/events/file-{}.png", n),
            public_id: format!("events/file-{}", n),
        })
    }
}

pub fn create_test_app(host: FakeMediaHost) -> (Router, Arc<FakeMediaHost>) {
    init_test_logging();
    let host = Arc::new(host);
    let app = create_router_with_state(AppState::new(host.clone()), "");
    (app, host)
}

/// Builds a multipart/form-data upload with one part per `(name, filename, bytes)`
pub fn multipart_request(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: image/png\r\n\r\n",
                    name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}
