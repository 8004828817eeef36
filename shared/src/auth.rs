//! Bearer token authentication for the API routes.
//!
//! Tokens are HS256 JWTs issued by the identity provider; the `sub` claim is
//! the caller's user id and is handed to handlers as `Extension<String>`.
//! The verifying secret comes from configuration and reaches the middleware
//! as router state.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_JWT_SECRET;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 5;
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verifier for the development secret, used locally and in tests
    pub fn development() -> Self {
        Self::new(DEFAULT_JWT_SECRET)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding_key, &self.validation).map(|data| data.claims)
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

/// Extracts the bearer token from an `Authorization` header value
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Validates the caller's token and stores the user id as a request extension
pub async fn auth_middleware(
    State(verifier): State<Arc<JwtVerifier>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(header_value) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        debug!("Request without Authorization header: {}", req.uri());
        return unauthorized("Missing Authorization header");
    };

    let Some(token) = bearer_token(header_value) else {
        return unauthorized("Authorization header must be a Bearer token");
    };

    let claims = match verifier.verify(token) {
        Ok(claims) => claims,
        Err(e) => {
            warn!("Rejected token for {}: {}", req.uri(), e);
            return unauthorized("Invalid or expired token");
        }
    };

    if claims.sub.is_empty() {
        return unauthorized("Token has no subject");
    }

    req.extensions_mut().insert(claims.sub);
    next.run(req).await
}

/// Signs a token for `user_id` with the development secret, valid for an hour
#[cfg(any(test, feature = "test_utils"))]
pub fn create_test_token(user_id: &str) -> String {
    create_test_token_with(user_id, DEFAULT_JWT_SECRET)
}

#[cfg(any(test, feature = "test_utils"))]
pub fn create_test_token_with(user_id: &str, secret: &str) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        email: None,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to sign test token")
}

/// Authenticated request as `user_id`, with an optional JSON body
#[cfg(any(test, feature = "test_utils"))]
pub fn create_test_request(
    method: &str,
    path: &str,
    user_id: &str,
    body: Option<serde_json::Value>,
) -> axum::http::Request<axum::body::Body> {
    let builder = axum::http::Request::builder()
        .method(method)
        .uri(path)
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", create_test_token(user_id)),
        );
    with_body(builder, body)
}

/// Request without credentials
#[cfg(any(test, feature = "test_utils"))]
pub fn public_test_request(
    method: &str,
    path: &str,
    body: Option<serde_json::Value>,
) -> axum::http::Request<axum::body::Body> {
    with_body(axum::http::Request::builder().method(method).uri(path), body)
}

#[cfg(any(test, feature = "test_utils"))]
fn with_body(
    builder: axum::http::request::Builder,
    body: Option<serde_json::Value>,
) -> axum::http::Request<axum::body::Body> {
    use axum::body::Body;

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("failed to build test request")
}
