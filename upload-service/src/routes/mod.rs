use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware,
    routing::post,
    Router,
};
use log::{info, warn};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::upload_handlers::upload_file;
use crate::media::CloudinaryClient;
use crate::state::AppState;
use partyplanner_shared::config::AppConfig;

/// Creates a router backed by the configured Cloudinary account
pub fn create_router(config: &AppConfig) -> Router {
    info!("Creating router with Cloudinary media host");
    if !config.cloudinary.is_complete() {
        warn!("Cloudinary credentials are incomplete, uploads will fail");
    }

    let media = Arc::new(CloudinaryClient::new(config.cloudinary.clone()));

    info!("Using API route prefix: {}", config.route_prefix);
    create_router_with_state(AppState::new(media), &config.route_prefix)
}

pub fn create_router_with_state(state: AppState, prefix: &str) -> Router {
    info!("Setting up API routes with prefix: '{}'", prefix);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    async fn logging_middleware(
        req: Request,
        next: axum::middleware::Next,
    ) -> impl axum::response::IntoResponse {
        info!(
            "Router received request: method={}, uri={}",
            req.method(),
            req.uri()
        );
        next.run(req).await
    }

    let api_routes = Router::new()
        .route(
            "/upload",
            post(upload_file).layer(DefaultBodyLimit::disable()),
        )
        .with_state(state);

    let router = if prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(prefix, api_routes)
    }
    .layer(cors)
    .layer(middleware::from_fn(logging_middleware));

    router.fallback(|req: Request| async move {
        warn!("No route matched for: {} {}", req.method(), req.uri());
        (
            axum::http::StatusCode::NOT_FOUND,
            "The requested resource was not found".to_string(),
        )
    })
}
