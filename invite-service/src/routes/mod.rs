use axum::{
    extract::Request,
    middleware,
    routing::{delete, get, post},
    Router,
};
use log::{info, warn};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::{
    access_handlers::{add_user, get_allowed_users, remove_user, stream_allowed_users},
    editor_handlers::{
        add_image_element, add_text_element, apply_preset, bring_to_front, close_session,
        delete_element, export_png, get_session, open_session, preview_svg, save_session,
        select_element, send_to_back, update_canvas, update_element,
    },
    event_handlers::{create_event, delete_event, get_event, get_event_summary, get_events},
    expense_handlers::{create_expense, delete_expense, get_expenses, update_expense},
    guest_handlers::{
        add_guest, delete_guest, get_guests, get_share_payload, stream_guests, update_guest,
    },
    inspiration_handlers::{add_inspiration, delete_inspiration, get_inspirations},
    public_handlers::{get_card_png, get_card_svg, get_invitation},
    task_handlers::{create_task, delete_task, get_tasks, update_task},
    template_handlers::get_template,
};
use crate::state::AppState;
use partyplanner_shared::auth::auth_middleware;
use partyplanner_shared::config::{AppConfig, ConfigError};
use partyplanner_shared::render::HttpImageFetcher;
use partyplanner_shared::store::{dynamo::DynamoStore, AppStore};

/// Creates a router with the default store
pub async fn create_router(config: &AppConfig) -> Result<Router, ConfigError> {
    info!("Creating router with DynamoDB store");

    let dynamo_store = Arc::new(DynamoStore::new(config.table_name.clone()).await);

    info!("Using API route prefix: {}", config.route_prefix);
    create_router_with_store(dynamo_store, config)
}

/// Creates a router with a given store implementation. Images referenced by
/// templates are fetched over HTTP from the configured hosts, relative paths
/// against the public base URL.
pub fn create_router_with_store<S>(store: Arc<S>, config: &AppConfig) -> Result<Router, ConfigError>
where
    S: AppStore + 'static,
{
    let images = Arc::new(HttpImageFetcher::new(
        Some(&config.public_base_url),
        &config.image_hosts,
    ));
    let state = AppState::new(store, images, &config.public_base_url)
        .with_jwt_secret(config.jwt_secret()?)
        .with_session_idle_ttl(config.editor_idle_ttl);
    Ok(create_router_with_state(state, &config.route_prefix))
}

pub fn create_router_with_state<S>(state: AppState<S>, prefix: &str) -> Router
where
    S: AppStore + 'static,
{
    info!("Setting up API routes with prefix: '{}'", prefix);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Logging middleware to trace all requests
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

    // Event-scoped routes (require a signed-in user)
    let event_routes = Router::new()
        .route("/events", get(get_events).post(create_event))
        .route("/events/:id", get(get_event).delete(delete_event))
        .route("/events/:id/guests", get(get_guests).post(add_guest))
        .route("/events/:id/guests/stream", get(stream_guests))
        .route(
            "/events/:id/guests/:guest_id",
            axum::routing::patch(update_guest).delete(delete_guest),
        )
        .route("/events/:id/guests/:guest_id/share", get(get_share_payload))
        .route("/events/:id/access", get(get_allowed_users).post(add_user))
        .route("/events/:id/access/stream", get(stream_allowed_users))
        .route("/events/:id/access/:uid", delete(remove_user))
        .route("/events/:id/summary", get(get_event_summary))
        .route("/events/:id/tasks", get(get_tasks).post(create_task))
        .route(
            "/events/:id/tasks/:task_id",
            axum::routing::patch(update_task).delete(delete_task),
        )
        .route("/events/:id/expenses", get(get_expenses).post(create_expense))
        .route(
            "/events/:id/expenses/:expense_id",
            axum::routing::patch(update_expense).delete(delete_expense),
        )
        .route(
            "/events/:id/inspirations",
            get(get_inspirations).post(add_inspiration),
        )
        .route(
            "/events/:id/inspirations/:inspiration_id",
            delete(delete_inspiration),
        )
        .route("/events/:id/template", get(get_template))
        .route("/events/:id/editor", post(open_session));

    // Editor session routes
    let editor_routes = Router::new()
        .route("/editor/:sid", get(get_session).delete(close_session))
        .route("/editor/:sid/elements/text", post(add_text_element))
        .route("/editor/:sid/elements/image", post(add_image_element))
        .route(
            "/editor/:sid/elements/:element_id",
            axum::routing::patch(update_element).delete(delete_element),
        )
        .route("/editor/:sid/elements/:element_id/front", post(bring_to_front))
        .route("/editor/:sid/elements/:element_id/back", post(send_to_back))
        .route("/editor/:sid/select", post(select_element))
        .route("/editor/:sid/canvas", axum::routing::patch(update_canvas))
        .route("/editor/:sid/preset", post(apply_preset))
        .route("/editor/:sid/save", post(save_session))
        .route("/editor/:sid/preview.svg", get(preview_svg))
        .route("/editor/:sid/export.png", get(export_png));

    let private_routes = event_routes
        .merge(editor_routes)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.auth),
            auth_middleware,
        ));

    // Public invitation routes (no auth)
    let public_routes = Router::new()
        .route("/invite/:guest_id", get(get_invitation))
        .route("/invite/:guest_id/card.svg", get(get_card_svg))
        .route("/invite/:guest_id/card.png", get(get_card_png));

    let api_routes = private_routes.merge(public_routes).with_state(state);

    let router = if prefix.is_empty() {
        // For tests or when no prefix is needed, don't nest the routes
        api_routes
            .layer(cors)
            .layer(middleware::from_fn(logging_middleware))
    } else {
        Router::new()
            .nest(prefix, api_routes)
            .layer(cors)
            .layer(middleware::from_fn(logging_middleware))
    };

    info!(
        "Router configured with all routes and middleware under prefix: '{}'",
        prefix
    );

    // Add a fallback handler for 404s
    router.fallback(|req: Request| async move {
        warn!("No route matched for: {} {}", req.method(), req.uri());
        (
            axum::http::StatusCode::NOT_FOUND,
            "The requested resource was not found".to_string(),
        )
    })
}
