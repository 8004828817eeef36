use axum::{
    extract::{Extension, Path, State},
    response::sse::{Event as SseEvent, Sse},
    Json,
};
use futures::stream::Stream;
use log::{error, info};
use partyplanner_shared::access::{add_allowed_user, remove_allowed_user};
use partyplanner_shared::models::{AllowedUser, MessageResponse};
use partyplanner_shared::store::AppStore;
use std::convert::Infallible;

use super::guest_handlers::snapshot_stream;
use super::load_viewable_event;
use crate::error::Result;
use crate::models::AddAllowedUserRequest;
use crate::state::AppState;

async fn publish_allowed<S: AppStore>(state: &AppState<S>, event_id: &str) {
    let store = state.store.as_ref();
    if let Err(e) = state
        .access_hub
        .refresh(event_id, || store.get_allowed_users(event_id))
        .await
    {
        error!("Failed to refresh allow-list of event {}: {}", event_id, e);
    }
}

// GET /events/:id/access
pub async fn get_allowed_users<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: AppStore,
{
    let event = load_viewable_event(state.store.as_ref(), &id, &user_id).await?;
    let users = state.store.get_allowed_users(&id).await?;
    Ok(Json(serde_json::json!({
        "ownerId": event.owner_id,
        "users": users
    })))
}

// POST /events/:id/access
pub async fn add_user<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<AddAllowedUserRequest>,
) -> Result<Json<AllowedUser>>
where
    S: AppStore,
{
    let entry = add_allowed_user(state.store.as_ref(), &user_id, &id, &payload.email).await?;
    publish_allowed(&state, &id).await;
    Ok(Json(entry))
}

// DELETE /events/:id/access/:uid
pub async fn remove_user<S>(
    State(state): State<AppState<S>>,
    Path((id, uid)): Path<(String, String)>,
    Extension(user_id): Extension<String>,
) -> Result<Json<MessageResponse>>
where
    S: AppStore,
{
    remove_allowed_user(state.store.as_ref(), &user_id, &id, &uid).await?;
    publish_allowed(&state, &id).await;
    Ok(Json(MessageResponse {
        message: "Access removed".into(),
    }))
}

// GET /events/:id/access/stream
pub async fn stream_allowed_users<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Sse<impl Stream<Item = std::result::Result<SseEvent, Infallible>>>>
where
    S: AppStore,
{
    load_viewable_event(state.store.as_ref(), &id, &user_id).await?;

    let updates = state.access_hub.subscribe(&id);
    let current = state.store.get_allowed_users(&id).await?;
    info!("Allow-list stream opened for event {} by {}", id, user_id);

    Ok(snapshot_stream(current, updates))
}
