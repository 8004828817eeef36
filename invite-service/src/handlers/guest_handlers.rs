use axum::{
    extract::{Extension, Path, State},
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, Stream, StreamExt};
use log::{error, info};
use partyplanner_shared::models::{now_millis, Guest, MessageResponse};
use partyplanner_shared::share::SharePayload;
use partyplanner_shared::store::AppStore;
use std::convert::Infallible;
use uuid::Uuid;

use super::load_viewable_event;
use crate::error::{AppError, Result};
use crate::models::{AddGuestRequest, UpdateGuestRequest};
use crate::state::AppState;

/// Pushes the event's current guest list to its subscribers. Reads are
/// serialised per event, so concurrent writes cannot leave subscribers on an
/// older list. A failed read costs subscribers one update and is only logged.
async fn publish_guests<S: AppStore>(state: &AppState<S>, event_id: &str) {
    let store = state.store.as_ref();
    if let Err(e) = state
        .guest_hub
        .refresh(event_id, || store.get_guests(event_id))
        .await
    {
        error!("Failed to refresh guest list of event {}: {}", event_id, e);
    }
}

// GET /events/:id/guests
pub async fn get_guests<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: AppStore,
{
    load_viewable_event(state.store.as_ref(), &id, &user_id).await?;
    let guests = state.store.get_guests(&id).await?;
    Ok(Json(serde_json::json!({ "guests": guests })))
}

// POST /events/:id/guests
pub async fn add_guest<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<AddGuestRequest>,
) -> Result<Json<Guest>>
where
    S: AppStore,
{
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("Guest name is required.".into()));
    }
    load_viewable_event(state.store.as_ref(), &id, &user_id).await?;

    let guest = Guest {
        id: Uuid::new_v4().to_string(),
        event_id: id.clone(),
        name: name.to_string(),
        kind: payload.kind.unwrap_or_default(),
        created_at: now_millis(),
    };
    let guest = state.store.add_guest(guest).await?;
    info!("Added guest {} to event {}", guest.id, id);

    publish_guests(&state, &id).await;
    Ok(Json(guest))
}

// PATCH /events/:id/guests/:guest_id
pub async fn update_guest<S>(
    State(state): State<AppState<S>>,
    Path((id, guest_id)): Path<(String, String)>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<UpdateGuestRequest>,
) -> Result<Json<Guest>>
where
    S: AppStore,
{
    load_viewable_event(state.store.as_ref(), &id, &user_id).await?;
    let mut guest = state.store.get_guest(&id, &guest_id).await?;

    if let Some(name) = payload.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("Guest name cannot be empty.".into()));
        }
        guest.name = name.to_string();
    }
    if let Some(kind) = payload.kind {
        guest.kind = kind;
    }

    let guest = state.store.update_guest(guest).await?;
    publish_guests(&state, &id).await;
    Ok(Json(guest))
}

// DELETE /events/:id/guests/:guest_id
pub async fn delete_guest<S>(
    State(state): State<AppState<S>>,
    Path((id, guest_id)): Path<(String, String)>,
    Extension(user_id): Extension<String>,
) -> Result<Json<MessageResponse>>
where
    S: AppStore,
{
    load_viewable_event(state.store.as_ref(), &id, &user_id).await?;
    state.store.get_guest(&id, &guest_id).await?;
    state.store.delete_guest(&id, &guest_id).await?;
    info!("Removed guest {} from event {}", guest_id, id);

    publish_guests(&state, &id).await;
    Ok(Json(MessageResponse {
        message: "Guest removed".into(),
    }))
}

// GET /events/:id/guests/:guest_id/share
pub async fn get_share_payload<S>(
    State(state): State<AppState<S>>,
    Path((id, guest_id)): Path<(String, String)>,
    Extension(user_id): Extension<String>,
) -> Result<Json<SharePayload>>
where
    S: AppStore,
{
    let event = load_viewable_event(state.store.as_ref(), &id, &user_id).await?;
    let guest = state.store.get_guest(&id, &guest_id).await?;
    Ok(Json(SharePayload::for_invitation(
        &event.name,
        &guest.id,
        &state.public_base_url,
    )))
}

// GET /events/:id/guests/stream
pub async fn stream_guests<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Sse<impl Stream<Item = std::result::Result<SseEvent, Infallible>>>>
where
    S: AppStore,
{
    load_viewable_event(state.store.as_ref(), &id, &user_id).await?;

    // Subscribe before reading so no write between the two is missed
    let updates = state.guest_hub.subscribe(&id);
    let current = state.store.get_guests(&id).await?;
    info!("Guest stream opened for event {} by {}", id, user_id);

    Ok(snapshot_stream(current, updates))
}

/// Server-sent events carrying `initial` and then every published snapshot.
/// The subscription is dropped, and so unregistered, with the response body.
pub(crate) fn snapshot_stream<T, U>(
    initial: T,
    updates: U,
) -> Sse<impl Stream<Item = std::result::Result<SseEvent, Infallible>>>
where
    T: serde::Serialize + Send + 'static,
    U: Stream<Item = T> + Send + 'static,
{
    let events = stream::once(async move { initial })
        .chain(updates)
        .map(|snapshot| {
            let event = SseEvent::default()
                .event("snapshot")
                .json_data(&snapshot)
                .unwrap_or_else(|e| {
                    error!("Failed to encode snapshot: {}", e);
                    SseEvent::default().event("error")
                });
            Ok::<_, Infallible>(event)
        });

    Sse::new(events).keep_alive(KeepAlive::default())
}
