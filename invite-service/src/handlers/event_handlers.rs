use axum::{
    extract::{Extension, Path, State},
    Json,
};
use chrono::{Datelike, NaiveDate};
use log::{info, warn};
use partyplanner_shared::models::{now_millis, Event, MessageResponse};
use partyplanner_shared::planning::EventSummary;
use partyplanner_shared::store::AppStore;
use std::collections::HashSet;
use uuid::Uuid;

use super::load_viewable_event;
use crate::error::{AppError, Result};
use crate::models::{CreateEventRequest, EventResponse};
use crate::state::AppState;

// GET /events
pub async fn get_events<S>(
    State(state): State<AppState<S>>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: AppStore,
{
    let mut events = state.store.get_events_by_owner(&user_id).await?;
    let shared = state.store.get_events_shared_with(&user_id).await?;

    let mut seen: HashSet<String> = events.iter().map(|e| e.id.clone()).collect();
    events.extend(shared.into_iter().filter(|e| seen.insert(e.id.clone())));
    events.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let events: Vec<_> = events
        .into_iter()
        .map(|e| EventResponse::new(e, &user_id))
        .collect();

    Ok(Json(serde_json::json!({ "events": events })))
}

// POST /events
pub async fn create_event<S>(
    State(state): State<AppState<S>>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<Json<EventResponse>>
where
    S: AppStore,
{
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("Event name is required.".into()));
    }
    let date = payload.date.trim();
    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request("Event date must be YYYY-MM-DD.".into()))?;

    let event = Event {
        id: Uuid::new_v4().to_string(),
        owner_id: user_id.clone(),
        name: name.to_string(),
        year: payload.year.unwrap_or_else(|| parsed.year()),
        date: date.to_string(),
        location: payload
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty()),
        budget: payload.budget,
        created_at: now_millis(),
    };

    let event = state.store.create_event(event).await?;
    info!(
        "Created event {} for user {} (year {})",
        event.id,
        user_id,
        event.year
    );

    Ok(Json(EventResponse::new(event, &user_id)))
}

// GET /events/:id
pub async fn get_event<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<EventResponse>>
where
    S: AppStore,
{
    let event = load_viewable_event(state.store.as_ref(), &id, &user_id).await?;
    Ok(Json(EventResponse::new(event, &user_id)))
}

// GET /events/:id/summary
pub async fn get_event_summary<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<EventSummary>>
where
    S: AppStore,
{
    let event = load_viewable_event(state.store.as_ref(), &id, &user_id).await?;
    let store = state.store.as_ref();
    let (guests, tasks, expenses, inspirations) = tokio::try_join!(
        store.get_guests(&id),
        store.get_tasks(&id),
        store.get_expenses(&id),
        store.get_inspirations(&id),
    )?;
    Ok(Json(EventSummary::new(
        &event,
        &guests,
        &tasks,
        &expenses,
        inspirations.len(),
    )))
}

// DELETE /events/:id
pub async fn delete_event<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<MessageResponse>>
where
    S: AppStore,
{
    let event = state.store.get_event(&id).await?;
    if !event.is_owned_by(&user_id) {
        warn!("User {} tried to delete event {} they do not own", user_id, id);
        return Err(AppError::forbidden(
            "Only the event owner can delete it.".into(),
        ));
    }

    state.store.delete_event(&id).await?;
    state.sessions.close_event(&id);

    info!("Deleted event {} for owner {}", id, user_id);
    Ok(Json(MessageResponse {
        message: "Event deleted".into(),
    }))
}
