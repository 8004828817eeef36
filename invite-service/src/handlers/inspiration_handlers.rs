use axum::{
    extract::{Extension, Path, State},
    Json,
};
use log::info;
use partyplanner_shared::models::{now_millis, Inspiration, MessageResponse};
use partyplanner_shared::store::AppStore;
use uuid::Uuid;

use super::load_viewable_event;
use crate::error::{AppError, Result};
use crate::models::AddInspirationRequest;
use crate::state::AppState;

// GET /events/:id/inspirations
pub async fn get_inspirations<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: AppStore,
{
    load_viewable_event(state.store.as_ref(), &id, &user_id).await?;
    let inspirations = state.store.get_inspirations(&id).await?;
    Ok(Json(serde_json::json!({ "inspirations": inspirations })))
}

// POST /events/:id/inspirations
pub async fn add_inspiration<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<AddInspirationRequest>,
) -> Result<Json<Inspiration>>
where
    S: AppStore,
{
    let image_url = payload.image_url.trim();
    if image_url.is_empty() {
        return Err(AppError::bad_request("Image URL is required.".into()));
    }
    load_viewable_event(state.store.as_ref(), &id, &user_id).await?;

    let inspiration = state
        .store
        .add_inspiration(Inspiration {
            id: Uuid::new_v4().to_string(),
            event_id: id.clone(),
            image_url: image_url.to_string(),
            created_at: now_millis(),
        })
        .await?;
    info!("Pinned inspiration {} to event {}", inspiration.id, id);
    Ok(Json(inspiration))
}

// DELETE /events/:id/inspirations/:inspiration_id
pub async fn delete_inspiration<S>(
    State(state): State<AppState<S>>,
    Path((id, inspiration_id)): Path<(String, String)>,
    Extension(user_id): Extension<String>,
) -> Result<Json<MessageResponse>>
where
    S: AppStore,
{
    load_viewable_event(state.store.as_ref(), &id, &user_id).await?;
    let pinned = state.store.get_inspirations(&id).await?;
    if !pinned.iter().any(|i| i.id == inspiration_id) {
        return Err(AppError::not_found("Inspiration not found".into()));
    }
    state.store.delete_inspiration(&id, &inspiration_id).await?;
    info!("Removed inspiration {} from event {}", inspiration_id, id);

    Ok(Json(MessageResponse {
        message: "Inspiration removed".into(),
    }))
}
