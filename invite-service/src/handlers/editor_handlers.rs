use axum::{
    extract::{Extension, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use log::{debug, error, info};
use partyplanner_shared::editor::EditorSession;
use partyplanner_shared::invite::{ElementPatch, Preset};
use partyplanner_shared::models::MessageResponse;
use partyplanner_shared::render::to_svg;
use partyplanner_shared::store::AppStore;
use uuid::Uuid;

use super::{load_template, load_viewable_event};
use crate::error::{AppError, Result};
use crate::models::{
    AddImageRequest, PresetRequest, SelectRequest, SessionResponse, UpdateCanvasRequest,
    ViewportQuery,
};
use crate::state::AppState;

const EXPORT_FAILED: &str = "Erro ao exportar imagem.";

fn session_not_found(sid: &str) -> AppError {
    AppError::not_found(format!("Editor session {} not found", sid))
}

fn session_json(sid: &str, session: &EditorSession) -> Result<Json<serde_json::Value>> {
    serde_json::to_value(SessionResponse::new(sid, session))
        .map(Json)
        .map_err(|e| AppError::internal_server_error(e.to_string()))
}

/// Runs `edit` against the caller's session and returns the updated view.
/// Sessions opened by other users are reported as missing.
fn edit_session<S, F>(
    state: &AppState<S>,
    sid: &str,
    user_id: &str,
    edit: F,
) -> Result<Json<serde_json::Value>>
where
    F: FnOnce(&mut EditorSession) -> Result<()>,
{
    state
        .sessions
        .with_session(sid, user_id, |session| {
            edit(session)?;
            session_json(sid, session)
        })
        .ok_or_else(|| session_not_found(sid))?
}

/// Copy of the caller's session, so slow work can run without holding it
fn snapshot_session<S>(state: &AppState<S>, sid: &str, user_id: &str) -> Result<EditorSession> {
    state
        .sessions
        .with_session(sid, user_id, |session| session.clone())
        .ok_or_else(|| session_not_found(sid))
}

// POST /events/:id/editor
pub async fn open_session<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: AppStore,
{
    load_viewable_event(state.store.as_ref(), &id, &user_id).await?;
    let template = load_template(state.store.as_ref(), &id).await?;

    state.sessions.sweep_idle();

    let sid = Uuid::new_v4().to_string();
    let session = EditorSession::new(id.clone(), template);
    let body = session_json(&sid, &session)?;

    state
        .sessions
        .insert(sid.clone(), user_id.clone(), session);
    info!("User {} opened editor session {} for event {}", user_id, sid, id);
    Ok(body)
}

// GET /editor/:sid
pub async fn get_session<S>(
    State(state): State<AppState<S>>,
    Path(sid): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: AppStore,
{
    edit_session(&state, &sid, &user_id, |_| Ok(()))
}

// DELETE /editor/:sid
pub async fn close_session<S>(
    State(state): State<AppState<S>>,
    Path(sid): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<MessageResponse>>
where
    S: AppStore,
{
    if !state.sessions.close(&sid, &user_id) {
        return Err(session_not_found(&sid));
    }
    debug!("Closed editor session {}", sid);
    Ok(Json(MessageResponse {
        message: "Editor session closed".into(),
    }))
}

// POST /editor/:sid/elements/text
pub async fn add_text_element<S>(
    State(state): State<AppState<S>>,
    Path(sid): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: AppStore,
{
    edit_session(&state, &sid, &user_id, |session| {
        session.add_text_element();
        Ok(())
    })
}

// POST /editor/:sid/elements/image
pub async fn add_image_element<S>(
    State(state): State<AppState<S>>,
    Path(sid): Path<String>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<AddImageRequest>,
) -> Result<Json<serde_json::Value>>
where
    S: AppStore,
{
    let url = payload.url.trim().to_string();
    if url.is_empty() {
        return Err(AppError::bad_request("Image url is required.".into()));
    }
    edit_session(&state, &sid, &user_id, |session| {
        session.add_image_element(url);
        Ok(())
    })
}

// PATCH /editor/:sid/elements/:element_id
pub async fn update_element<S>(
    State(state): State<AppState<S>>,
    Path((sid, element_id)): Path<(String, String)>,
    Extension(user_id): Extension<String>,
    Json(patch): Json<ElementPatch>,
) -> Result<Json<serde_json::Value>>
where
    S: AppStore,
{
    edit_session(&state, &sid, &user_id, |session| {
        if !session.update_element(&element_id, patch) {
            debug!("Ignoring update of unknown element {}", element_id);
        }
        Ok(())
    })
}

// DELETE /editor/:sid/elements/:element_id
pub async fn delete_element<S>(
    State(state): State<AppState<S>>,
    Path((sid, element_id)): Path<(String, String)>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: AppStore,
{
    edit_session(&state, &sid, &user_id, |session| {
        session.delete_element(&element_id);
        Ok(())
    })
}

// POST /editor/:sid/elements/:element_id/front
pub async fn bring_to_front<S>(
    State(state): State<AppState<S>>,
    Path((sid, element_id)): Path<(String, String)>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: AppStore,
{
    edit_session(&state, &sid, &user_id, |session| {
        session.bring_to_front(&element_id);
        Ok(())
    })
}

// POST /editor/:sid/elements/:element_id/back
pub async fn send_to_back<S>(
    State(state): State<AppState<S>>,
    Path((sid, element_id)): Path<(String, String)>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: AppStore,
{
    edit_session(&state, &sid, &user_id, |session| {
        session.send_to_back(&element_id);
        Ok(())
    })
}

// POST /editor/:sid/select
pub async fn select_element<S>(
    State(state): State<AppState<S>>,
    Path(sid): Path<String>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<SelectRequest>,
) -> Result<Json<serde_json::Value>>
where
    S: AppStore,
{
    edit_session(&state, &sid, &user_id, |session| {
        session.select(payload.element_id.as_deref());
        Ok(())
    })
}

// PATCH /editor/:sid/canvas
pub async fn update_canvas<S>(
    State(state): State<AppState<S>>,
    Path(sid): Path<String>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<UpdateCanvasRequest>,
) -> Result<Json<serde_json::Value>>
where
    S: AppStore,
{
    edit_session(&state, &sid, &user_id, |session| {
        if let Some(color) = payload.base_color {
            let color = color.trim();
            if color.is_empty() {
                return Err(AppError::bad_request("Base color cannot be empty.".into()));
            }
            session.set_base_color(color);
        }
        if let Some(image) = payload.background_image {
            session.set_background_image(Some(image));
        }
        Ok(())
    })
}

// POST /editor/:sid/preset
pub async fn apply_preset<S>(
    State(state): State<AppState<S>>,
    Path(sid): Path<String>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<PresetRequest>,
) -> Result<Json<serde_json::Value>>
where
    S: AppStore,
{
    let preset = payload
        .preset
        .parse::<Preset>()
        .map_err(|e| AppError::bad_request(e.to_string()))?;

    edit_session(&state, &sid, &user_id, |session| {
        session.apply_preset(preset);
        Ok(())
    })
}

// POST /editor/:sid/save
pub async fn save_session<S>(
    State(state): State<AppState<S>>,
    Path(sid): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: AppStore,
{
    // Save from a copy; other requests keep working on the live session
    let mut snapshot = snapshot_session(&state, &sid, &user_id)?;
    let updated_at = snapshot.save(state.store.as_ref()).await.map_err(|e| {
        error!("Saving editor session {} failed: {}", sid, e);
        AppError::internal_server_error("Failed to save template.".into())
    })?;

    // Closed meanwhile is fine, the save already landed
    state
        .sessions
        .with_session(&sid, &user_id, |session| session.mark_saved(updated_at));

    Ok(Json(serde_json::json!({
        "message": "Template saved",
        "updatedAt": updated_at
    })))
}

// GET /editor/:sid/preview.svg
pub async fn preview_svg<S>(
    State(state): State<AppState<S>>,
    Path(sid): Path<String>,
    Extension(user_id): Extension<String>,
    Query(query): Query<ViewportQuery>,
) -> Result<Response>
where
    S: AppStore,
{
    let session = snapshot_session(&state, &sid, &user_id)?;
    let svg = to_svg(&session.render(query.viewport));
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

// GET /editor/:sid/export.png
pub async fn export_png<S>(
    State(state): State<AppState<S>>,
    Path(sid): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Response>
where
    S: AppStore,
{
    let session = snapshot_session(&state, &sid, &user_id)?;
    let png = session
        .export_raster(state.images.as_ref(), None)
        .await
        .map_err(|e| {
            error!("Export of editor session {} failed: {}", sid, e);
            AppError::bad_gateway(EXPORT_FAILED.into())
        })?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"convite.png\""),
        ],
        png,
    )
        .into_response())
}
