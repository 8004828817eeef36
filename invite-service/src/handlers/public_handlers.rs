//! Unauthenticated invitation view, addressed only by guest id

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use log::{error, info, warn};
use partyplanner_shared::invite::{InviteTemplate, SubstitutionContext};
use partyplanner_shared::models::{format_event_date, Event, Guest};
use partyplanner_shared::render::{export_png as export_tree, render, to_svg, ExportOptions, RenderOptions};
use partyplanner_shared::share::{map_link, SharePayload};
use partyplanner_shared::store::{AppStore, StoreError};

use super::load_template;
use crate::error::{AppError, Result};
use crate::models::ViewportQuery;
use crate::state::AppState;

const EXPORT_FAILED: &str = "Erro ao exportar convite.";

fn invitation_not_found() -> AppError {
    AppError::not_found("Convite não encontrado.".into())
}

fn missing_as_not_found(err: StoreError) -> AppError {
    if err.is_not_found() {
        invitation_not_found()
    } else {
        err.into()
    }
}

struct Invitation {
    event: Event,
    guest: Guest,
    template: InviteTemplate,
    context: SubstitutionContext,
}

/// Resolves a guest id through the guest index to its event, guest record
/// and template. A dangling index entry reads as a missing invitation.
async fn resolve_invitation<S>(store: &S, guest_id: &str) -> Result<Invitation>
where
    S: AppStore + ?Sized,
{
    let event_id = store
        .find_guest_event(guest_id)
        .await?
        .ok_or_else(|| {
            warn!("No invitation for guest {}", guest_id);
            invitation_not_found()
        })?;

    let event = store.get_event(&event_id).await.map_err(missing_as_not_found)?;
    let guest = store
        .get_guest(&event_id, guest_id)
        .await
        .map_err(missing_as_not_found)?;
    let template = load_template(store, &event_id).await?;
    let context = SubstitutionContext::for_guest(&guest, &event);

    Ok(Invitation {
        event,
        guest,
        template,
        context,
    })
}

// GET /invite/:guest_id
pub async fn get_invitation<S>(
    State(state): State<AppState<S>>,
    Path(guest_id): Path<String>,
    Query(query): Query<ViewportQuery>,
) -> Result<Json<serde_json::Value>>
where
    S: AppStore,
{
    let invitation = resolve_invitation(state.store.as_ref(), &guest_id).await?;
    let card = render(
        &invitation.template,
        Some(&invitation.context),
        &RenderOptions::public(query.viewport),
    );
    let event = &invitation.event;

    Ok(Json(serde_json::json!({
        "guest": invitation.guest,
        "event": {
            "id": event.id,
            "name": event.name,
            "date": event.date,
            "formattedDate": format_event_date(&event.date),
            "local": event.location(),
        },
        "template": invitation.template,
        "card": card,
        "mapLink": event.location().and_then(map_link),
        "share": SharePayload::for_invitation(&event.name, &guest_id, &state.public_base_url),
    })))
}

// GET /invite/:guest_id/card.svg
pub async fn get_card_svg<S>(
    State(state): State<AppState<S>>,
    Path(guest_id): Path<String>,
    Query(query): Query<ViewportQuery>,
) -> Result<Response>
where
    S: AppStore,
{
    let invitation = resolve_invitation(state.store.as_ref(), &guest_id).await?;
    let tree = render(
        &invitation.template,
        Some(&invitation.context),
        &RenderOptions::public(query.viewport),
    );
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], to_svg(&tree)).into_response())
}

// GET /invite/:guest_id/card.png
pub async fn get_card_png<S>(
    State(state): State<AppState<S>>,
    Path(guest_id): Path<String>,
) -> Result<Response>
where
    S: AppStore,
{
    let invitation = resolve_invitation(state.store.as_ref(), &guest_id).await?;
    let mut tree = render(
        &invitation.template,
        Some(&invitation.context),
        &RenderOptions::public(None),
    );

    let png = export_tree(&mut tree, state.images.as_ref(), ExportOptions::PUBLIC)
        .await
        .map_err(|e| {
            error!("Export of invitation {} failed: {}", guest_id, e);
            AppError::bad_gateway(EXPORT_FAILED.into())
        })?;

    info!("Exported invitation card for guest {}", guest_id);
    let disposition = content_disposition(&format!("convite-{}.png", invitation.guest.name));
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        png,
    )
        .into_response())
}

/// Attachment header with an ASCII fallback name and the exact UTF-8 name
fn content_disposition(filename: &str) -> HeaderValue {
    let ascii: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut encoded = String::new();
    for byte in filename.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-' | b'_' | b'~') {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }

    HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii, encoded
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"convite.png\""))
}
