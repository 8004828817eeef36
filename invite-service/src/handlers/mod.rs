pub mod access_handlers;
pub mod editor_handlers;
pub mod event_handlers;
pub mod expense_handlers;
pub mod guest_handlers;
pub mod inspiration_handlers;
pub mod public_handlers;
pub mod task_handlers;
pub mod template_handlers;

use chrono::NaiveDate;
use log::{error, warn};
use partyplanner_shared::access::can_view_event;
use partyplanner_shared::invite::{decode_template, default_template, InviteTemplate};
use partyplanner_shared::models::{Event, DEFAULT_CATEGORY};
use partyplanner_shared::store::{AppStore, TemplateStore};

use crate::error::{AppError, Result};

/// Loads an event the caller owns or is allow-listed on
pub(crate) async fn load_viewable_event<S>(store: &S, event_id: &str, user_id: &str) -> Result<Event>
where
    S: AppStore + ?Sized,
{
    let event = store.get_event(event_id).await?;
    if !can_view_event(store, &event, user_id).await? {
        warn!("User {} has no access to event {}", user_id, event_id);
        return Err(AppError::forbidden(
            "You do not have access to this event.".into(),
        ));
    }
    Ok(event)
}

/// Stored template of an event, or the default template when none exists yet
pub(crate) async fn load_template<S>(store: &S, event_id: &str) -> Result<InviteTemplate>
where
    S: TemplateStore + ?Sized,
{
    match store.get_template(event_id).await? {
        Some(doc) => decode_template(doc).map_err(|e| {
            error!("Stored template for event {} is invalid: {}", event_id, e);
            AppError::internal_server_error("Stored template is invalid.".into())
        }),
        None => Ok(default_template()),
    }
}

/// Validates a `YYYY-MM-DD` day and returns it trimmed
pub(crate) fn parse_day(raw: &str, field: &str) -> Result<String> {
    let day = raw.trim();
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request(format!("{} must be YYYY-MM-DD.", field)))?;
    Ok(day.to_string())
}

/// Trimmed category, falling back to the default one when blank
pub(crate) fn category_or_default(raw: Option<String>) -> String {
    raw.map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}
