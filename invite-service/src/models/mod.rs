use partyplanner_shared::editor::EditorSession;
use partyplanner_shared::invite::InviteTemplate;
use partyplanner_shared::models::{format_event_date, Event, GuestKind, TaskStatus};
use serde::{Deserialize, Serialize};

// Request DTOs
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub name: String,
    pub date: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, rename = "local")]
    pub location: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
}

#[derive(Deserialize, Debug)]
pub struct AddGuestRequest {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<GuestKind>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateGuestRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<GuestKind>,
}

#[derive(Deserialize, Debug)]
pub struct AddAllowedUserRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct AddImageRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SelectRequest {
    #[serde(default)]
    pub element_id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCanvasRequest {
    #[serde(default)]
    pub base_color: Option<String>,
    /// Empty string clears the background image
    #[serde(default)]
    pub background_image: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct PresetRequest {
    pub preset: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub due_date: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    /// Empty string clears the due date
    #[serde(default)]
    pub due_date: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub category: Option<String>,
    pub value: f64,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseRequest {
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub date: Option<String>,
    /// Empty string removes the photo
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AddInspirationRequest {
    #[serde(default)]
    pub image_url: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct ViewportQuery {
    #[serde(default)]
    pub viewport: Option<f64>,
}

// Response DTOs
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    #[serde(flatten)]
    pub event: Event,
    pub formatted_date: String,
    pub is_owner: bool,
}

impl EventResponse {
    pub fn new(event: Event, user_id: &str) -> Self {
        Self {
            formatted_date: format_event_date(&event.date),
            is_owner: event.is_owned_by(user_id),
            event,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse<'a> {
    pub session_id: &'a str,
    pub event_id: &'a str,
    pub selected_id: Option<&'a str>,
    pub template: &'a InviteTemplate,
}

impl<'a> SessionResponse<'a> {
    pub fn new(session_id: &'a str, session: &'a EditorSession) -> Self {
        Self {
            session_id,
            event_id: session.event_id(),
            selected_id: session.selected_id(),
            template: session.template(),
        }
    }
}
