use chrono::Utc;
use serde::{Deserialize, Serialize};

pub mod events;
pub mod planning;

pub use events::{format_event_date, Event};
pub use planning::{Expense, Inspiration, Task, TaskStatus, DEFAULT_CATEGORY};

/// Current time as epoch milliseconds, the timestamp unit stored on documents
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GuestKind {
    #[default]
    Adult,
    Child,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    pub id: String,
    pub event_id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: GuestKind,
    pub created_at: i64,
}

/// Entry in an event's allow-list, keyed by the granted user's id
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllowedUser {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub added_at: i64,
}

/// Account record owned by the identity provider, looked up by email
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl UserAccount {
    pub fn label(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| self.display_name.clone())
            .unwrap_or_default()
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}
