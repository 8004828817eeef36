use serde::{Deserialize, Serialize};

/// Category given to tasks and expenses created without one
pub const DEFAULT_CATEGORY: &str = "geral";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Doing,
    Done,
}

/// Checklist item of an event
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub event_id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub status: TaskStatus,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub due_date: Option<String>,
    pub created_at: i64,
}

/// Money spent on an event, in the event's currency
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub event_id: String,
    pub item: String,
    pub category: String,
    pub value: f64,
    /// `YYYY-MM-DD`
    pub date: String,
    /// Receipt or product photo on the media CDN
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: i64,
}

/// Photo pinned to an event's inspiration board
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Inspiration {
    pub id: String,
    pub event_id: String,
    pub image_url: String,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_reads_stored_documents() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "id": "t-1",
            "eventId": "ev-1",
            "name": "Comprar balões",
            "category": "decoração",
            "dueDate": null,
            "createdAt": 1
        }))
        .unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.due_date, None);

        let value = serde_json::to_value(Task {
            status: TaskStatus::Doing,
            ..task
        })
        .unwrap();
        assert_eq!(value["status"], "doing");
    }
}
