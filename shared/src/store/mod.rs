//! Persistence seams. Every document the application reads or writes goes
//! through one of these traits so handlers can run against DynamoDB in
//! production and the in-memory mock in tests.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::invite::InviteTemplate;
use crate::models::{AllowedUser, Event, Expense, Guest, Inspiration, Task, UserAccount};

pub mod dynamo;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn create_event(&self, event: Event) -> Result<Event, StoreError>;
    async fn get_event(&self, id: &str) -> Result<Event, StoreError>;
    async fn get_events_by_owner(&self, owner_id: &str) -> Result<Vec<Event>, StoreError>;
    /// Events whose allow-list contains `user_id`
    async fn get_events_shared_with(&self, user_id: &str) -> Result<Vec<Event>, StoreError>;
    async fn delete_event(&self, id: &str) -> Result<(), StoreError>;
}

/// Guests live under their event. Writes also maintain the guest id to event
/// id index used to resolve public invitation links without scanning events.
#[async_trait]
pub trait GuestStore: Send + Sync {
    async fn add_guest(&self, guest: Guest) -> Result<Guest, StoreError>;
    async fn update_guest(&self, guest: Guest) -> Result<Guest, StoreError>;
    async fn get_guest(&self, event_id: &str, guest_id: &str) -> Result<Guest, StoreError>;
    /// Newest first
    async fn get_guests(&self, event_id: &str) -> Result<Vec<Guest>, StoreError>;
    async fn delete_guest(&self, event_id: &str, guest_id: &str) -> Result<(), StoreError>;
    async fn find_guest_event(&self, guest_id: &str) -> Result<Option<String>, StoreError>;
}

/// Template documents are handed out raw; callers decode them through
/// [`crate::invite::decode_template`].
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn get_template(&self, event_id: &str) -> Result<Option<Value>, StoreError>;
    /// Overwrites the whole document
    async fn put_template(&self, event_id: &str, template: &InviteTemplate)
        -> Result<(), StoreError>;
    async fn list_template_event_ids(&self) -> Result<Vec<String>, StoreError>;
}

#[async_trait]
pub trait AccessStore: Send + Sync {
    async fn get_allowed_users(&self, event_id: &str) -> Result<Vec<AllowedUser>, StoreError>;
    async fn is_allowed(&self, event_id: &str, user_id: &str) -> Result<bool, StoreError>;
    async fn put_allowed_user(&self, event_id: &str, user: AllowedUser) -> Result<(), StoreError>;
    async fn delete_allowed_user(&self, event_id: &str, user_id: &str) -> Result<(), StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Creates or overwrites
    async fn put_task(&self, task: Task) -> Result<Task, StoreError>;
    async fn get_task(&self, event_id: &str, task_id: &str) -> Result<Task, StoreError>;
    /// Newest first
    async fn get_tasks(&self, event_id: &str) -> Result<Vec<Task>, StoreError>;
    async fn delete_task(&self, event_id: &str, task_id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Creates or overwrites
    async fn put_expense(&self, expense: Expense) -> Result<Expense, StoreError>;
    async fn get_expense(&self, event_id: &str, expense_id: &str) -> Result<Expense, StoreError>;
    /// Newest first
    async fn get_expenses(&self, event_id: &str) -> Result<Vec<Expense>, StoreError>;
    async fn delete_expense(&self, event_id: &str, expense_id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait InspirationStore: Send + Sync {
    async fn add_inspiration(&self, inspiration: Inspiration) -> Result<Inspiration, StoreError>;
    /// Newest first
    async fn get_inspirations(&self, event_id: &str) -> Result<Vec<Inspiration>, StoreError>;
    async fn delete_inspiration(&self, event_id: &str, inspiration_id: &str)
        -> Result<(), StoreError>;
}

/// Everything the invitation service needs from the document store
pub trait AppStore:
    EventStore + GuestStore + TemplateStore + AccessStore + TaskStore + ExpenseStore + InspirationStore
{
}

impl<T> AppStore for T where
    T: EventStore
        + GuestStore
        + TemplateStore
        + AccessStore
        + TaskStore
        + ExpenseStore
        + InspirationStore
{
}
