use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use crate::invite::InviteTemplate;
use crate::models::{AllowedUser, Event, Expense, Guest, Inspiration, Task, UserAccount};
use crate::store::{
    AccessStore, EventStore, ExpenseStore, GuestStore, InspirationStore, StoreError, TaskStore,
    TemplateStore,
};

// event id -> item id -> item
type Children<T> = HashMap<String, BTreeMap<String, T>>;

fn children_of<T: Clone>(map: &Children<T>, event_id: &str) -> Vec<T> {
    map.get(event_id)
        .map(|items| items.values().cloned().collect())
        .unwrap_or_default()
}

fn child_of<T: Clone>(map: &Children<T>, event_id: &str, id: &str, what: &str) -> Result<T, StoreError> {
    map.get(event_id)
        .and_then(|items| items.get(id))
        .cloned()
        .ok_or_else(|| StoreError::NotFound(format!("{} {}", what, id)))
}

#[derive(Default)]
struct State {
    events: BTreeMap<String, Event>,
    // event id -> guest id -> guest
    guests: HashMap<String, BTreeMap<String, Guest>>,
    guest_index: HashMap<String, String>,
    templates: BTreeMap<String, Value>,
    allowed: HashMap<String, BTreeMap<String, AllowedUser>>,
    users: Vec<UserAccount>,
    tasks: Children<Task>,
    expenses: Children<Expense>,
    inspirations: Children<Inspiration>,
}

/// In-memory store for tests. Writes can be made to fail to exercise the
/// remote-failure paths.
#[derive(Default)]
pub struct MockStore {
    state: Mutex<State>,
    fail_writes: AtomicBool,
    guest_index_reads: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("simulated write failure".into()));
        }
        Ok(())
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn insert_user(&self, user: UserAccount) {
        self.state().users.push(user);
    }

    /// Seeds a template document exactly as given, bypassing validation
    pub fn insert_raw_template(&self, event_id: &str, doc: Value) {
        self.state().templates.insert(event_id.to_string(), doc);
    }

    /// Number of guest-index lookups served, to show resolution is a point read
    pub fn guest_index_reads(&self) -> usize {
        self.guest_index_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventStore for MockStore {
    async fn create_event(&self, event: Event) -> Result<Event, StoreError> {
        self.check_write()?;
        self.state().events.insert(event.id.clone(), event.clone());
        Ok(event)
    }

    async fn get_event(&self, id: &str) -> Result<Event, StoreError> {
        self.state()
            .events
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Event {}", id)))
    }

    async fn get_events_by_owner(&self, owner_id: &str) -> Result<Vec<Event>, StoreError> {
        Ok(self
            .state()
            .events
            .values()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn get_events_shared_with(&self, user_id: &str) -> Result<Vec<Event>, StoreError> {
        let state = self.state();
        Ok(state
            .events
            .values()
            .filter(|e| {
                state
                    .allowed
                    .get(&e.id)
                    .is_some_and(|list| list.contains_key(user_id))
            })
            .cloned()
            .collect())
    }

    async fn delete_event(&self, id: &str) -> Result<(), StoreError> {
        self.check_write()?;
        let mut state = self.state();
        state.events.remove(id);
        if let Some(guests) = state.guests.remove(id) {
            for guest_id in guests.keys() {
                state.guest_index.remove(guest_id);
            }
        }
        state.templates.remove(id);
        state.allowed.remove(id);
        state.tasks.remove(id);
        state.expenses.remove(id);
        state.inspirations.remove(id);
        Ok(())
    }
}

#[async_trait]
impl GuestStore for MockStore {
    async fn add_guest(&self, guest: Guest) -> Result<Guest, StoreError> {
        self.check_write()?;
        let mut state = self.state();
        state
            .guest_index
            .insert(guest.id.clone(), guest.event_id.clone());
        state
            .guests
            .entry(guest.event_id.clone())
            .or_default()
            .insert(guest.id.clone(), guest.clone());
        Ok(guest)
    }

    async fn update_guest(&self, guest: Guest) -> Result<Guest, StoreError> {
        self.check_write()?;
        let mut state = self.state();
        let slot = state
            .guests
            .get_mut(&guest.event_id)
            .and_then(|g| g.get_mut(&guest.id))
            .ok_or_else(|| StoreError::NotFound(format!("Guest {}", guest.id)))?;
        *slot = guest.clone();
        Ok(guest)
    }

    async fn get_guest(&self, event_id: &str, guest_id: &str) -> Result<Guest, StoreError> {
        self.state()
            .guests
            .get(event_id)
            .and_then(|g| g.get(guest_id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Guest {}", guest_id)))
    }

    async fn get_guests(&self, event_id: &str) -> Result<Vec<Guest>, StoreError> {
        let mut guests: Vec<Guest> = self
            .state()
            .guests
            .get(event_id)
            .map(|g| g.values().cloned().collect())
            .unwrap_or_default();
        guests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(guests)
    }

    async fn delete_guest(&self, event_id: &str, guest_id: &str) -> Result<(), StoreError> {
        self.check_write()?;
        let mut state = self.state();
        if let Some(guests) = state.guests.get_mut(event_id) {
            guests.remove(guest_id);
        }
        state.guest_index.remove(guest_id);
        Ok(())
    }

    async fn find_guest_event(&self, guest_id: &str) -> Result<Option<String>, StoreError> {
        self.guest_index_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.state().guest_index.get(guest_id).cloned())
    }
}

#[async_trait]
impl TemplateStore for MockStore {
    async fn get_template(&self, event_id: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.state().templates.get(event_id).cloned())
    }

    async fn put_template(
        &self,
        event_id: &str,
        template: &InviteTemplate,
    ) -> Result<(), StoreError> {
        self.check_write()?;
        let doc = serde_json::to_value(template)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.state().templates.insert(event_id.to_string(), doc);
        Ok(())
    }

    async fn list_template_event_ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.state().templates.keys().cloned().collect())
    }
}

#[async_trait]
impl AccessStore for MockStore {
    async fn get_allowed_users(&self, event_id: &str) -> Result<Vec<AllowedUser>, StoreError> {
        Ok(self
            .state()
            .allowed
            .get(event_id)
            .map(|list| list.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn is_allowed(&self, event_id: &str, user_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .state()
            .allowed
            .get(event_id)
            .is_some_and(|list| list.contains_key(user_id)))
    }

    async fn put_allowed_user(&self, event_id: &str, user: AllowedUser) -> Result<(), StoreError> {
        self.check_write()?;
        self.state()
            .allowed
            .entry(event_id.to_string())
            .or_default()
            .insert(user.uid.clone(), user);
        Ok(())
    }

    async fn delete_allowed_user(&self, event_id: &str, user_id: &str) -> Result<(), StoreError> {
        self.check_write()?;
        if let Some(list) = self.state().allowed.get_mut(event_id) {
            list.remove(user_id);
        }
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|u| u.email == email.trim())
            .cloned())
    }
}

#[async_trait]
impl TaskStore for MockStore {
    async fn put_task(&self, task: Task) -> Result<Task, StoreError> {
        self.check_write()?;
        self.state()
            .tasks
            .entry(task.event_id.clone())
            .or_default()
            .insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn get_task(&self, event_id: &str, task_id: &str) -> Result<Task, StoreError> {
        child_of(&self.state().tasks, event_id, task_id, "Task")
    }

    async fn get_tasks(&self, event_id: &str) -> Result<Vec<Task>, StoreError> {
        let mut tasks = children_of(&self.state().tasks, event_id);
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn delete_task(&self, event_id: &str, task_id: &str) -> Result<(), StoreError> {
        self.check_write()?;
        if let Some(tasks) = self.state().tasks.get_mut(event_id) {
            tasks.remove(task_id);
        }
        Ok(())
    }
}

#[async_trait]
impl ExpenseStore for MockStore {
    async fn put_expense(&self, expense: Expense) -> Result<Expense, StoreError> {
        self.check_write()?;
        self.state()
            .expenses
            .entry(expense.event_id.clone())
            .or_default()
            .insert(expense.id.clone(), expense.clone());
        Ok(expense)
    }

    async fn get_expense(&self, event_id: &str, expense_id: &str) -> Result<Expense, StoreError> {
        child_of(&self.state().expenses, event_id, expense_id, "Expense")
    }

    async fn get_expenses(&self, event_id: &str) -> Result<Vec<Expense>, StoreError> {
        let mut expenses = children_of(&self.state().expenses, event_id);
        expenses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(expenses)
    }

    async fn delete_expense(&self, event_id: &str, expense_id: &str) -> Result<(), StoreError> {
        self.check_write()?;
        if let Some(expenses) = self.state().expenses.get_mut(event_id) {
            expenses.remove(expense_id);
        }
        Ok(())
    }
}

#[async_trait]
impl InspirationStore for MockStore {
    async fn add_inspiration(&self, inspiration: Inspiration) -> Result<Inspiration, StoreError> {
        self.check_write()?;
        self.state()
            .inspirations
            .entry(inspiration.event_id.clone())
            .or_default()
            .insert(inspiration.id.clone(), inspiration.clone());
        Ok(inspiration)
    }

    async fn get_inspirations(&self, event_id: &str) -> Result<Vec<Inspiration>, StoreError> {
        let mut photos = children_of(&self.state().inspirations, event_id);
        photos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(photos)
    }

    async fn delete_inspiration(
        &self,
        event_id: &str,
        inspiration_id: &str,
    ) -> Result<(), StoreError> {
        self.check_write()?;
        if let Some(photos) = self.state().inspirations.get_mut(event_id) {
            photos.remove(inspiration_id);
        }
        Ok(())
    }
}
