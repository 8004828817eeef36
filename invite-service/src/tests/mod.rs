mod expense_handlers_test;
mod guest_handlers_test;
mod public_handlers_test;
mod task_handlers_test;

use async_trait::async_trait;
use axum::Router;
use partyplanner_shared::models::{Event, Guest, GuestKind};
use partyplanner_shared::render::{ExportError, FetchedImage, ImageFetcher};
use partyplanner_shared::store::{EventStore, GuestStore};
use partyplanner_shared::test_utils::mock_store::MockStore;
use partyplanner_shared::test_utils::test_logging::init_test_logging;
use std::sync::Arc;

use crate::routes::create_router_with_state;
use crate::state::AppState;

pub const OWNER: &str = "owner-1";
pub const BASE_URL: &str = "https://festa.example";

/// Serves a 1x1 SVG for every URL except those containing "broken"
pub struct FakeImages;

#[async_trait]
impl ImageFetcher for FakeImages {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ExportError> {
        if url.contains("broken") {
            return Err(ExportError::ImageFetch {
                url: url.to_string(),
                reason: "connection refused".into(),
            });
        }
        Ok(FetchedImage {
            bytes: br#"<svg xmlns="http://www.w3.org/2000/svg" width="1" height="1"><rect width="1" height="1" fill="red"/></svg>"#.to_vec(),
            mime: "image/svg+xml".into(),
        })
    }
}

pub fn create_test_app() -> (Router, Arc<MockStore>) {
    create_test_app_with(|state| state)
}

/// Test app whose state is adjusted by `configure` before routing
pub fn create_test_app_with<F>(configure: F) -> (Router, Arc<MockStore>)
where
    F: FnOnce(AppState<MockStore>) -> AppState<MockStore>,
{
    init_test_logging();
    let store = Arc::new(MockStore::new());
    let state = configure(AppState::new(store.clone(), Arc::new(FakeImages), BASE_URL));
    (create_router_with_state(state, ""), store)
}

pub async fn seed_event(store: &MockStore, id: &str, owner: &str, location: Option<&str>) -> Event {
    store
        .create_event(Event {
            id: id.to_string(),
            owner_id: owner.to_string(),
            name: "Festa da Bia".to_string(),
            year: 2025,
            date: "2025-03-20".to_string(),
            location: location.map(str::to_string),
            budget: None,
            created_at: 1_700_000_000_000,
        })
        .await
        .unwrap()
}

pub async fn seed_guest(store: &MockStore, event_id: &str, id: &str, name: &str) -> Guest {
    store
        .add_guest(Guest {
            id: id.to_string(),
            event_id: event_id.to_string(),
            name: name.to_string(),
            kind: GuestKind::Adult,
            created_at: 1_700_000_000_000,
        })
        .await
        .unwrap()
}
