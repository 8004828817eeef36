//! Per-event allow-list.
//!
//! Only the event owner may grant or revoke access. The checks here decide
//! what the application shows a caller; the document store itself enforces
//! nothing, so this is not a security boundary.

use log::{info, warn};
use thiserror::Error;

use crate::models::{now_millis, AllowedUser, Event};
use crate::store::{AccessStore, EventStore, StoreError};

#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Informe um e-mail.")]
    MissingEmail,

    #[error("Apenas o dono do evento pode adicionar/remover usuários.")]
    NotOwner,

    #[error("Nenhum usuário encontrado com esse e-mail.")]
    UserNotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Owner or allow-listed user
pub async fn can_view_event<S>(store: &S, event: &Event, user_id: &str) -> Result<bool, StoreError>
where
    S: AccessStore + ?Sized,
{
    if event.is_owned_by(user_id) {
        return Ok(true);
    }
    store.is_allowed(&event.id, user_id).await
}

/// Grants the account registered under `email` access to the event
pub async fn add_allowed_user<S>(
    store: &S,
    caller_id: &str,
    event_id: &str,
    email: &str,
) -> Result<AllowedUser, AccessError>
where
    S: EventStore + AccessStore + ?Sized,
{
    let email = email.trim();
    if email.is_empty() {
        return Err(AccessError::MissingEmail);
    }

    let event = store.get_event(event_id).await?;
    if !event.is_owned_by(caller_id) {
        warn!(
            "User {} tried to change the allow-list of event {} owned by {}",
            caller_id, event_id, event.owner_id
        );
        return Err(AccessError::NotOwner);
    }

    let account = store
        .find_user_by_email(email)
        .await?
        .ok_or(AccessError::UserNotFound)?;

    let entry = AllowedUser {
        uid: account.id.clone(),
        email: account.email.clone(),
        name: account.label(),
        added_at: now_millis(),
    };
    store.put_allowed_user(event_id, entry.clone()).await?;

    info!("Granted {} access to event {}", entry.uid, event_id);
    Ok(entry)
}

pub async fn remove_allowed_user<S>(
    store: &S,
    caller_id: &str,
    event_id: &str,
    uid: &str,
) -> Result<(), AccessError>
where
    S: EventStore + AccessStore + ?Sized,
{
    let event = store.get_event(event_id).await?;
    if !event.is_owned_by(caller_id) {
        warn!(
            "User {} tried to change the allow-list of event {} owned by {}",
            caller_id, event_id, event.owner_id
        );
        return Err(AccessError::NotOwner);
    }

    store.delete_allowed_user(event_id, uid).await?;
    info!("Revoked {} access to event {}", uid, event_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserAccount;
    use crate::test_utils::mock_store::MockStore;

    async fn seeded() -> MockStore {
        let store = MockStore::new();
        store
            .create_event(Event {
                id: "ev-1".into(),
                owner_id: "owner".into(),
                name: "Aniversário".into(),
                year: 2025,
                date: "2025-03-20".into(),
                location: None,
                budget: None,
                created_at: 1,
            })
            .await
            .unwrap();
        store.insert_user(UserAccount {
            id: "u-2".into(),
            email: "ana@example.com".into(),
            name: None,
            display_name: Some("Ana".into()),
        });
        store
    }

    #[tokio::test]
    async fn owner_adds_user_by_email() {
        let store = seeded().await;
        let entry = add_allowed_user(&store, "owner", "ev-1", " ana@example.com ")
            .await
            .unwrap();
        assert_eq!(entry.uid, "u-2");
        assert_eq!(entry.name, "Ana");

        let event = store.get_event("ev-1").await.unwrap();
        assert!(can_view_event(&store, &event, "u-2").await.unwrap());
        assert_eq!(store.get_allowed_users("ev-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn non_owner_is_blocked() {
        let store = seeded().await;
        let err = add_allowed_user(&store, "intruder", "ev-1", "ana@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::NotOwner));
        assert_eq!(
            err.to_string(),
            "Apenas o dono do evento pode adicionar/remover usuários."
        );
        assert!(store.get_allowed_users("ev-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_email_and_blank_email() {
        let store = seeded().await;
        let err = add_allowed_user(&store, "owner", "ev-1", "nobody@example.com")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Nenhum usuário encontrado com esse e-mail.");

        let err = add_allowed_user(&store, "owner", "ev-1", "   ").await.unwrap_err();
        assert!(matches!(err, AccessError::MissingEmail));
    }

    #[tokio::test]
    async fn owner_removes_user() {
        let store = seeded().await;
        add_allowed_user(&store, "owner", "ev-1", "ana@example.com")
            .await
            .unwrap();

        assert!(matches!(
            remove_allowed_user(&store, "u-2", "ev-1", "u-2").await,
            Err(AccessError::NotOwner)
        ));
        remove_allowed_user(&store, "owner", "ev-1", "u-2").await.unwrap();

        let event = store.get_event("ev-1").await.unwrap();
        assert!(!can_view_event(&store, &event, "u-2").await.unwrap());
        assert!(can_view_event(&store, &event, "owner").await.unwrap());
    }
}
