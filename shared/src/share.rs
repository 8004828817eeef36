//! Invitation sharing: the payload handed to a platform share sheet, and the
//! clipboard fallback used when no share sheet is available or it fails.

use async_trait::async_trait;
use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

pub const CLIPBOARD_CONFIRMATION: &str = "Link copiado para a área de transferência!";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShareError {
    #[error("Sharing is not available")]
    Unavailable,

    #[error("Share failed: {0}")]
    Failed(String),

    #[error("Could not copy link: {0}")]
    Clipboard(String),
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl SharePayload {
    pub fn for_invitation(event_name: &str, guest_id: &str, base_url: &str) -> Self {
        Self {
            title: format!("Convite: {}", event_name),
            text: format!("Você foi convidado para {}!", event_name),
            url: invitation_url(base_url, guest_id),
        }
    }
}

/// Public link of a guest's invitation
pub fn invitation_url(base_url: &str, guest_id: &str) -> String {
    format!("{}/invite/{}", base_url.trim_end_matches('/'), guest_id)
}

/// Maps search link for a free-text location; `None` for blank locations
pub fn map_link(location: &str) -> Option<String> {
    let location = location.trim();
    if location.is_empty() {
        return None;
    }
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("api", "1")
        .append_pair("query", location)
        .finish();
    Some(format!("https://www.google.com/maps/search/?{}", query))
}

#[async_trait]
pub trait NativeShare: Send + Sync {
    async fn share(&self, payload: &SharePayload) -> Result<(), ShareError>;
}

#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), ShareError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShareOutcome {
    Shared,
    /// Carries the confirmation to show the user
    CopiedToClipboard(String),
}

/// Tries the native share sheet first, then copies the link
pub async fn share_with_fallback(
    native: Option<&dyn NativeShare>,
    clipboard: &dyn Clipboard,
    payload: &SharePayload,
) -> Result<ShareOutcome, ShareError> {
    if let Some(native) = native {
        match native.share(payload).await {
            Ok(()) => {
                info!("Shared invitation {}", payload.url);
                return Ok(ShareOutcome::Shared);
            }
            Err(e) => warn!("Native share failed, copying link instead: {}", e),
        }
    }

    clipboard.write_text(&payload.url).await?;
    Ok(ShareOutcome::CopiedToClipboard(
        CLIPBOARD_CONFIRMATION.to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Sheet(Result<(), ShareError>);

    #[async_trait]
    impl NativeShare for Sheet {
        async fn share(&self, _payload: &SharePayload) -> Result<(), ShareError> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct MemoryClipboard(Mutex<Option<String>>);

    #[async_trait]
    impl Clipboard for MemoryClipboard {
        async fn write_text(&self, text: &str) -> Result<(), ShareError> {
            *self.0.lock().unwrap() = Some(text.to_string());
            Ok(())
        }
    }

    fn payload() -> SharePayload {
        SharePayload::for_invitation("Festa da Bia", "g-1", "https://festa.example/")
    }

    #[test]
    fn builds_payload() {
        let p = payload();
        assert_eq!(p.title, "Convite: Festa da Bia");
        assert_eq!(p.text, "Você foi convidado para Festa da Bia!");
        assert_eq!(p.url, "https://festa.example/invite/g-1");
    }

    #[test]
    fn map_link_encodes_location() {
        assert_eq!(
            map_link("Rua A, 10").unwrap(),
            "https://www.google.com/maps/search/?api=1&query=Rua+A%2C+10"
        );
        assert_eq!(map_link("  "), None);
    }

    #[tokio::test]
    async fn native_share_wins_when_it_works() {
        let clipboard = MemoryClipboard::default();
        let sheet = Sheet(Ok(()));
        let outcome = share_with_fallback(Some(&sheet), &clipboard, &payload())
            .await
            .unwrap();
        assert_eq!(outcome, ShareOutcome::Shared);
        assert!(clipboard.0.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn falls_back_to_clipboard() {
        let clipboard = MemoryClipboard::default();
        let sheet = Sheet(Err(ShareError::Failed("dismissed".into())));

        for native in [Some(&sheet as &dyn NativeShare), None] {
            let outcome = share_with_fallback(native, &clipboard, &payload())
                .await
                .unwrap();
            assert_eq!(
                outcome,
                ShareOutcome::CopiedToClipboard(CLIPBOARD_CONFIRMATION.to_string())
            );
            assert_eq!(
                clipboard.0.lock().unwrap().as_deref(),
                Some("https://festa.example/invite/g-1")
            );
        }
    }
}
