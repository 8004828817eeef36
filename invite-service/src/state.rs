use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use log::{debug, info};
use partyplanner_shared::auth::JwtVerifier;
use partyplanner_shared::config::DEFAULT_EDITOR_IDLE_TTL;
use partyplanner_shared::editor::EditorSession;
use partyplanner_shared::models::{AllowedUser, Guest};
use partyplanner_shared::render::ImageFetcher;
use partyplanner_shared::subscription::SubscriptionHub;

/// An editor session and the user who opened it
pub struct OpenSession {
    pub user_id: String,
    pub session: EditorSession,
    last_touched: Instant,
}

/// Open editor sessions by id. A session nobody has touched for the idle
/// TTL is dropped the next time it is looked up or a sweep runs.
pub struct SessionRegistry {
    sessions: DashMap<String, OpenSession>,
    idle_ttl: Duration,
}

impl SessionRegistry {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_ttl,
        }
    }

    fn is_idle(&self, open: &OpenSession) -> bool {
        open.last_touched.elapsed() >= self.idle_ttl
    }

    pub fn insert(&self, sid: String, user_id: String, session: EditorSession) {
        self.sessions.insert(
            sid,
            OpenSession {
                user_id,
                session,
                last_touched: Instant::now(),
            },
        );
    }

    /// Runs `f` on the caller's session and marks it as used. Unknown,
    /// expired and foreign sessions all give `None`.
    pub fn with_session<R>(
        &self,
        sid: &str,
        user_id: &str,
        f: impl FnOnce(&mut EditorSession) -> R,
    ) -> Option<R> {
        if self
            .sessions
            .remove_if(sid, |_, open| self.is_idle(open))
            .is_some()
        {
            debug!("Editor session {} expired", sid);
            return None;
        }

        let mut open = self.sessions.get_mut(sid)?;
        if open.user_id != user_id {
            return None;
        }
        open.last_touched = Instant::now();
        Some(f(&mut open.session))
    }

    /// Removes the caller's session; false when it is not theirs or missing
    pub fn close(&self, sid: &str, user_id: &str) -> bool {
        self.sessions
            .remove_if(sid, |_, open| open.user_id == user_id)
            .is_some()
    }

    /// Drops every session editing `event_id`
    pub fn close_event(&self, event_id: &str) {
        self.sessions
            .retain(|_, open| open.session.event_id() != event_id);
    }

    /// Drops idle sessions and returns how many went
    pub fn sweep_idle(&self) -> usize {
        let before = self.len();
        self.sessions.retain(|_, open| !self.is_idle(open));
        let evicted = before.saturating_sub(self.len());
        if evicted > 0 {
            info!("Evicted {} idle editor sessions, {} open", evicted, self.len());
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}

pub struct AppState<S> {
    pub store: Arc<S>,
    pub sessions: Arc<SessionRegistry>,
    /// Guest list snapshots keyed by event id
    pub guest_hub: SubscriptionHub<Vec<Guest>>,
    /// Allow-list snapshots keyed by event id
    pub access_hub: SubscriptionHub<Vec<AllowedUser>>,
    pub images: Arc<dyn ImageFetcher>,
    pub auth: Arc<JwtVerifier>,
    pub public_base_url: String,
}

impl<S> AppState<S> {
    /// State with the development token secret and the default session TTL
    pub fn new(store: Arc<S>, images: Arc<dyn ImageFetcher>, public_base_url: &str) -> Self {
        Self {
            store,
            sessions: Arc::new(SessionRegistry::new(DEFAULT_EDITOR_IDLE_TTL)),
            guest_hub: SubscriptionHub::default(),
            access_hub: SubscriptionHub::default(),
            images,
            auth: Arc::new(JwtVerifier::development()),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_jwt_secret(mut self, secret: &str) -> Self {
        self.auth = Arc::new(JwtVerifier::new(secret));
        self
    }

    pub fn with_session_idle_ttl(mut self, ttl: Duration) -> Self {
        self.sessions = Arc::new(SessionRegistry::new(ttl));
        self
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            sessions: Arc::clone(&self.sessions),
            guest_hub: self.guest_hub.clone(),
            access_hub: self.access_hub.clone(),
            images: Arc::clone(&self.images),
            auth: Arc::clone(&self.auth),
            public_base_url: self.public_base_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partyplanner_shared::invite::default_template;

    fn session(event_id: &str) -> EditorSession {
        EditorSession::new(event_id.to_string(), default_template())
    }

    #[test]
    fn sessions_belong_to_their_user() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        registry.insert("s-1".into(), "ana".into(), session("ev-1"));

        assert_eq!(registry.with_session("s-1", "bia", |_| ()), None);
        assert!(!registry.close("s-1", "bia"));
        assert_eq!(
            registry.with_session("s-1", "ana", |s| s.event_id().to_string()),
            Some("ev-1".to_string())
        );
        assert!(registry.close("s-1", "ana"));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn sweep_evicts_only_idle_sessions() {
        let registry = SessionRegistry::new(Duration::from_millis(30));
        registry.insert("old".into(), "ana".into(), session("ev-1"));
        std::thread::sleep(Duration::from_millis(60));
        registry.insert("new".into(), "ana".into(), session("ev-1"));

        assert_eq!(registry.sweep_idle(), 1);
        assert_eq!(registry.len(), 1);
        assert!(registry.with_session("new", "ana", |_| ()).is_some());
        assert!(registry.with_session("old", "ana", |_| ()).is_none());
    }

    #[test]
    fn closing_an_event_drops_its_sessions() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        registry.insert("a".into(), "ana".into(), session("ev-1"));
        registry.insert("b".into(), "bia".into(), session("ev-2"));

        registry.close_event("ev-1");
        assert_eq!(registry.len(), 1);
        assert!(registry.with_session("b", "bia", |_| ()).is_some());
    }
}
