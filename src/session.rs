// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session store: who is signed in, and with what privilege.
//!
//! Each browser session is keyed by an opaque id carried in a signed cookie
//! (see `middleware::auth`). The store is the single source of truth the
//! route guard consults on every request.
//!
//! Every mutation of a session bumps its generation. Views take a
//! [`FetchTicket`] before issuing remote reads and check it afterwards, so a
//! fetch that was overtaken by a sign-out or identity change is discarded
//! instead of answering with data for the wrong user.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use crate::db::AuthService;
use crate::error::AppError;
use crate::guard::NavTree;
use crate::models::Identity;

/// Current identity and the derived admin flag.
///
/// `is_admin` is true iff an identity is present and its role is admin.
#[derive(Debug, Clone, Default)]
pub struct Session {
    identity: Option<Identity>,
    is_admin: bool,
    access_token: Option<String>,
    generation: u64,
}

impl Session {
    /// A session with no identity.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Replace the identity and recompute the admin flag.
    pub fn set_identity(&mut self, identity: Option<Identity>) {
        self.is_admin = identity.as_ref().is_some_and(Identity::is_admin);
        self.identity = identity;
        self.generation += 1;
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn clear(&mut self) {
        self.set_identity(None);
        self.access_token = None;
    }
}

/// Snapshot of a session's generation taken before a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub session_id: String,
    pub generation: u64,
}

struct Entry {
    session: Session,
    expires_at: DateTime<Utc>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// All live sessions, keyed by session id.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Entry>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_hours: i64) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Start a session for a freshly authenticated identity. Returns its id.
    pub fn create(&self, identity: Identity, access_token: Option<String>) -> String {
        let session_id = uuid::Uuid::new_v4().to_string();

        let mut session = Session::anonymous();
        session.set_identity(Some(identity));
        session.access_token = access_token;

        tracing::info!(
            user_id = %session.identity().map(|i| i.id.as_str()).unwrap_or_default(),
            is_admin = session.is_admin(),
            "Session started"
        );

        self.sessions.insert(
            session_id.clone(),
            Entry {
                session,
                expires_at: Utc::now() + self.ttl,
            },
        );
        session_id
    }

    /// Current state of a session; expired sessions are dropped on sight.
    pub fn get(&self, session_id: &str) -> Option<Session> {
        {
            let entry = self.sessions.get(session_id)?;
            if !entry.is_expired(Utc::now()) {
                return Some(entry.session.clone());
            }
        }

        self.sessions.remove(session_id);
        tracing::debug!(session_id, "Session expired");
        None
    }

    /// Replace the identity of an existing session.
    pub fn set_identity(&self, session_id: &str, identity: Option<Identity>) -> Result<(), AppError> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))?;
        entry.session.set_identity(identity);
        Ok(())
    }

    /// Sign out: revoke the remote session, then forget the local one.
    ///
    /// The local session is cleared whether or not the remote call succeeds.
    /// Returns the cleared session.
    pub async fn sign_out(&self, session_id: &str, auth: &dyn AuthService) -> Session {
        let access_token = self
            .sessions
            .get(session_id)
            .and_then(|entry| entry.session.access_token.clone());

        if let Some(token) = access_token {
            if let Err(e) = auth.sign_out(&token).await {
                tracing::warn!(error = %e, "Remote sign-out failed, clearing local session anyway");
            }
        }

        let mut session = self
            .sessions
            .remove(session_id)
            .map(|(_, entry)| entry.session)
            .unwrap_or_default();
        session.clear();

        tracing::info!(session_id, "Session signed out");
        session
    }

    /// Whether a ticket still describes the session as it is now.
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.get(&ticket.session_id)
            .is_some_and(|session| session.generation() == ticket.generation)
    }

    /// Navigation tree the ticket's session belongs to now.
    pub fn current_tree(&self, ticket: &FetchTicket) -> NavTree {
        self.get(&ticket.session_id)
            .map(|session| NavTree::for_session(&session))
            .unwrap_or(NavTree::Unauthenticated)
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut removed = 0;
        self.sessions.retain(|_, entry| {
            let keep = !entry.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Session state resolved for one request, inserted as a request extension
/// by the route guard.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: Option<String>,
    pub session: Session,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self {
            session_id: None,
            session: Session::anonymous(),
        }
    }

    /// The signed-in identity; handlers behind the guard can rely on it.
    pub fn identity(&self) -> Result<&Identity, AppError> {
        self.session.identity().ok_or(AppError::Unauthorized)
    }

    pub fn tree(&self) -> NavTree {
        NavTree::for_session(&self.session)
    }

    /// Ticket for the session as it was when this request started.
    pub fn ticket(&self) -> Option<FetchTicket> {
        self.session_id.as_ref().map(|id| FetchTicket {
            session_id: id.clone(),
            generation: self.session.generation(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{AuthSession, MemoryBackend};
    use crate::models::Role;
    use async_trait::async_trait;

    fn identity(role: Role) -> Identity {
        Identity {
            id: "u1".to_string(),
            email: "ana@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_is_admin_tracks_identity_role() {
        let mut session = Session::anonymous();
        assert!(session.identity().is_none());
        assert!(!session.is_admin());

        session.set_identity(Some(identity(Role::Admin)));
        assert!(session.is_admin());

        session.set_identity(Some(identity(Role::Member)));
        assert!(!session.is_admin());

        session.set_identity(None);
        assert!(session.identity().is_none());
        assert!(!session.is_admin());
    }

    #[test]
    fn test_every_mutation_bumps_generation() {
        let mut session = Session::anonymous();
        let start = session.generation();
        session.set_identity(Some(identity(Role::Member)));
        session.set_identity(Some(identity(Role::Member)));
        assert_eq!(session.generation(), start + 2);
    }

    #[test]
    fn test_store_create_and_get() {
        let store = SessionStore::new(12);
        let id = store.create(identity(Role::Admin), Some("remote".to_string()));

        let session = store.get(&id).expect("session should exist");
        assert!(session.is_admin());
        assert_eq!(session.identity().unwrap().email, "ana@example.com");
        assert!(store.get("nope").is_none());
    }

    #[test]
    fn test_expired_sessions_are_dropped() {
        let store = SessionStore::new(0);
        let id = store.create(identity(Role::Member), None);

        assert!(store.get(&id).is_none());
        assert!(store.is_empty());

        store.create(identity(Role::Member), None);
        assert_eq!(store.purge_expired(), 1);
    }

    #[test]
    fn test_purge_while_sessions_are_created() {
        let store = SessionStore::new(0);
        let creator = {
            let store = store.clone();
            std::thread::spawn(move || {
                for _ in 0..2000 {
                    store.create(identity(Role::Member), None);
                }
            })
        };

        let mut purged = 0;
        for _ in 0..2000 {
            purged += store.purge_expired();
        }
        creator.join().unwrap();
        purged += store.purge_expired();

        assert_eq!(purged, 2000);
        assert!(store.is_empty());
    }

    #[test]
    fn test_purge_keeps_live_sessions() {
        let store = SessionStore::new(12);
        store.create(identity(Role::Member), None);
        store.create(identity(Role::Admin), None);

        assert_eq!(store.purge_expired(), 0);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_ticket_goes_stale_on_identity_change() {
        let store = SessionStore::new(12);
        let id = store.create(identity(Role::Member), None);

        let ctx = SessionContext {
            session_id: Some(id.clone()),
            session: store.get(&id).unwrap(),
        };
        let ticket = ctx.ticket().unwrap();
        assert!(store.is_current(&ticket));
        assert_eq!(store.current_tree(&ticket), NavTree::Member);

        store.set_identity(&id, Some(identity(Role::Admin))).unwrap();
        assert!(!store.is_current(&ticket));
        assert_eq!(store.current_tree(&ticket), NavTree::Administrator);
    }

    #[tokio::test]
    async fn test_sign_out_revokes_remote_session() {
        let backend = MemoryBackend::new();
        backend.seed_account("ana@example.com", "pw123456", "Ana", Role::Admin);
        let remote = backend.sign_in("ana@example.com", "pw123456").await.unwrap();

        let store = SessionStore::new(12);
        let id = store.create(identity(Role::Admin), remote.access_token);

        let cleared = store.sign_out(&id, &backend).await;
        assert!(cleared.identity().is_none());
        assert!(!cleared.is_admin());
        assert!(store.get(&id).is_none());
        assert_eq!(backend.live_tokens(), 0);
    }

    struct FailingAuth;

    #[async_trait]
    impl AuthService for FailingAuth {
        async fn sign_in(&self, _: &str, _: &str) -> Result<AuthSession, AppError> {
            Err(AppError::Remote("down".to_string()))
        }
        async fn sign_up(&self, _: &str, _: &str) -> Result<AuthSession, AppError> {
            Err(AppError::Remote("down".to_string()))
        }
        async fn sign_out(&self, _: &str) -> Result<(), AppError> {
            Err(AppError::Remote("down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_sign_out_clears_even_when_remote_fails() {
        let store = SessionStore::new(12);
        let id = store.create(identity(Role::Admin), Some("token".to_string()));

        let cleared = store.sign_out(&id, &FailingAuth).await;
        assert!(cleared.identity().is_none());
        assert!(!cleared.is_admin());
        assert!(store.get(&id).is_none());
    }

    #[tokio::test]
    async fn test_sign_out_unknown_session_is_harmless() {
        let store = SessionStore::new(12);
        let cleared = store.sign_out("missing", &FailingAuth).await;
        assert!(cleared.identity().is_none());
    }
}
