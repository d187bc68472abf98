// In-memory SessionStore & PendingAuthStore

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use subsync_core::domain::{Account, AccountRole, PendingAuth, Session, SessionId};
use subsync_core::error::{AppError, Result};
use subsync_core::port::{IdProvider, PendingAuthStore, SessionStore, TimeProvider};
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl InMemorySessionStore {
    pub fn new(id_provider: Arc<dyn IdProvider>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            id_provider,
            time_provider,
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(&self) -> Result<Session> {
        let session = Session::new(self.id_provider.generate_id(), self.time_provider.now());
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        debug!(session_id = %session.id, "Session created");
        Ok(session)
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn set_account(
        &self,
        id: &SessionId,
        role: AccountRole,
        account: Account,
    ) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))?;
        debug!(session_id = %id, role = %role, platform = %account.platform, "Account attached");
        session.set_account(role, account);
        Ok(())
    }

    async fn delete_session(&self, id: &SessionId) -> Result<bool> {
        let removed = self.sessions.write().await.remove(id).is_some();
        debug!(session_id = %id, removed, "Session deleted");
        Ok(removed)
    }

    async fn evict_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.created_at >= cutoff);
        let evicted = before - sessions.len();
        debug!(evicted, remaining = sessions.len(), "Evicted stale sessions");
        Ok(evicted)
    }
}

/// OAuth `state` table with single-use entries
///
/// Entries older than `ttl` are treated as absent.
pub struct InMemoryPendingAuthStore {
    pending: RwLock<HashMap<String, PendingAuth>>,
    time_provider: Arc<dyn TimeProvider>,
    ttl: Duration,
}

impl InMemoryPendingAuthStore {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

    pub fn new(time_provider: Arc<dyn TimeProvider>, ttl: Duration) -> Self {
        Self {
            pending: RwLock::new(HashMap::new()),
            time_provider,
            ttl,
        }
    }

    fn is_stale(&self, pending: &PendingAuth) -> bool {
        let age = self.time_provider.now() - pending.created_at;
        age.to_std().map(|age| age > self.ttl).unwrap_or(false)
    }
}

#[async_trait]
impl PendingAuthStore for InMemoryPendingAuthStore {
    async fn put(&self, state: &str, pending: PendingAuth) -> Result<()> {
        let mut table = self.pending.write().await;
        table.retain(|_, p| !self.is_stale(p));
        table.insert(state.to_string(), pending);
        Ok(())
    }

    async fn take(&self, state: &str) -> Result<Option<PendingAuth>> {
        let taken = self.pending.write().await.remove(state);
        match taken {
            Some(p) if self.is_stale(&p) => {
                warn!(platform = %p.platform, "Discarding expired OAuth state");
                Ok(None)
            }
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subsync_core::domain::Platform;
    use subsync_core::port::id_provider::mocks::SequentialIdProvider;
    use subsync_core::port::time_provider::mocks::FixedTimeProvider;

    fn clock() -> Arc<FixedTimeProvider> {
        Arc::new(FixedTimeProvider::new(
            DateTime::<Utc>::from_timestamp(1_000, 0).unwrap(),
        ))
    }

    fn account(platform: Platform) -> Account {
        Account {
            username: "alice".to_string(),
            display_name: "u/alice".to_string(),
            access_token: "token".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc::now(),
            platform,
        }
    }

    #[tokio::test]
    async fn test_create_and_attach_accounts() {
        let store = InMemorySessionStore::new(Arc::new(SequentialIdProvider::new("sess")), clock());
        let session = store.create_session().await.unwrap();
        assert_eq!(session.id, "sess-1");
        assert!(session.source.is_none());

        tokio_test::assert_ok!(
            store
                .set_account(&session.id, AccountRole::Target, account(Platform::Youtube))
                .await
        );

        let stored = store.get_session(&session.id).await.unwrap().unwrap();
        assert!(stored.source.is_none());
        assert_eq!(
            stored.account(AccountRole::Target).unwrap().platform,
            Platform::Youtube
        );
    }

    #[test]
    fn test_set_account_on_unknown_session() {
        let store = InMemorySessionStore::new(Arc::new(SequentialIdProvider::new("sess")), clock());
        let err = tokio_test::block_on(store.set_account(
            &"nope".to_string(),
            AccountRole::Source,
            account(Platform::Reddit),
        ))
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_pending_state_is_single_use_and_expires() {
        let clock = clock();
        let store = InMemoryPendingAuthStore::new(clock.clone(), Duration::from_secs(600));
        let pending = PendingAuth {
            role: AccountRole::Source,
            session_id: "sess-1".to_string(),
            platform: Platform::Reddit,
            created_at: clock.now(),
        };

        store.put("state-a", pending.clone()).await.unwrap();
        assert_eq!(store.take("state-a").await.unwrap(), Some(pending.clone()));
        assert_eq!(store.take("state-a").await.unwrap(), None);

        store.put("state-b", pending).await.unwrap();
        clock.advance(chrono::Duration::minutes(11));
        assert_eq!(store.take("state-b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let store = InMemorySessionStore::new(Arc::new(SequentialIdProvider::new("sess")), clock());
        let session = store.create_session().await.unwrap();

        assert!(store.delete_session(&session.id).await.unwrap());
        assert!(store.get_session(&session.id).await.unwrap().is_none());
        assert!(!store.delete_session(&session.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_evict_only_sessions_older_than_cutoff() {
        let clock = clock();
        let store =
            InMemorySessionStore::new(Arc::new(SequentialIdProvider::new("sess")), clock.clone());
        let old = store.create_session().await.unwrap();
        clock.advance(chrono::Duration::hours(2));
        let fresh = store.create_session().await.unwrap();

        let cutoff = clock.now() - chrono::Duration::hours(1);
        assert_eq!(store.evict_created_before(cutoff).await.unwrap(), 1);

        assert!(store.get_session(&old.id).await.unwrap().is_none());
        assert!(store.get_session(&fresh.id).await.unwrap().is_some());
    }
}
