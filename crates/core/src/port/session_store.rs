// Session & OAuth pending-state ports

use crate::domain::{Account, AccountRole, PendingAuth, Session, SessionId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self) -> Result<Session>;

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>>;

    /// Attach an authenticated account to a session
    ///
    /// # Errors
    /// `AppError::NotFound` if the session does not exist
    async fn set_account(&self, id: &SessionId, role: AccountRole, account: Account)
        -> Result<()>;

    /// Drop a session and its accounts; `false` if it did not exist
    async fn delete_session(&self, id: &SessionId) -> Result<bool>;

    /// Remove sessions created before `cutoff`
    ///
    /// # Returns
    /// Number of sessions removed
    async fn evict_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}

/// Correlates an OAuth `state` token across the redirect round trip
#[async_trait]
pub trait PendingAuthStore: Send + Sync {
    async fn put(&self, state: &str, pending: PendingAuth) -> Result<()>;

    /// Remove and return the pending entry (single use)
    async fn take(&self, state: &str) -> Result<Option<PendingAuth>>;
}
