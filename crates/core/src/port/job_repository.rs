// Transfer Job Repository Port (Interface)

use crate::domain::{JobId, TransferJob};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Storage for transfer job snapshots
///
/// Every read returns an owned copy; callers never observe later mutation.
#[async_trait]
pub trait TransferJobRepository: Send + Sync {
    /// Insert a new job
    async fn insert(&self, job: &TransferJob) -> Result<()>;

    /// Find job by ID
    async fn find_by_id(&self, id: &JobId) -> Result<Option<TransferJob>>;

    /// Replace the stored snapshot of an existing job
    async fn update(&self, job: &TransferJob) -> Result<()>;

    /// All jobs, newest first
    async fn list(&self) -> Result<Vec<TransferJob>>;

    /// Remove terminal jobs completed before `cutoff`
    ///
    /// # Returns
    /// Number of jobs removed
    async fn evict_finished_before(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}
