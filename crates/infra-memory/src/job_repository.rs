// In-memory TransferJobRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use subsync_core::domain::{JobId, TransferJob};
use subsync_core::error::{AppError, Result};
use subsync_core::port::TransferJobRepository;
use tokio::sync::RwLock;
use tracing::debug;

/// Process-local job table
///
/// Jobs live until evicted; restart loses them.
#[derive(Default)]
pub struct InMemoryTransferJobRepository {
    jobs: RwLock<HashMap<JobId, TransferJob>>,
}

impl InMemoryTransferJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransferJobRepository for InMemoryTransferJobRepository {
    async fn insert(&self, job: &TransferJob) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(AppError::Validation(format!(
                "Job {} already exists",
                job.id
            )));
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &JobId) -> Result<Option<TransferJob>> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn update(&self, job: &TransferJob) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&job.id) {
            Some(slot) => {
                *slot = job.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Job {} not found", job.id))),
        }
    }

    async fn list(&self) -> Result<Vec<TransferJob>> {
        let mut jobs: Vec<TransferJob> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(b.id.cmp(&a.id)));
        Ok(jobs)
    }

    async fn evict_finished_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| {
            !(job.is_terminal() && job.completed_at.map(|at| at < cutoff).unwrap_or(false))
        });
        let evicted = before - jobs.len();
        debug!(evicted, remaining = jobs.len(), "Evicted finished jobs");
        Ok(evicted)
    }
}
