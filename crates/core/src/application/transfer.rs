// Transfer Engine
// Background subscription replay across platform accounts

use crate::application::rate_limiter::{RateLimitError, RateLimiter, RateLimits};
use crate::application::registry::ProviderRegistry;
use crate::domain::{
    Account, ContentItem, ContentSnapshot, FailureKind, JobId, JobKind, Platform, TransferJob,
    TransferResult,
};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, PlatformProvider, TimeProvider, TransferJobRepository};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Optional saved-content replay for a transfer
#[derive(Debug, Clone, Default)]
pub struct TransferOptions {
    pub transfer_content: bool,
    /// Snapshot previously exported from the source account
    pub content_data: Option<ContentSnapshot>,
}

impl TransferOptions {
    /// Content replay happens only when requested and data was supplied
    fn content_items(&self) -> Option<&[ContentItem]> {
        match (&self.content_data, self.transfer_content) {
            (Some(snapshot), true) => Some(&snapshot.content),
            _ => None,
        }
    }
}

/// Transfer Engine
///
/// Owns the job lifecycle: creates the job record, runs it on a background
/// task and publishes a snapshot after every item. Remote calls for the same
/// platform share one [`RateLimiter`] across all jobs.
pub struct TransferEngine {
    registry: Arc<ProviderRegistry>,
    job_repo: Arc<dyn TransferJobRepository>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    limits: RateLimits,
    limiters: Mutex<HashMap<Platform, RateLimiter>>,
}

impl TransferEngine {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        job_repo: Arc<dyn TransferJobRepository>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        limits: RateLimits,
    ) -> Self {
        Self {
            registry,
            job_repo,
            id_provider,
            time_provider,
            limits,
            limiters: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Start subscribing `target` to each of `item_ids`
    ///
    /// Returns as soon as the job is stored; progress is read through
    /// [`TransferEngine::get_status`].
    ///
    /// # Arguments
    ///
    /// * `source` / `target` - Authenticated accounts (platforms may differ)
    /// * `item_ids` - Platform-specific ids, processed in this order
    /// * `options` - Saved-content replay
    ///
    /// # Errors
    /// `AppError::Config` if either platform has no registered provider
    pub async fn start_transfer(
        &self,
        source: &Account,
        target: &Account,
        item_ids: Vec<String>,
        options: TransferOptions,
    ) -> Result<JobId> {
        self.ensure_registered(source.platform)?;
        self.ensure_registered(target.platform)?;

        let mut job = TransferJob::new(
            self.id_provider.generate_id(),
            JobKind::Transfer,
            source,
            target,
            item_ids.len(),
            self.time_provider.now(),
        );
        let content = options.content_items().map(|items| items.to_vec());
        if let Some(items) = &content {
            job = job.with_content(items.len());
        }

        self.job_repo.insert(&job).await?;

        info!(
            transfer_id = %job.id,
            source_platform = %source.platform,
            target_platform = %target.platform,
            total = job.progress.total,
            content_items = content.as_ref().map(|c| c.len()).unwrap_or(0),
            "Transfer started"
        );

        let job_id = job.id.clone();
        let runner = self.runner(source.clone(), target.clone(), item_ids, content);
        tokio::spawn(runner.run(job));

        Ok(job_id)
    }

    /// Unsubscribe `target` from everything it currently follows
    ///
    /// The subscription list is fetched before the job exists, so listing
    /// failures surface to the caller directly.
    pub async fn clear_all_subscriptions(&self, target: &Account) -> Result<JobId> {
        self.ensure_registered(target.platform)?;

        let provider = self.registry.create(target.platform)?;
        let subscriptions = provider.get_subscriptions(&target.access_token).await?;
        let item_ids: Vec<String> = subscriptions.into_iter().map(|s| s.id).collect();

        let job = TransferJob::new(
            self.id_provider.generate_id(),
            JobKind::ClearAll,
            target,
            target,
            item_ids.len(),
            self.time_provider.now(),
        );
        self.job_repo.insert(&job).await?;

        info!(
            transfer_id = %job.id,
            platform = %target.platform,
            total = job.progress.total,
            "Clear-all started"
        );

        let job_id = job.id.clone();
        let runner = self.runner(target.clone(), target.clone(), item_ids, None);
        tokio::spawn(runner.run(job));

        Ok(job_id)
    }

    /// Point-in-time copy of a job
    pub async fn get_status(&self, job_id: &JobId) -> Result<Option<TransferJob>> {
        self.job_repo.find_by_id(job_id).await
    }

    /// All known jobs, newest first
    pub async fn list_jobs(&self) -> Result<Vec<TransferJob>> {
        self.job_repo.list().await
    }

    fn ensure_registered(&self, platform: Platform) -> Result<()> {
        if self.registry.is_registered(platform) {
            Ok(())
        } else {
            Err(AppError::Config(format!(
                "Provider for {} is not registered",
                platform
            )))
        }
    }

    /// Limiter shared by every job targeting `platform`
    fn limiter(&self, platform: Platform) -> RateLimiter {
        let mut limiters = self
            .limiters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        limiters
            .entry(platform)
            .or_insert_with(|| RateLimiter::new(self.limits.get(platform)))
            .clone()
    }

    fn runner(
        &self,
        source: Account,
        target: Account,
        item_ids: Vec<String>,
        content: Option<Vec<ContentItem>>,
    ) -> JobRunner {
        JobRunner {
            registry: self.registry.clone(),
            job_repo: self.job_repo.clone(),
            time_provider: self.time_provider.clone(),
            limiter: self.limiter(target.platform),
            source,
            target,
            item_ids,
            content,
        }
    }
}

/// State moved into the background task of one job
struct JobRunner {
    registry: Arc<ProviderRegistry>,
    job_repo: Arc<dyn TransferJobRepository>,
    time_provider: Arc<dyn TimeProvider>,
    limiter: RateLimiter,
    source: Account,
    target: Account,
    item_ids: Vec<String>,
    content: Option<Vec<ContentItem>>,
}

impl JobRunner {
    async fn run(self, mut job: TransferJob) {
        match self.drive(&mut job).await {
            Ok(()) => {
                info!(
                    transfer_id = %job.id,
                    successful = job.progress.successful,
                    failed = job.progress.failed,
                    total = job.progress.total,
                    "Transfer completed"
                );
            }
            Err(e) => {
                error!(transfer_id = %job.id, error = %e, "Transfer failed");
                job.fail(self.time_provider.now(), e.to_string());
                if let Err(e) = self.job_repo.update(&job).await {
                    error!(transfer_id = %job.id, error = %e, "Failed to persist failed job");
                }
            }
        }
    }

    async fn drive(&self, job: &mut TransferJob) -> Result<()> {
        job.start()?;
        self.job_repo.update(job).await?;

        let target_provider = self.registry.create(self.target.platform)?;

        for item_id in &self.item_ids {
            let result = self.apply(job.kind, &target_provider, item_id).await;
            debug!(
                transfer_id = %job.id,
                target_id = %item_id,
                success = result.success,
                processed = job.progress.processed + 1,
                total = job.progress.total,
                "Item processed"
            );
            job.progress.record(result)?;
            self.job_repo.update(job).await?;
        }

        if let Some(items) = &self.content {
            self.replay_content(job, &target_provider, items).await?;
        }

        job.complete(self.time_provider.now())?;
        self.job_repo.update(job).await?;
        Ok(())
    }

    async fn apply(
        &self,
        kind: JobKind,
        provider: &Arc<dyn PlatformProvider>,
        item_id: &str,
    ) -> TransferResult {
        let provider = provider.clone();
        let token = self.target.access_token.clone();
        let id = item_id.to_string();

        let outcome = self
            .limiter
            .submit(move || async move {
                match kind {
                    JobKind::Transfer => provider.subscribe(&token, &id).await,
                    JobKind::ClearAll => provider.unsubscribe(&token, &id).await,
                }
            })
            .await;

        settle(item_id, item_id, outcome)
    }

    async fn replay_content(
        &self,
        job: &mut TransferJob,
        target_provider: &Arc<dyn PlatformProvider>,
        items: &[ContentItem],
    ) -> Result<()> {
        let source_provider = self.registry.create(self.source.platform)?;
        let can_list = source_provider.capabilities().list_content;
        let can_save = target_provider.capabilities().save_content;
        // Saved items are only meaningful on the platform they came from
        let same_platform = self.source.platform == self.target.platform
            && items.iter().all(|item| item.platform == self.target.platform);

        if !(can_list && can_save && same_platform) {
            let warning = format!(
                "Content transfer not supported between {} and {}",
                self.source.platform, self.target.platform
            );
            warn!(transfer_id = %job.id, "{}", warning);
            if let Some(content) = job.content_transfer.as_mut() {
                content.skip(warning);
            }
            self.job_repo.update(job).await?;
            return Ok(());
        }

        info!(transfer_id = %job.id, total = items.len(), "Starting saved content transfer");

        for item in items {
            let provider = target_provider.clone();
            let token = self.target.access_token.clone();
            let fullname = if item.name.is_empty() {
                item.id.clone()
            } else {
                item.name.clone()
            };

            let outcome = self
                .limiter
                .submit(move || async move { provider.save_content(&token, &fullname).await })
                .await;

            let mut result = settle(&item.id, &item.title, outcome);
            result.target_id = item.id.clone();
            result.target_name = item.title.clone();

            if let Some(content) = job.content_transfer.as_mut() {
                content.progress.record(result)?;
            }
            self.job_repo.update(job).await?;
        }

        Ok(())
    }
}

/// Collapse provider faults and limiter aborts into a failed item
fn settle(
    target_id: &str,
    target_name: &str,
    outcome: std::result::Result<
        std::result::Result<TransferResult, crate::port::ProviderError>,
        RateLimitError,
    >,
) -> TransferResult {
    match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            warn!(target_id = %target_id, error = %e, "Provider call failed");
            let mut result = e.into_result(target_id);
            result.target_name = target_name.to_string();
            result
        }
        Err(e) => {
            warn!(target_id = %target_id, error = %e, "Rate-limited call aborted");
            TransferResult::failed(target_id, target_name, FailureKind::Unknown, e.to_string())
        }
    }
}
