// Job Reaper
// Periodic TTL eviction of finished transfer jobs

use crate::application::shutdown::ShutdownToken;
use crate::error::Result;
use crate::port::{SessionStore, TimeProvider, TransferJobRepository};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaperConfig {
    /// How long a completed/failed job stays queryable
    pub retention: Duration,
    /// How often the sweep runs
    pub interval: Duration,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            retention: Duration::from_secs(24 * 3600),
            interval: Duration::from_secs(3600),
        }
    }
}

/// Job reaper
///
/// Removes terminal jobs whose `completedAt` is older than the retention
/// window. In-flight jobs are never touched. When given a session store it
/// also drops sessions older than their own TTL on the same schedule.
pub struct JobReaper {
    job_repo: Arc<dyn TransferJobRepository>,
    time_provider: Arc<dyn TimeProvider>,
    config: ReaperConfig,
    sessions: Option<(Arc<dyn SessionStore>, Duration)>,
}

impl JobReaper {
    pub fn new(
        job_repo: Arc<dyn TransferJobRepository>,
        time_provider: Arc<dyn TimeProvider>,
        config: ReaperConfig,
    ) -> Self {
        Self {
            job_repo,
            time_provider,
            config,
            sessions: None,
        }
    }

    /// Also sweep sessions created more than `ttl` ago
    pub fn with_sessions(mut self, sessions: Arc<dyn SessionStore>, ttl: Duration) -> Self {
        self.sessions = Some((sessions, ttl));
        self
    }

    /// Run the sweep loop until shutdown (spawn with `tokio::spawn`)
    pub async fn run(self, mut shutdown: ShutdownToken) {
        info!(
            retention_secs = self.config.retention.as_secs(),
            interval_secs = self.config.interval.as_secs(),
            "Job reaper started"
        );

        let mut tick = interval(self.config.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if let Err(e) = self.run_now().await {
                        error!(error = %e, "Job eviction failed");
                    }
                }
                _ = shutdown.wait() => {
                    info!("Job reaper stopped");
                    return;
                }
            }
        }
    }

    /// Evict once
    ///
    /// # Returns
    /// Number of jobs removed (evicted sessions are only logged)
    pub async fn run_now(&self) -> Result<usize> {
        let retention = chrono::Duration::from_std(self.config.retention)
            .unwrap_or_else(|_| chrono::Duration::hours(24));
        let cutoff = self.time_provider.now() - retention;

        let evicted = self.job_repo.evict_finished_before(cutoff).await?;
        if evicted > 0 {
            info!(evicted, cutoff = %cutoff, "Evicted finished jobs");
        } else {
            debug!(cutoff = %cutoff, "No finished jobs to evict");
        }

        if let Some((sessions, ttl)) = &self.sessions {
            let ttl =
                chrono::Duration::from_std(*ttl).unwrap_or_else(|_| chrono::Duration::hours(24));
            let removed = sessions
                .evict_created_before(self.time_provider.now() - ttl)
                .await?;
            if removed > 0 {
                info!(removed, "Evicted stale sessions");
            }
        }
        Ok(evicted)
    }
}
