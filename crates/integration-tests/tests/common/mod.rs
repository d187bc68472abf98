//! Shared wiring for engine-level tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use subsync_core::application::{
    ProviderRegistry, RateLimitConfig, RateLimits, TransferEngine,
};
use subsync_core::domain::{Account, JobId, Platform, TransferJob};
use subsync_core::error::Result;
use subsync_core::port::id_provider::mocks::SequentialIdProvider;
use subsync_core::port::platform_provider::mocks::MockPlatformProvider;
use subsync_core::port::time_provider::mocks::FixedTimeProvider;
use subsync_core::port::{PlatformProvider, TransferJobRepository};
use subsync_infra_memory::InMemoryTransferJobRepository;

pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
}

pub fn account(name: &str, platform: Platform) -> Account {
    Account {
        username: name.to_string(),
        display_name: format!("{} ({})", name, platform),
        access_token: format!("{}-token", name),
        refresh_token: String::new(),
        expires_at: at(2_000_000_000),
        platform,
    }
}

pub fn fast_limits() -> RateLimits {
    RateLimits::uniform(RateLimitConfig {
        max_requests: 1_000,
        window: Duration::from_secs(60),
        request_spacing: Duration::ZERO,
        capacity: 64,
    })
}

/// Register one shared mock instance per platform
pub fn registry_with(providers: &[Arc<MockPlatformProvider>]) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for provider in providers {
        let provider = provider.clone();
        registry.register(provider.platform(), move || {
            Ok(provider.clone() as Arc<dyn PlatformProvider>)
        });
    }
    registry
}

/// In-memory repository that also keeps every published snapshot
#[derive(Default)]
pub struct RecordingRepository {
    inner: InMemoryTransferJobRepository,
    snapshots: Mutex<Vec<TransferJob>>,
}

impl RecordingRepository {
    pub fn snapshots(&self, id: &str) -> Vec<TransferJob> {
        self.snapshots
            .lock()
            .unwrap()
            .iter()
            .filter(|job| job.id == id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TransferJobRepository for RecordingRepository {
    async fn insert(&self, job: &TransferJob) -> Result<()> {
        self.snapshots.lock().unwrap().push(job.clone());
        self.inner.insert(job).await
    }

    async fn find_by_id(&self, id: &JobId) -> Result<Option<TransferJob>> {
        self.inner.find_by_id(id).await
    }

    async fn update(&self, job: &TransferJob) -> Result<()> {
        self.snapshots.lock().unwrap().push(job.clone());
        self.inner.update(job).await
    }

    async fn list(&self) -> Result<Vec<TransferJob>> {
        self.inner.list().await
    }

    async fn evict_finished_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        self.inner.evict_finished_before(cutoff).await
    }
}

pub struct Harness {
    pub engine: TransferEngine,
    pub repo: Arc<RecordingRepository>,
}

pub fn harness(registry: ProviderRegistry, limits: RateLimits) -> Harness {
    let repo = Arc::new(RecordingRepository::default());
    let engine = TransferEngine::new(
        Arc::new(registry),
        repo.clone(),
        Arc::new(SequentialIdProvider::new("transfer")),
        Arc::new(FixedTimeProvider::new(at(1_700_000_000))),
        limits,
    );
    Harness { engine, repo }
}

pub async fn wait_terminal(engine: &TransferEngine, id: &JobId) -> TransferJob {
    for _ in 0..4_000 {
        if let Some(job) = engine.get_status(id).await.unwrap() {
            if job.is_terminal() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("transfer {} did not reach a terminal state", id);
}
