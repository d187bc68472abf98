//! Retention sweeps over the in-memory job store

mod common;

use common::{account, at, fast_limits, registry_with, wait_terminal};
use std::sync::Arc;
use std::time::Duration;
use subsync_core::application::{
    shutdown_channel, JobReaper, ReaperConfig, TransferEngine, TransferOptions,
};
use subsync_core::domain::{JobKind, Platform, TransferJob};
use subsync_core::port::id_provider::mocks::SequentialIdProvider;
use subsync_core::port::platform_provider::mocks::MockPlatformProvider;
use subsync_core::port::time_provider::mocks::FixedTimeProvider;
use subsync_core::port::{SessionStore, TransferJobRepository};
use subsync_infra_memory::{InMemorySessionStore, InMemoryTransferJobRepository};

const DAY: i64 = 24 * 3600;

fn config() -> ReaperConfig {
    ReaperConfig {
        retention: Duration::from_secs(DAY as u64),
        interval: Duration::from_secs(3600),
    }
}

fn job(id: &str) -> TransferJob {
    TransferJob::new(
        id,
        JobKind::Transfer,
        &account("alice", Platform::Reddit),
        &account("bob", Platform::Reddit),
        0,
        at(1_000_000),
    )
}

fn finished(id: &str, completed_secs: i64) -> TransferJob {
    let mut job = job(id);
    job.start().unwrap();
    job.complete(at(completed_secs)).unwrap();
    job
}

#[tokio::test]
async fn test_sweep_keeps_recent_and_in_flight_jobs() {
    let repo = Arc::new(InMemoryTransferJobRepository::new());
    let now = 10 * DAY;

    let mut failed_long_ago = job("failed-old");
    failed_long_ago.fail(at(now - 3 * DAY), "boom");
    let mut running = job("running");
    running.start().unwrap();

    for entry in [
        finished("done-old", now - 2 * DAY),
        finished("done-recent", now - 3600),
        failed_long_ago,
        running,
        job("queued"),
    ] {
        repo.insert(&entry).await.unwrap();
    }

    let reaper = JobReaper::new(
        repo.clone(),
        Arc::new(FixedTimeProvider::new(at(now))),
        config(),
    );

    assert_eq!(reaper.run_now().await.unwrap(), 2);

    let mut left: Vec<_> = repo
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|j| j.id)
        .collect();
    left.sort();
    assert_eq!(left, vec!["done-recent", "queued", "running"]);

    // Nothing else is old enough yet
    assert_eq!(reaper.run_now().await.unwrap(), 0);
}

#[tokio::test]
async fn test_engine_jobs_expire_after_retention() {
    let repo = Arc::new(InMemoryTransferJobRepository::new());
    let clock = Arc::new(FixedTimeProvider::new(at(1_700_000_000)));
    let target = Arc::new(MockPlatformProvider::new(Platform::Youtube));
    let engine = TransferEngine::new(
        Arc::new(registry_with(&[target])),
        repo.clone(),
        Arc::new(SequentialIdProvider::new("transfer")),
        clock.clone(),
        fast_limits(),
    );

    let id = engine
        .start_transfer(
            &account("alice", Platform::Youtube),
            &account("bob", Platform::Youtube),
            vec!["UC1".to_string()],
            TransferOptions::default(),
        )
        .await
        .unwrap();
    wait_terminal(&engine, &id).await;

    let reaper = JobReaper::new(repo.clone(), clock.clone(), config());

    clock.advance(chrono::Duration::hours(23));
    assert_eq!(reaper.run_now().await.unwrap(), 0);
    assert!(engine.get_status(&id).await.unwrap().is_some());

    clock.advance(chrono::Duration::hours(2));
    assert_eq!(reaper.run_now().await.unwrap(), 1);
    assert!(engine.get_status(&id).await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_background_loop_sweeps_until_shutdown() {
    let repo = Arc::new(InMemoryTransferJobRepository::new());
    let now = 10 * DAY;
    repo.insert(&finished("done-old", now - 2 * DAY))
        .await
        .unwrap();

    let reaper = JobReaper::new(
        repo.clone(),
        Arc::new(FixedTimeProvider::new(at(now))),
        config(),
    );
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let handle = tokio::spawn(reaper.run(shutdown_rx));

    // First tick fires immediately
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(repo.list().await.unwrap().is_empty());

    repo.insert(&finished("done-later", now - 2 * DAY))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert!(repo.list().await.unwrap().is_empty());

    shutdown_tx.shutdown();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_sweep_drops_sessions_past_their_ttl() {
    let clock = Arc::new(FixedTimeProvider::new(at(10 * DAY)));
    let sessions = Arc::new(InMemorySessionStore::new(
        Arc::new(SequentialIdProvider::new("session")),
        clock.clone(),
    ));
    let stale = sessions.create_session().await.unwrap();
    clock.advance(chrono::Duration::hours(20));
    let recent = sessions.create_session().await.unwrap();
    clock.advance(chrono::Duration::hours(5));

    let reaper = JobReaper::new(
        Arc::new(InMemoryTransferJobRepository::new()),
        clock.clone(),
        config(),
    )
    .with_sessions(sessions.clone(), Duration::from_secs(DAY as u64));

    assert_eq!(reaper.run_now().await.unwrap(), 0);
    assert!(sessions.get_session(&stale.id).await.unwrap().is_none());
    assert!(sessions.get_session(&recent.id).await.unwrap().is_some());
}
