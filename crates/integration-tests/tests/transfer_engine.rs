//! Transfer engine behaviour against mock providers and the in-memory store

mod common;

use common::{account, at, fast_limits, harness, registry_with, wait_terminal};
use std::sync::Arc;
use std::time::Duration;
use subsync_core::application::{ProviderRegistry, RateLimitConfig, RateLimits, TransferOptions};
use subsync_core::domain::{
    ContentItem, ContentKind, ContentSnapshot, FailureKind, JobKind, JobStatus, Platform,
};
use subsync_core::error::AppError;
use subsync_core::port::platform_provider::mocks::{MockOutcome, MockPlatformProvider};
use subsync_core::port::ProviderError;

fn ids(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn saved_post(id: &str, name: &str) -> ContentItem {
    ContentItem {
        id: id.to_string(),
        name: name.to_string(),
        title: format!("Post {}", id),
        url: format!("https://www.reddit.com/comments/{}", id),
        platform: Platform::Reddit,
        kind: ContentKind::Post,
        created_at: at(1_600_000_000),
        author: None,
    }
}

fn with_content(items: Vec<ContentItem>) -> TransferOptions {
    TransferOptions {
        transfer_content: true,
        content_data: Some(ContentSnapshot::new(
            Platform::Reddit,
            "alice",
            at(1_700_000_000),
            items,
        )),
    }
}

#[tokio::test]
async fn test_one_bad_item_does_not_stop_the_job() {
    let target = Arc::new(
        MockPlatformProvider::new(Platform::Reddit)
            .with_outcome("b", MockOutcome::Panic("provider bug".to_string()))
            .with_outcome(
                "c",
                MockOutcome::Error(ProviderError::Transport("connection reset".to_string())),
            )
            .with_outcome(
                "d",
                MockOutcome::Fail(FailureKind::AccessDenied, "banned".to_string()),
            ),
    );
    let h = harness(registry_with(&[target.clone()]), fast_limits());

    let id = h
        .engine
        .start_transfer(
            &account("alice", Platform::Reddit),
            &account("bob", Platform::Reddit),
            ids(&["a", "b", "c", "d", "e"]),
            TransferOptions::default(),
        )
        .await
        .unwrap();
    let job = wait_terminal(&h.engine, &id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress.processed, 5);
    assert_eq!(job.progress.successful, 2);
    assert_eq!(job.progress.failed, 3);

    let results = &job.progress.results;
    assert!(results[0].success);
    assert!(!results[1].success);
    assert_eq!(results[1].target_id, "b");
    assert_eq!(results[2].error_code, Some(FailureKind::Transport));
    assert_eq!(results[3].error.as_deref(), Some("banned"));
    assert!(results[4].success);
}

#[tokio::test]
async fn test_results_keep_submission_order_under_varying_latency() {
    let target = Arc::new(
        MockPlatformProvider::new(Platform::Youtube)
            .with_outcome(
                "slow",
                MockOutcome::Delayed(Duration::from_millis(60), Box::new(MockOutcome::Succeed)),
            )
            .with_outcome(
                "medium",
                MockOutcome::Delayed(Duration::from_millis(20), Box::new(MockOutcome::Succeed)),
            ),
    );
    let h = harness(registry_with(&[target.clone()]), fast_limits());

    let id = h
        .engine
        .start_transfer(
            &account("alice", Platform::Youtube),
            &account("bob", Platform::Youtube),
            ids(&["slow", "fast", "medium", "last"]),
            TransferOptions::default(),
        )
        .await
        .unwrap();
    let job = wait_terminal(&h.engine, &id).await;

    let order: Vec<_> = job
        .progress
        .results
        .iter()
        .map(|r| r.target_id.as_str())
        .collect();
    assert_eq!(order, vec!["slow", "fast", "medium", "last"]);
    assert_eq!(
        target.calls(),
        vec![
            "subscribe:slow",
            "subscribe:fast",
            "subscribe:medium",
            "subscribe:last"
        ]
    );
}

#[tokio::test]
async fn test_every_published_snapshot_is_consistent() {
    let target = Arc::new(
        MockPlatformProvider::new(Platform::Reddit)
            .with_content_support(true, true)
            .with_outcome(
                "x2",
                MockOutcome::Fail(FailureKind::NotFound, "gone".to_string()),
            ),
    );
    let h = harness(registry_with(&[target]), fast_limits());

    let id = h
        .engine
        .start_transfer(
            &account("alice", Platform::Reddit),
            &account("bob", Platform::Reddit),
            ids(&["x1", "x2", "x3", "x4"]),
            with_content(vec![saved_post("p1", "t3_p1"), saved_post("p2", "t3_p2")]),
        )
        .await
        .unwrap();
    wait_terminal(&h.engine, &id).await;

    let snapshots = h.repo.snapshots(&id);
    assert!(snapshots.len() >= 4 + 2);

    let mut last_processed = 0;
    for snapshot in &snapshots {
        let p = &snapshot.progress;
        assert_eq!(p.processed, p.successful + p.failed);
        assert_eq!(p.results.len(), p.processed);
        assert!(p.processed <= p.total);
        assert_eq!(p.total, 4);
        assert!(p.processed >= last_processed);
        last_processed = p.processed;

        if let Some(content) = &snapshot.content_transfer {
            let c = &content.progress;
            assert_eq!(c.processed, c.successful + c.failed);
            assert_eq!(c.results.len(), c.processed);
            assert!(c.processed <= c.total);
        }
        if snapshot.status.is_terminal() {
            assert!(snapshot.completed_at.is_some());
        } else {
            assert!(snapshot.completed_at.is_none());
        }
    }

    assert_eq!(snapshots[0].status, JobStatus::Started);
    let last = snapshots.last().unwrap();
    assert_eq!(last.status, JobStatus::Completed);
    assert_eq!(last.progress.failed, 1);
}

#[tokio::test]
async fn test_content_replay_uses_fullname_and_reports_titles() {
    let target = Arc::new(MockPlatformProvider::new(Platform::Reddit).with_content_support(true, true));
    let h = harness(registry_with(&[target.clone()]), fast_limits());

    let id = h
        .engine
        .start_transfer(
            &account("alice", Platform::Reddit),
            &account("bob", Platform::Reddit),
            ids(&["rust"]),
            with_content(vec![saved_post("abc", "t3_abc"), saved_post("xyz", "")]),
        )
        .await
        .unwrap();
    let job = wait_terminal(&h.engine, &id).await;

    assert!(target.calls().contains(&"save:t3_abc".to_string()));
    assert!(target.calls().contains(&"save:xyz".to_string()));

    let content = job.content_transfer.unwrap();
    assert!(content.enabled);
    assert_eq!(content.progress.successful, 2);
    assert_eq!(content.progress.results[0].target_id, "abc");
    assert_eq!(content.progress.results[0].target_name, "Post abc");
}

#[tokio::test]
async fn test_content_skipped_when_platforms_cannot_replay() {
    let youtube = Arc::new(MockPlatformProvider::new(Platform::Youtube).with_content_support(true, false));
    let h = harness(registry_with(&[youtube.clone()]), fast_limits());

    let id = h
        .engine
        .start_transfer(
            &account("alice", Platform::Youtube),
            &account("bob", Platform::Youtube),
            ids(&["UC1"]),
            with_content(vec![saved_post("p1", "t3_p1")]),
        )
        .await
        .unwrap();
    let job = wait_terminal(&h.engine, &id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress.successful, 1);

    let content = job.content_transfer.unwrap();
    assert!(!content.enabled);
    assert!(content
        .warning
        .as_deref()
        .unwrap()
        .contains("not supported"));
    assert_eq!(content.progress.total, 0);
    assert!(!youtube.calls().iter().any(|c| c.starts_with("save:")));
}

#[tokio::test]
async fn test_playlists_are_not_replayed_onto_reddit() {
    let youtube = Arc::new(MockPlatformProvider::new(Platform::Youtube).with_content_support(true, false));
    let reddit = Arc::new(MockPlatformProvider::new(Platform::Reddit).with_content_support(true, true));
    let h = harness(
        registry_with(&[youtube.clone(), reddit.clone()]),
        fast_limits(),
    );

    let playlist = ContentItem {
        id: "PL123".to_string(),
        name: "My Favourite Mixes".to_string(),
        title: "My Favourite Mixes".to_string(),
        url: "https://www.youtube.com/playlist?list=PL123".to_string(),
        platform: Platform::Youtube,
        kind: ContentKind::Playlist,
        created_at: at(1_600_000_000),
        author: None,
    };
    let options = TransferOptions {
        transfer_content: true,
        content_data: Some(ContentSnapshot::new(
            Platform::Youtube,
            "alice",
            at(1_700_000_000),
            vec![playlist],
        )),
    };

    let id = h
        .engine
        .start_transfer(
            &account("alice", Platform::Youtube),
            &account("bob", Platform::Reddit),
            ids(&["rust"]),
            options,
        )
        .await
        .unwrap();
    let job = wait_terminal(&h.engine, &id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(reddit.calls(), vec!["subscribe:rust"]);

    let content = job.content_transfer.unwrap();
    assert!(!content.enabled);
    assert!(content
        .warning
        .as_deref()
        .unwrap()
        .contains("between youtube and reddit"));
    assert_eq!(content.progress.total, 0);
}

#[tokio::test]
async fn test_content_ignored_without_flag() {
    let target = Arc::new(MockPlatformProvider::new(Platform::Reddit).with_content_support(true, true));
    let h = harness(registry_with(&[target.clone()]), fast_limits());

    let mut options = with_content(vec![saved_post("p1", "t3_p1")]);
    options.transfer_content = false;

    let id = h
        .engine
        .start_transfer(
            &account("alice", Platform::Reddit),
            &account("bob", Platform::Reddit),
            ids(&["rust"]),
            options,
        )
        .await
        .unwrap();
    let job = wait_terminal(&h.engine, &id).await;

    assert!(job.content_transfer.is_none());
    assert_eq!(target.calls(), vec!["subscribe:rust"]);
}

#[tokio::test]
async fn test_repeated_transfer_is_idempotent() {
    let target = Arc::new(MockPlatformProvider::new(Platform::Reddit));
    let h = harness(registry_with(&[target.clone()]), fast_limits());
    let source = account("alice", Platform::Reddit);
    let dest = account("bob", Platform::Reddit);

    let first = h
        .engine
        .start_transfer(&source, &dest, ids(&["rust", "tokio"]), TransferOptions::default())
        .await
        .unwrap();
    let first = wait_terminal(&h.engine, &first).await;
    assert!(first
        .progress
        .results
        .iter()
        .all(|r| r.success && r.already_exists.is_none()));

    let second = h
        .engine
        .start_transfer(&source, &dest, ids(&["rust", "tokio"]), TransferOptions::default())
        .await
        .unwrap();
    let second = wait_terminal(&h.engine, &second).await;

    assert_eq!(second.status, JobStatus::Completed);
    assert_eq!(second.progress.successful, 2);
    assert!(second
        .progress
        .results
        .iter()
        .all(|r| r.success && r.already_exists == Some(true)));
}

#[tokio::test]
async fn test_clear_all_unsubscribes_everything_listed() {
    let target = Arc::new(MockPlatformProvider::new(Platform::Youtube).with_subscriptions(&["UC1", "UC2", "UC3"]));
    let h = harness(registry_with(&[target.clone()]), fast_limits());

    let id = h
        .engine
        .clear_all_subscriptions(&account("bob", Platform::Youtube))
        .await
        .unwrap();
    let job = wait_terminal(&h.engine, &id).await;

    assert_eq!(job.kind, JobKind::ClearAll);
    assert_eq!(job.progress.total, 3);
    assert_eq!(job.progress.successful, 3);
    assert_eq!(
        target.calls(),
        vec!["unsubscribe:UC1", "unsubscribe:UC2", "unsubscribe:UC3"]
    );
}

#[tokio::test]
async fn test_clear_all_listing_failure_reaches_caller() {
    let target = Arc::new(MockPlatformProvider::new(Platform::Reddit).with_listing_error(ProviderError::AuthExpired));
    let h = harness(registry_with(&[target]), fast_limits());

    let err = h
        .engine
        .clear_all_subscriptions(&account("bob", Platform::Reddit))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Provider(ProviderError::AuthExpired)));
    assert!(h.engine.list_jobs().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unregistered_platform_is_rejected_before_job_exists() {
    let reddit = Arc::new(MockPlatformProvider::new(Platform::Reddit));
    let h = harness(registry_with(&[reddit]), fast_limits());

    let err = h
        .engine
        .start_transfer(
            &account("alice", Platform::Reddit),
            &account("bob", Platform::Youtube),
            ids(&["UC1"]),
            TransferOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Config(msg) if msg.contains("youtube")));
    assert!(h.engine.list_jobs().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_provider_construction_failure_fails_the_job() {
    let mut registry = ProviderRegistry::new();
    registry.register(Platform::Reddit, || {
        Err(ProviderError::Configuration(
            "Missing REDDIT_REDIRECT_URI environment variable".to_string(),
        ))
    });
    let h = harness(registry, fast_limits());

    let id = h
        .engine
        .start_transfer(
            &account("alice", Platform::Reddit),
            &account("bob", Platform::Reddit),
            ids(&["rust", "tokio"]),
            TransferOptions::default(),
        )
        .await
        .unwrap();
    let job = wait_terminal(&h.engine, &id).await;

    assert_eq!(job.status, JobStatus::Failed);
    assert!(job
        .error
        .as_deref()
        .unwrap()
        .contains("REDDIT_REDIRECT_URI"));
    assert_eq!(job.progress.processed, 0);
    assert!(job.completed_at.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_jobs_on_one_platform_share_the_rate_budget() {
    let target = Arc::new(MockPlatformProvider::new(Platform::Reddit));
    let limits = RateLimits::uniform(RateLimitConfig {
        max_requests: 2,
        window: Duration::from_secs(10),
        request_spacing: Duration::ZERO,
        capacity: 16,
    });
    let h = harness(registry_with(&[target.clone()]), limits);
    let source = account("alice", Platform::Reddit);
    let dest = account("bob", Platform::Reddit);

    let started = tokio::time::Instant::now();
    let first = h
        .engine
        .start_transfer(&source, &dest, ids(&["a", "b"]), TransferOptions::default())
        .await
        .unwrap();
    let second = h
        .engine
        .start_transfer(&source, &dest, ids(&["c", "d"]), TransferOptions::default())
        .await
        .unwrap();

    wait_terminal(&h.engine, &first).await;
    wait_terminal(&h.engine, &second).await;

    // Four calls against a budget of two per window need a second window
    assert!(started.elapsed() >= Duration::from_secs(10));
    assert_eq!(target.calls().len(), 4);
}
