// Outbound Rate Limiter
// Serializes calls against one platform inside a sliding request budget

use crate::domain::Platform;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, error};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    /// The consumer task is gone; nothing was executed
    #[error("rate limiter is closed")]
    Closed,

    /// The operation panicked while executing
    #[error("operation aborted: {0}")]
    OperationAborted(String),
}

/// Budget for one platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Operations allowed per window
    pub max_requests: u32,
    pub window: Duration,
    /// Pause after each operation before the next one is dequeued
    pub request_spacing: Duration,
    /// Bounded queue size; submitters wait when it is full
    pub capacity: usize,
}

impl RateLimitConfig {
    pub const DEFAULT_SPACING: Duration = Duration::from_millis(200);
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Platform defaults, kept below the published limits
    ///
    /// # Example
    /// ```text
    /// reddit:  80 requests / 60s, 200ms spacing
    /// youtube: 90 requests / 60s, 200ms spacing
    /// ```
    pub fn for_platform(platform: Platform) -> Self {
        let max_requests = match platform {
            Platform::Reddit => 80,
            Platform::Youtube => 90,
        };
        Self {
            max_requests,
            window: Duration::from_secs(60),
            request_spacing: Self::DEFAULT_SPACING,
            capacity: Self::DEFAULT_CAPACITY,
        }
    }
}

/// Per-platform limiter configuration table
#[derive(Debug, Clone)]
pub struct RateLimits {
    configs: HashMap<Platform, RateLimitConfig>,
}

impl RateLimits {
    /// Same budget for every platform (handy in tests)
    pub fn uniform(config: RateLimitConfig) -> Self {
        Self {
            configs: Platform::ALL.iter().map(|p| (*p, config)).collect(),
        }
    }

    pub fn with(mut self, platform: Platform, config: RateLimitConfig) -> Self {
        self.configs.insert(platform, config);
        self
    }

    pub fn get(&self, platform: Platform) -> RateLimitConfig {
        self.configs
            .get(&platform)
            .copied()
            .unwrap_or_else(|| RateLimitConfig::for_platform(platform))
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            configs: Platform::ALL
                .iter()
                .map(|p| (*p, RateLimitConfig::for_platform(*p)))
                .collect(),
        }
    }
}

type QueuedOp = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// FIFO executor with a sliding-window budget
///
/// A single consumer task owns the window state, so there is exactly one
/// operation in flight per limiter. Each operation runs in its own spawned
/// task; a panic there is reported to that submitter only.
#[derive(Clone)]
pub struct RateLimiter {
    tx: mpsc::Sender<QueuedOp>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// Create the limiter and spawn its consumer
    ///
    /// Must be called inside a tokio runtime. The consumer exits once every
    /// handle is dropped and the queue has drained.
    pub fn new(config: RateLimitConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.capacity.max(1));
        tokio::spawn(consume(rx, config));
        Self { tx, config }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Enqueue an operation and wait for its output
    ///
    /// The operation's own `Result` (if any) is passed through untouched.
    ///
    /// # Errors
    /// - `RateLimitError::Closed` if the consumer has stopped
    /// - `RateLimitError::OperationAborted` if the operation panicked
    pub async fn submit<F, Fut, T>(&self, op: F) -> Result<T, RateLimitError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();
        let queued: QueuedOp = Box::new(move || {
            Box::pin(async move {
                let output = op().await;
                let _ = done_tx.send(output);
            })
        });

        self.tx
            .send(queued)
            .await
            .map_err(|_| RateLimitError::Closed)?;

        // Sender dropped without a value: the operation unwound
        done_rx
            .await
            .map_err(|_| RateLimitError::OperationAborted("operation panicked".to_string()))
    }
}

async fn consume(mut rx: mpsc::Receiver<QueuedOp>, config: RateLimitConfig) {
    let mut window_start = Instant::now();
    let mut count: u32 = 0;

    while let Some(op) = rx.recv().await {
        let now = Instant::now();
        if now.duration_since(window_start) >= config.window {
            window_start = now;
            count = 0;
        }

        if count >= config.max_requests {
            let resume_at = window_start + config.window;
            debug!(
                max_requests = config.max_requests,
                wait_ms = resume_at.saturating_duration_since(now).as_millis() as u64,
                "Rate limit window exhausted, waiting"
            );
            sleep_until(resume_at).await;
            window_start = Instant::now();
            count = 0;
        }

        count += 1;

        if let Err(e) = tokio::spawn(op()).await {
            if e.is_panic() {
                error!(panic_msg = %panic_message(e.into_panic()), "Rate-limited operation panicked");
            }
        }

        if !config.request_spacing.is_zero() {
            sleep(config.request_spacing).await;
        }
    }

    debug!("Rate limiter queue closed");
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use std::sync::{Arc, Mutex};

    fn config(max_requests: u32, window_ms: u64, spacing_ms: u64) -> RateLimitConfig {
        RateLimitConfig {
            max_requests,
            window: Duration::from_millis(window_ms),
            request_spacing: Duration::from_millis(spacing_ms),
            capacity: 16,
        }
    }

    #[test]
    fn test_platform_defaults() {
        let reddit = RateLimitConfig::for_platform(Platform::Reddit);
        let youtube = RateLimitConfig::for_platform(Platform::Youtube);
        assert_eq!(reddit.max_requests, 80);
        assert_eq!(youtube.max_requests, 90);
        assert_eq!(reddit.window, Duration::from_secs(60));
        assert_eq!(reddit.request_spacing, Duration::from_millis(200));

        let limits = RateLimits::default().with(Platform::Reddit, config(5, 1000, 0));
        assert_eq!(limits.get(Platform::Reddit).max_requests, 5);
        assert_eq!(limits.get(Platform::Youtube).max_requests, 90);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_rolls_over_after_budget_is_spent() {
        let limiter = RateLimiter::new(config(3, 1000, 0));
        let start = Instant::now();

        let futures = (0..5).map(|_| limiter.submit(|| async { Instant::now() }));
        let executed_at: Vec<Instant> = join_all(futures)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        for at in &executed_at[..3] {
            assert!(at.duration_since(start) < Duration::from_millis(1000));
        }
        for at in &executed_at[3..] {
            assert!(at.duration_since(start) >= Duration::from_millis(1000));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_spacing_between_operations() {
        let limiter = RateLimiter::new(config(100, 60_000, 200));
        let start = Instant::now();

        let futures = (0..3).map(|_| limiter.submit(|| async { Instant::now() }));
        let executed_at: Vec<Instant> = join_all(futures)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert!(executed_at[1].duration_since(start) >= Duration::from_millis(200));
        assert!(executed_at[2].duration_since(start) >= Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fifo_order_with_varying_latency() {
        let limiter = RateLimiter::new(config(100, 60_000, 0));
        let order = Arc::new(Mutex::new(Vec::new()));

        let latencies = [50u64, 5, 30, 0, 10];
        let futures = latencies.iter().enumerate().map(|(i, latency)| {
            let order = order.clone();
            let latency = *latency;
            limiter.submit(move || async move {
                tokio::time::sleep(Duration::from_millis(latency)).await;
                order.lock().unwrap().push(i);
            })
        });
        join_all(futures).await;

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_and_panic_do_not_stop_queue() {
        let limiter = RateLimiter::new(config(100, 60_000, 0));

        let failing = limiter.submit(|| async { Err::<u32, String>("boom".to_string()) });
        let panicking = limiter.submit(|| async {
            panic!("provider blew up");
        });
        let healthy = limiter.submit(|| async { Ok::<u32, String>(7) });

        let (failing, panicking, healthy): (_, Result<(), _>, _) =
            tokio::join!(failing, panicking, healthy);

        assert_eq!(failing.unwrap(), Err("boom".to_string()));
        assert!(matches!(
            panicking,
            Err(RateLimitError::OperationAborted(_))
        ));
        assert_eq!(healthy.unwrap(), Ok(7));
    }
}
