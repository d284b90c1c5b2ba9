//! Replays a known set of operations before traffic is served, so the caches start warm.

pub mod processor;
pub mod source;

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use operation_kit_config::cache_warmup::CacheWarmupConfig;
use tokio::task::JoinSet;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::operation::ClientInfo;
use crate::warmup::processor::{WarmedOperation, WarmupProcessor};
use crate::warmup::source::{WarmupSource, WarmupSourceError};

/// A request body to replay, with the client it is replayed as.
#[derive(Debug, Clone, PartialEq)]
pub struct WarmupItem {
    pub client: ClientInfo,
    pub body: Bytes,
}

impl WarmupItem {
    pub fn new(client: ClientInfo, body: impl Into<Bytes>) -> Self {
        Self {
            client,
            body: body.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WarmupError {
    #[error("cache warmup did not finish within {0:?}")]
    Timeout(Duration),
    #[error("cache warmup was cancelled")]
    Cancelled,
    #[error(transparent)]
    Source(#[from] WarmupSourceError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmupStats {
    pub total: usize,
    pub processed: usize,
    pub failed: usize,
}

/// Passed to the `after_operation` callback for every successfully warmed item.
#[derive(Debug, Clone)]
pub struct WarmupOperationResult {
    pub operation: WarmedOperation,
    pub client: ClientInfo,
    pub elapsed: Duration,
}

pub type AfterOperation = Arc<dyn Fn(&WarmupOperationResult) + Send + Sync>;

type SharedLimiter = Arc<tokio::sync::Mutex<Interval>>;

/// Drives warmup items through a [`WarmupProcessor`] with a fixed number of workers.
///
/// Workers pull from one shared backlog. When `items_per_second` is not zero, a single
/// limiter shared by every worker throttles how fast items are started. The whole run,
/// loading included, is bounded by `timeout`.
pub struct CacheWarmup {
    workers: usize,
    items_per_second: u64,
    timeout: Duration,
    after_operation: Option<AfterOperation>,
}

impl CacheWarmup {
    pub fn new(config: &CacheWarmupConfig) -> Self {
        Self {
            workers: config.workers.max(1),
            items_per_second: config.items_per_second,
            timeout: config.timeout,
            after_operation: None,
        }
    }

    pub fn with_after_operation<F>(mut self, callback: F) -> Self
    where
        F: Fn(&WarmupOperationResult) + Send + Sync + 'static,
    {
        self.after_operation = Some(Arc::new(callback));
        self
    }

    pub async fn run(
        &self,
        source: &dyn WarmupSource,
        processor: Arc<dyn WarmupProcessor>,
        token: CancellationToken,
    ) -> Result<WarmupStats, WarmupError> {
        let started = Instant::now();
        // A timeout too large to represent means the run is unbounded.
        let deadline = started.checked_add(self.timeout);

        let items = self
            .bounded(deadline, &token, source.load_items())
            .await??;
        if items.is_empty() {
            info!("no cache warmup items found, skipping");
            return Ok(WarmupStats::default());
        }

        let total = items.len();
        info!(
            total,
            workers = self.workers,
            items_per_second = self.items_per_second,
            "cache warmup started"
        );

        let backlog = Arc::new(Mutex::new(VecDeque::from(items)));
        let limiter = self.limiter();
        let processed = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));

        let mut workers = JoinSet::new();
        for worker in 0..self.workers {
            let backlog = backlog.clone();
            let limiter = limiter.clone();
            let processor = processor.clone();
            let processed = processed.clone();
            let failed = failed.clone();
            let after_operation = self.after_operation.clone();

            workers.spawn(async move {
                loop {
                    let next = backlog
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .pop_front();
                    let Some(item) = next else {
                        break;
                    };

                    if let Some(limiter) = &limiter {
                        limiter.lock().await.tick().await;
                    }

                    let item_started = Instant::now();
                    match processor.process(&item).await {
                        Ok(operation) => {
                            processed.fetch_add(1, Ordering::Relaxed);
                            if let Some(after_operation) = &after_operation {
                                after_operation(&WarmupOperationResult {
                                    operation,
                                    client: item.client,
                                    elapsed: item_started.elapsed(),
                                });
                            }
                        }
                        Err(err) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                            warn!(
                                worker,
                                client_name = item.client.name.as_str(),
                                client_version = item.client.version.as_str(),
                                "failed to warm up operation: {}",
                                err
                            );
                        }
                    }
                }
            });
        }

        let all_done = async {
            while let Some(result) = workers.join_next().await {
                if let Err(err) = result {
                    error!("cache warmup worker failed: {}", err);
                }
            }
        };

        let outcome = self.bounded(deadline, &token, all_done).await;
        if let Err(err) = outcome {
            workers.abort_all();
            warn!(
                processed = processed.load(Ordering::Relaxed),
                failed = failed.load(Ordering::Relaxed),
                total,
                "cache warmup stopped early: {}",
                err
            );
            return Err(err);
        }

        let stats = WarmupStats {
            total,
            processed: processed.load(Ordering::Relaxed),
            failed: failed.load(Ordering::Relaxed),
        };
        info!(
            total = stats.total,
            processed = stats.processed,
            failed = stats.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "cache warmup finished"
        );

        Ok(stats)
    }

    fn limiter(&self) -> Option<SharedLimiter> {
        if self.items_per_second == 0 {
            return None;
        }

        let period = Duration::from_secs_f64(1.0 / self.items_per_second as f64);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Some(Arc::new(tokio::sync::Mutex::new(interval)))
    }

    /// Runs `future` unless the deadline, if any, passes or the token is cancelled first.
    async fn bounded<F>(
        &self,
        deadline: Option<Instant>,
        token: &CancellationToken,
        future: F,
    ) -> Result<F::Output, WarmupError>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(WarmupError::Cancelled),
            _ = expired(deadline) => Err(WarmupError::Timeout(self.timeout)),
            output = future => Ok(output),
        }
    }
}

async fn expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
