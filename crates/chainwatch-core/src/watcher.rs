//! The caller-facing watcher facade.
//!
//! [`Watcher`] composes the subscription registry, the refresh loop,
//! and a ledger source into the three public operations: current block
//! height, subscribe, and snapshot read. It also owns the lifecycle of
//! the background loop: [`start`](Watcher::start) spawns it once,
//! [`shutdown`](Watcher::shutdown) signals it and awaits the task for a
//! clean-shutdown confirmation.
//!
//! # Errors
//!
//! Nothing here returns an error. Height failures collapse into the
//! [`HEIGHT_UNAVAILABLE`] sentinel, a failed initial refresh leaves the
//! fresh subscription empty until the next cycle, and snapshot reads
//! have no failure mode at all. The error channel callers do not get is
//! replaced by `tracing` output.

use std::sync::Arc;
use std::time::Duration;

use chainwatch_types::{Address, Transaction};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::registry::{SubscriptionInfo, SubscriptionRegistry};
use crate::scheduler::{RefreshScheduler, SchedulerControl};
use crate::source::LedgerSource;

/// Height reported by [`Watcher::current_block`] when the query fails
/// or the chain height does not fit the reporting range.
pub const HEIGHT_UNAVAILABLE: i64 = -1;

/// Tuning for a watcher instance.
#[derive(Debug, Clone, Copy)]
pub struct WatcherConfig {
    /// Time between two refresh cycles.
    pub refresh_interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(30),
        }
    }
}

/// The transaction watcher.
///
/// Cheap to share behind an [`Arc`]; every operation takes `&self`. The
/// background loop is started at most once per instance and is not
/// restartable after shutdown.
#[derive(Debug)]
pub struct Watcher<S> {
    registry: Arc<SubscriptionRegistry>,
    source: Arc<S>,
    control: Arc<SchedulerControl>,
    config: WatcherConfig,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
    started_at: DateTime<Utc>,
}

impl<S: LedgerSource + 'static> Watcher<S> {
    /// Create a watcher over `source` with an empty registry.
    ///
    /// The source is taken shared: callers that need to keep a handle
    /// to it (tests seeding a stub, status probes) clone the [`Arc`].
    /// The refresh loop is not running yet; call
    /// [`start`](Self::start).
    pub fn new(source: Arc<S>, config: WatcherConfig) -> Self {
        Self {
            registry: Arc::new(SubscriptionRegistry::new()),
            source,
            control: Arc::new(SchedulerControl::new()),
            config,
            refresh_task: Mutex::new(None),
            started_at: Utc::now(),
        }
    }

    /// Current chain height, or [`HEIGHT_UNAVAILABLE`] when the query
    /// fails.
    ///
    /// Deliberately coarse: callers cannot tell a transport failure
    /// from a decode failure here. The distinction is logged instead.
    pub async fn current_block(&self) -> i64 {
        match self.source.current_height().await {
            Ok(height) => i64::try_from(height).unwrap_or_else(|_| {
                warn!(height, "chain height exceeds the reporting range");
                HEIGHT_UNAVAILABLE
            }),
            Err(error) => {
                warn!(error = %error, "height query failed");
                HEIGHT_UNAVAILABLE
            }
        }
    }

    /// Register `address` and perform its first refresh inline.
    ///
    /// Returns `false` if the address was already subscribed. Returns
    /// `true` otherwise, even when the initial refresh fails: the
    /// address stays registered with an empty snapshot and the next
    /// scheduled cycle fills it.
    pub async fn subscribe(&self, address: Address) -> bool {
        if !self.registry.subscribe(address.clone()).await {
            return false;
        }

        match self.source.transactions_for(&address).await {
            Ok(transactions) => {
                self.registry.update_snapshot(&address, transactions).await;
            }
            Err(error) => {
                warn!(
                    address = %address,
                    error = %error,
                    "initial refresh failed, snapshot stays empty until the next cycle"
                );
            }
        }
        true
    }

    /// Latest snapshot for `address`.
    ///
    /// A pure registry read: never triggers a remote query, and an
    /// unsubscribed address reads as empty rather than erroring.
    pub async fn transactions(&self, address: &Address) -> Vec<Transaction> {
        self.registry.snapshot_for(address).await
    }

    /// Spawn the background refresh loop.
    ///
    /// A second call while the loop is running is a logged no-op.
    pub async fn start(&self) {
        let mut task = self.refresh_task.lock().await;
        if task.is_some() {
            warn!("refresh loop already started");
            return;
        }

        let scheduler = RefreshScheduler::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.source),
            self.config.refresh_interval,
            Arc::clone(&self.control),
        );
        *task = Some(tokio::spawn(scheduler.run()));
        info!(
            interval_secs = self.config.refresh_interval.as_secs(),
            "watcher started"
        );
    }

    /// Stop the background loop and wait for it to finish.
    ///
    /// Safe to call more than once; later calls return immediately.
    pub async fn shutdown(&self) {
        self.control.request_stop();

        let handle = self.refresh_task.lock().await.take();
        if let Some(handle) = handle {
            if let Err(error) = handle.await {
                warn!(error = %error, "refresh task ended abnormally");
            }
            info!("watcher stopped");
        }
    }

    /// Whether the background loop is currently running.
    pub async fn is_refreshing(&self) -> bool {
        self.refresh_task
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Number of subscribed addresses.
    pub async fn subscription_count(&self) -> usize {
        self.registry.len().await
    }

    /// Status view over all subscriptions, in address order.
    pub async fn subscriptions(&self) -> Vec<SubscriptionInfo> {
        self.registry.subscription_info().await
    }

    /// Wall-clock time this watcher was created.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Configured time between two refresh cycles.
    pub const fn refresh_interval(&self) -> Duration {
        self.config.refresh_interval
    }
}
