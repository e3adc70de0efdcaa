//! The cancellable periodic refresh loop.
//!
//! One background task cycles between idle and ticking for the lifetime
//! of the process: on each tick it takes a point-in-time enumeration of
//! the registry and refreshes every address through the ledger source.
//! Failure isolation is two-level and deliberate: one address's failed
//! refresh never blocks the rest of the cycle, while each address's own
//! fetch is all-or-nothing ([`LedgerSource::transactions_for`]). There
//! is no retry; the next cycle is the retry.
//!
//! # Shutdown
//!
//! The loop is bound to a [`SchedulerControl`]. A stop request wakes
//! the loop immediately while it idles between ticks and is re-checked
//! before every address inside a running cycle, so an in-progress
//! enumeration is abandoned at the next address boundary rather than
//! run to completion. Nothing in flight is forcibly aborted; stop
//! latency is bounded by one remote call. The timer is owned by the
//! loop and dropped with it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::registry::SubscriptionRegistry;
use crate::source::LedgerSource;

/// Shared stop signal for the refresh loop.
///
/// Once a stop is requested the flag stays set: a control, and any loop
/// bound to it, is not reusable after shutdown.
#[derive(Debug, Default)]
pub struct SchedulerControl {
    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Notification used to wake the loop out of its idle wait.
    stop_notify: Notify,
}

impl SchedulerControl {
    /// Create a new control with no stop requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the loop stop at its next safe point.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Wait until a stop is requested.
    ///
    /// Returns immediately if one already has been.
    pub async fn stopped(&self) {
        while !self.is_stop_requested() {
            self.stop_notify.notified().await;
        }
    }
}

/// Outcome counts for one refresh cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Addresses whose snapshot was replaced.
    pub refreshed: usize,
    /// Addresses skipped because their fetch failed.
    pub failed: usize,
    /// Whether the cycle was cut short by a stop request.
    pub interrupted: bool,
}

/// The periodic refresh task.
///
/// Created by the watcher facade and consumed by [`run`](Self::run) on
/// a spawned task. [`run_cycle`](Self::run_cycle) is public so a single
/// cycle can be driven directly, deterministically, without the timer.
#[derive(Debug)]
pub struct RefreshScheduler<S> {
    registry: Arc<SubscriptionRegistry>,
    source: Arc<S>,
    interval: Duration,
    control: Arc<SchedulerControl>,
}

impl<S: LedgerSource> RefreshScheduler<S> {
    /// Create a scheduler refreshing every `interval`.
    pub const fn new(
        registry: Arc<SubscriptionRegistry>,
        source: Arc<S>,
        interval: Duration,
        control: Arc<SchedulerControl>,
    ) -> Self {
        Self {
            registry,
            source,
            interval,
            control,
        }
    }

    /// Run the loop until the control requests a stop.
    ///
    /// The first tick fires one full interval after this call; the time
    /// before it is covered by the synchronous refresh performed inside
    /// subscribe. Ticks missed while a slow cycle runs are skipped, not
    /// bursted.
    pub async fn run(self) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // An interval's first tick completes immediately; consume it so
        // the loop below only wakes on real interval boundaries.
        ticker.tick().await;

        debug!(interval_secs = self.interval.as_secs(), "refresh loop started");
        loop {
            tokio::select! {
                () = self.control.stopped() => break,
                _ = ticker.tick() => {
                    let summary = self.run_cycle().await;
                    debug!(
                        refreshed = summary.refreshed,
                        failed = summary.failed,
                        "refresh cycle complete"
                    );
                    if summary.interrupted {
                        break;
                    }
                }
            }
        }
        debug!("refresh loop stopped");
    }

    /// Execute one refresh cycle over a point-in-time address list.
    ///
    /// Failed addresses are logged and skipped; their snapshots keep
    /// the previous contents until a later cycle succeeds.
    pub async fn run_cycle(&self) -> CycleSummary {
        let mut summary = CycleSummary::default();

        for address in self.registry.all_addresses().await {
            if self.control.is_stop_requested() {
                summary.interrupted = true;
                break;
            }

            match self.source.transactions_for(&address).await {
                Ok(transactions) => {
                    self.registry.update_snapshot(&address, transactions).await;
                    summary.refreshed = summary.refreshed.saturating_add(1);
                }
                Err(error) => {
                    warn!(
                        address = %address,
                        error = %error,
                        "snapshot refresh failed, skipping address"
                    );
                    summary.failed = summary.failed.saturating_add(1);
                }
            }
        }

        summary
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chainwatch_types::{Address, Transaction, TxHash};

    use super::*;
    use crate::source::{SourceError, StubLedgerSource};

    fn make_tx(hash: &str) -> Transaction {
        Transaction {
            block_hash: String::from("0xbeab"),
            block_number: String::from("0x52a96e"),
            from: Address::new("0x101"),
            gas: String::from("0x5208"),
            gas_price: String::from("0x4a817c800"),
            hash: TxHash::new(hash),
            input: String::from("0x"),
            nonce: String::from("0x15"),
            to: Some(Address::new("0x102")),
            transaction_index: String::from("0x41"),
            value: String::from("0xf3dbb76162000"),
            v: String::from("0x25"),
            r: String::from("0x1b5e"),
            s: String::from("0x4ba6"),
        }
    }

    fn make_scheduler(
        registry: &Arc<SubscriptionRegistry>,
        source: &Arc<StubLedgerSource>,
        control: &Arc<SchedulerControl>,
    ) -> RefreshScheduler<StubLedgerSource> {
        RefreshScheduler::new(
            Arc::clone(registry),
            Arc::clone(source),
            Duration::from_secs(30),
            Arc::clone(control),
        )
    }

    #[tokio::test]
    async fn cycle_refreshes_every_subscribed_address() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let source = Arc::new(StubLedgerSource::new());
        let control = Arc::new(SchedulerControl::new());

        let alpha = Address::new("0xa");
        let beta = Address::new("0xb");
        registry.subscribe(alpha.clone()).await;
        registry.subscribe(beta.clone()).await;
        source
            .set_transactions(alpha.clone(), vec![make_tx("0x0ce1")])
            .await;
        source
            .set_transactions(beta.clone(), vec![make_tx("0xf850")])
            .await;

        let scheduler = make_scheduler(&registry, &source, &control);
        let summary = scheduler.run_cycle().await;

        assert_eq!(summary.refreshed, 2);
        assert_eq!(summary.failed, 0);
        assert!(!summary.interrupted);
        assert_eq!(registry.snapshot_for(&alpha).await.len(), 1);
        assert_eq!(registry.snapshot_for(&beta).await.len(), 1);
    }

    #[tokio::test]
    async fn one_failing_address_does_not_block_the_others() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let source = Arc::new(StubLedgerSource::new());
        let control = Arc::new(SchedulerControl::new());

        let failing = Address::new("0xa");
        let healthy = Address::new("0xb");
        registry.subscribe(failing.clone()).await;
        registry.subscribe(healthy.clone()).await;
        source
            .fail_address(
                failing.clone(),
                SourceError::Transport {
                    message: String::from("connection refused"),
                },
            )
            .await;
        source
            .set_transactions(healthy.clone(), vec![make_tx("0xf850")])
            .await;

        let scheduler = make_scheduler(&registry, &source, &control);
        let summary = scheduler.run_cycle().await;

        assert_eq!(summary.refreshed, 1);
        assert_eq!(summary.failed, 1);
        assert!(registry.snapshot_for(&failing).await.is_empty());
        assert_eq!(registry.snapshot_for(&healthy).await.len(), 1);
    }

    #[tokio::test]
    async fn failed_address_recovers_on_a_later_cycle() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let source = Arc::new(StubLedgerSource::new());
        let control = Arc::new(SchedulerControl::new());

        let address = Address::new("0xa");
        registry.subscribe(address.clone()).await;
        source
            .fail_address(
                address.clone(),
                SourceError::Transport {
                    message: String::from("timeout"),
                },
            )
            .await;

        let scheduler = make_scheduler(&registry, &source, &control);
        assert_eq!(scheduler.run_cycle().await.failed, 1);

        source
            .set_transactions(address.clone(), vec![make_tx("0x0ce1")])
            .await;
        assert_eq!(scheduler.run_cycle().await.refreshed, 1);
        assert_eq!(registry.snapshot_for(&address).await.len(), 1);
    }

    #[tokio::test]
    async fn stop_request_interrupts_the_cycle() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let source = Arc::new(StubLedgerSource::new());
        let control = Arc::new(SchedulerControl::new());

        registry.subscribe(Address::new("0xa")).await;
        control.request_stop();

        let scheduler = make_scheduler(&registry, &source, &control);
        let summary = scheduler.run_cycle().await;

        assert!(summary.interrupted);
        assert_eq!(summary.refreshed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_ticks_one_interval_after_start() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let source = Arc::new(StubLedgerSource::new());
        let control = Arc::new(SchedulerControl::new());

        let address = Address::new("0xa");
        registry.subscribe(address.clone()).await;
        source
            .set_transactions(address.clone(), vec![make_tx("0x0ce1")])
            .await;

        let scheduler = make_scheduler(&registry, &source, &control);
        let handle = tokio::spawn(scheduler.run());

        // Just under one interval: the loop has not ticked yet.
        time::sleep(Duration::from_secs(29)).await;
        assert!(registry.snapshot_for(&address).await.is_empty());

        // Past the interval boundary: the first cycle has run.
        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(registry.snapshot_for(&address).await.len(), 1);

        control.request_stop();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn later_cycles_overwrite_earlier_snapshots() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let source = Arc::new(StubLedgerSource::new());
        let control = Arc::new(SchedulerControl::new());

        let address = Address::new("0xa");
        registry.subscribe(address.clone()).await;
        source
            .set_transactions(address.clone(), vec![make_tx("0x0ce1"), make_tx("0xf850")])
            .await;

        let scheduler = make_scheduler(&registry, &source, &control);
        let handle = tokio::spawn(scheduler.run());

        time::sleep(Duration::from_secs(31)).await;
        assert_eq!(registry.snapshot_for(&address).await.len(), 2);

        source
            .set_transactions(address.clone(), vec![make_tx("0xaaaa")])
            .await;
        time::sleep(Duration::from_secs(30)).await;

        let snapshot = registry.snapshot_for(&address).await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.first().unwrap().hash.as_str(), "0xaaaa");

        control.request_stop();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_while_idle_ends_the_loop_without_another_tick() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let source = Arc::new(StubLedgerSource::new());
        let control = Arc::new(SchedulerControl::new());

        let address = Address::new("0xa");
        registry.subscribe(address.clone()).await;
        source
            .set_transactions(address.clone(), vec![make_tx("0x0ce1")])
            .await;

        let scheduler = make_scheduler(&registry, &source, &control);
        let handle = tokio::spawn(scheduler.run());

        // Stop long before the first tick would fire.
        time::sleep(Duration::from_secs(5)).await;
        control.request_stop();
        handle.await.unwrap();

        // The loop exited without running a cycle.
        assert!(registry.snapshot_for(&address).await.is_empty());
    }
}
