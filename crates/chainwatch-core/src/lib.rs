//! Subscription state, periodic refresh, and the watcher facade.
//!
//! This crate owns everything with real concurrency and failure-handling
//! concerns: the shared subscription store, the background loop that
//! refreshes it, and the facade callers interact with. It never talks to
//! a network itself; all remote reads go through the [`LedgerSource`]
//! trait, implemented elsewhere.
//!
//! # Modules
//!
//! - [`source`] -- [`LedgerSource`] trait, [`SourceError`] taxonomy, and
//!   [`StubLedgerSource`].
//! - [`registry`] -- Concurrency-safe map from address to its latest
//!   transaction snapshot.
//! - [`scheduler`] -- The cancellable periodic refresh loop.
//! - [`watcher`] -- The [`Watcher`] facade composing the other three.
//!
//! [`LedgerSource`]: source::LedgerSource
//! [`SourceError`]: source::SourceError
//! [`StubLedgerSource`]: source::StubLedgerSource
//! [`Watcher`]: watcher::Watcher

pub mod registry;
pub mod scheduler;
pub mod source;
pub mod watcher;

pub use registry::{SubscriptionInfo, SubscriptionRegistry};
pub use scheduler::{CycleSummary, RefreshScheduler, SchedulerControl};
pub use source::{LedgerSource, SourceError, StubLedgerSource};
pub use watcher::{HEIGHT_UNAVAILABLE, Watcher, WatcherConfig};
