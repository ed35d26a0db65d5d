//! The synchronization engine: three cooperating long-running loops sharing
//! one store.
//!
//! - [`discovery`] mirrors newly published mapsets, newest first, stopping at
//!   the first already-known item.
//! - [`admission`] moves stale users into the durable work queue.
//! - [`worker`] drains the queue one user at a time, choosing between an
//!   incremental recent-scores pass ([`recent`]) and a resumable full
//!   historical rescan ([`rescan`]).
//!
//! Every loop wraps its cycle in a failure boundary: errors are logged,
//! counted as "no progress this cycle", and the next tick is always re-armed.
//! Nothing here is fatal to the process.

pub mod admission;
mod convert;
pub mod discovery;
mod lifecycle;
pub mod recent;
pub mod rescan;
mod retry;
pub mod worker;

pub use lifecycle::{Lifecycle, LifecycleState};
pub use retry::retry_on_throttle;
pub use worker::WorkerTick;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sea_orm::DatabaseConnection;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::api::{ApiError, ApiRateLimiter, OsuApi};
use crate::store::StoreError;

// ─── Engine pacing ───────────────────────────────────────────────────────────

/// How long discovery sleeps between catalog sweeps.
pub const DISCOVERY_INTERVAL: Duration = Duration::from_secs(60 * 60);
/// How long admission sleeps between staleness scans.
pub const ADMISSION_INTERVAL: Duration = Duration::from_secs(60);
/// Worker idle poll when the queue is empty.
pub const WORKER_IDLE_DELAY: Duration = Duration::from_secs(1);
/// Worker delay between claim cycles, regardless of outcome.
pub const WORKER_CYCLE_DELAY: Duration = Duration::from_secs(2);
/// Users older than this are admitted to the queue.
pub const STALE_THRESHOLD_MS: i64 = 16 * 60 * 60 * 1000;
/// Users synced within this window get the incremental strategy.
pub const RECENT_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;
/// Page size for recent-score fetches.
pub const SCORE_PAGE_SIZE: usize = 100;
/// Mapsets per batch in the full rescan.
pub const RESCAN_BATCH_SIZE: u64 = 50;
/// Fixed delay before retrying a throttled batch request.
pub const THROTTLE_RETRY_DELAY: Duration = Duration::from_secs(5);
/// Self-imposed pacing between rescan batches.
pub const RESCAN_PACING_DELAY: Duration = Duration::from_millis(1500);

/// Current time in epoch milliseconds, the unit of all persisted timestamps.
#[must_use]
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Errors produced by one engine cycle. Always caught at the loop boundary.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Shared dependencies of the three loops.
pub struct SyncContext {
    pub db: DatabaseConnection,
    pub api: Arc<dyn OsuApi>,
    pub limiter: ApiRateLimiter,
    /// Initial-backfill mode: discovery skips known mapsets instead of
    /// stopping at them, sweeping the entire remote catalog. Off by default.
    pub force_full_discovery: bool,
}

impl SyncContext {
    pub fn new(db: DatabaseConnection, api: Arc<dyn OsuApi>, limiter: ApiRateLimiter) -> Self {
        Self {
            db,
            api,
            limiter,
            force_full_discovery: false,
        }
    }

    #[must_use]
    pub fn with_force_full_discovery(mut self, force: bool) -> Self {
        self.force_full_discovery = force;
        self
    }
}

/// Start the three loops. They run until the lifecycle leaves `Running`;
/// await the handles to know they have wound down.
pub fn spawn_engine(ctx: Arc<SyncContext>, lifecycle: &Lifecycle) -> Vec<JoinHandle<()>> {
    vec![
        tokio::spawn(discovery::run(Arc::clone(&ctx), lifecycle.clone())),
        tokio::spawn(admission::run(Arc::clone(&ctx), lifecycle.clone())),
        tokio::spawn(worker::run(ctx, lifecycle.clone())),
    ]
}
