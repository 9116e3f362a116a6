//! Windowed statistics engine
//!
//! The façade combining the aggregate, the expiry index and the extremum
//! candidate index behind a single reader-writer lock, plus the eviction
//! worker that expires transactions as their deadlines pass.
//!
//! Lock discipline: one `parking_lot::RwLock` guards the whole triple as a
//! single consistency domain. `snapshot` takes the shared lock; `accept` and
//! the eviction worker take the exclusive lock. Critical sections are short
//! and never held across an await point.

use crate::aggregate::Aggregate;
use crate::expiry::ExpiryIndex;
use crate::extrema::ExtremaIndex;
use crate::{AggregateView, Transaction};
use parking_lot::RwLock;
use services_common::{Amount, RejectReason, Ts};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// State of the eviction timer.
///
/// `Armed` carries the deadline the worker is sleeping toward. A writer that
/// registers an earlier deadline wakes the worker; a writer that observes
/// `Firing` does nothing, because the in-flight firing cycle re-derives the
/// earliest deadline from the expiry index once it completes, which subsumes
/// the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerPhase {
    /// No pending deadlines; the worker is parked until the next accept
    Idle,
    /// The worker is sleeping toward this deadline
    Armed(Ts),
    /// A firing cycle is in flight
    Firing,
}

/// The triple guarded as one consistency domain, plus the timer phase.
#[derive(Debug)]
struct WindowState {
    aggregate: Aggregate,
    expiry: ExpiryIndex,
    extrema: ExtremaIndex,
    timer: TimerPhase,
}

impl WindowState {
    const fn new() -> Self {
        Self {
            aggregate: Aggregate::new(),
            expiry: ExpiryIndex::new(),
            extrema: ExtremaIndex::new(),
            timer: TimerPhase::Idle,
        }
    }

    /// Evict every bucket whose deadline is at or before `now`.
    ///
    /// An explicit loop, so a scheduling underrun with a backlog of due
    /// buckets drains without recursion or non-positive sleeps. Extrema are
    /// recomputed once per batch from the candidate index's outer keys.
    fn evict_due(&mut self, now: Ts) {
        let mut evicted = 0usize;
        while let Some((deadline, bucket)) = self.expiry.pop_due(now) {
            debug!(
                deadline = deadline.as_millis(),
                transactions = bucket.len(),
                "evicting expired bucket"
            );
            for tx in &bucket {
                self.aggregate.remove(tx.amount);
                self.extrema.remove(tx.amount, tx.timestamp);
            }
            evicted += bucket.len();
        }
        if evicted == 0 {
            return;
        }

        if self.extrema.is_empty() {
            debug_assert_eq!(
                self.aggregate.count(),
                0,
                "candidate index drained while transactions remain live"
            );
            // Defensive re-synchronization; coincides with count reaching 0
            self.aggregate.reset();
        } else {
            debug_assert!(
                self.aggregate.count() > 0,
                "candidates retained after the last transaction expired"
            );
            self.aggregate
                .set_extrema(self.extrema.min(), self.extrema.max());
        }
    }
}

/// Anchors wall-clock epoch milliseconds to the tokio timer, so eviction
/// deadlines are sleeps on the tokio clock and tests can drive expiry with
/// paused time.
#[derive(Debug, Clone, Copy)]
struct Clock {
    base_ms: u64,
    base: Instant,
}

impl Clock {
    fn new() -> Self {
        Self {
            base_ms: Ts::now().as_millis(),
            base: Instant::now(),
        }
    }

    fn now(&self) -> Ts {
        // SAFETY: u128 to u64 - elapsed millis since construction fit in u64
        #[allow(clippy::cast_possible_truncation)]
        let elapsed = self.base.elapsed().as_millis() as u64;
        Ts::from_millis(self.base_ms + elapsed)
    }

    fn instant_at(&self, deadline: Ts) -> Instant {
        self.base + Duration::from_millis(deadline.as_millis().saturating_sub(self.base_ms))
    }
}

struct EngineShared {
    window_ms: u64,
    state: RwLock<WindowState>,
    wakeup: Notify,
    clock: Clock,
}

/// Windowed statistics engine.
///
/// Constructed once and shared by handle; owns the aggregate and both
/// indices exclusively. Construction spawns the eviction worker, so the
/// engine must be created inside a tokio runtime. Dropping the engine aborts
/// the worker.
pub struct StatsEngine {
    shared: Arc<EngineShared>,
    worker: JoinHandle<()>,
}

impl StatsEngine {
    /// Create an engine with the given statistics window
    #[must_use]
    pub fn new(window_ms: u64) -> Self {
        let shared = Arc::new(EngineShared {
            window_ms,
            state: RwLock::new(WindowState::new()),
            wakeup: Notify::new(),
            clock: Clock::new(),
        });
        let worker = tokio::spawn(run_eviction_worker(Arc::clone(&shared)));
        Self { shared, worker }
    }

    /// Current time on the engine clock
    #[must_use]
    pub fn now(&self) -> Ts {
        self.shared.clock.now()
    }

    /// Statistics window in milliseconds
    #[must_use]
    pub fn window_ms(&self) -> u64 {
        self.shared.window_ms
    }

    /// Validate and register a transaction.
    ///
    /// Rejections happen before any mutation; on success every structure has
    /// been consistently updated and the eviction deadline rearmed if it
    /// moved earlier. Concurrent calls are linearized by the write lock.
    pub fn accept(&self, amount: f64, timestamp: Ts) -> Result<(), RejectReason> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(RejectReason::InvalidAmount);
        }
        let now = self.shared.clock.now();
        if timestamp.saturating_add(self.shared.window_ms) < now {
            return Err(RejectReason::TooOld);
        }

        let tx = Transaction::new(Amount::from_f64(amount), timestamp);
        let expiry = tx.expiry(self.shared.window_ms);

        let wake = {
            let mut state = self.shared.state.write();
            state.aggregate.add(tx.amount);
            state.expiry.insert(expiry, tx);
            state.extrema.insert(tx.amount, tx.timestamp);
            match state.timer {
                TimerPhase::Idle => true,
                TimerPhase::Armed(deadline) => expiry < deadline,
                TimerPhase::Firing => false,
            }
        };
        if wake {
            self.shared.wakeup.notify_one();
        }

        debug!(
            amount = %tx.amount,
            timestamp = timestamp.as_millis(),
            expiry = expiry.as_millis(),
            "accepted transaction"
        );
        Ok(())
    }

    /// O(1), side-effect-free copy of the current aggregate
    #[must_use]
    pub fn snapshot(&self) -> AggregateView {
        self.shared.state.read().aggregate.read()
    }
}

impl Drop for StatsEngine {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

impl std::fmt::Debug for StatsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsEngine")
            .field("window_ms", &self.shared.window_ms)
            .finish_non_exhaustive()
    }
}

/// Eviction worker: a single long-lived task armed for the earliest expiry
/// deadline.
///
/// The worker always re-derives the earliest deadline from the expiry index
/// itself rather than a cached copy, so no deadline can be dropped. Writers
/// wake it through the [`Notify`] when a new deadline lands earlier than the
/// armed one.
async fn run_eviction_worker(shared: Arc<EngineShared>) {
    loop {
        let deadline = {
            let mut state = shared.state.write();
            match state.expiry.first_deadline() {
                Some(deadline) => {
                    state.timer = TimerPhase::Armed(deadline);
                    Some(deadline)
                }
                None => {
                    state.timer = TimerPhase::Idle;
                    None
                }
            }
        };

        let Some(deadline) = deadline else {
            shared.wakeup.notified().await;
            continue;
        };

        if deadline > shared.clock.now() {
            tokio::select! {
                () = tokio::time::sleep_until(shared.clock.instant_at(deadline)) => {}
                () = shared.wakeup.notified() => {
                    // An earlier deadline was registered; re-derive and rearm
                    continue;
                }
            }
        }

        let mut state = shared.state.write();
        state.timer = TimerPhase::Firing;
        let now = shared.clock.now();
        state.evict_due(now);
        // Loop rearms from the index (or parks on Idle)
    }
}
