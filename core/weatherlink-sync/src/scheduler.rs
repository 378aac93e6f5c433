//! Poll scheduler driven by link connection events.
//!
//! ```text
//!   Idle ──connect──▶ Polling ──disconnect──▶ Stopped
//!                      ▲  │ timer fired:            │
//!                      │  │ sync, re-arm            │
//!                      └──┴─────────connect─────────┘
//! ```
//!
//! Polling is kept alive only by each fired timer re-arming the next one.
//! Every connect starts a new generation; a timer armed under an older
//! generation does nothing when it fires and does not re-arm, which is how
//! a disconnect stops the chain.

use crate::error::SyncResult;
use crate::synchronizer::{FieldSynchronizer, SyncReport};
use crate::timer::TaskScheduler;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Connection-driven polling state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollState {
    /// Never connected.
    Idle,
    /// Connected; a poll is armed or running.
    Polling,
    /// Disconnected; armed polls are void.
    Stopped,
}

/// Snapshot of the scheduler for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerStatus {
    pub state: PollState,
    /// Completed passes, successful or not.
    pub passes: u64,
    /// Passes that failed to fetch.
    pub failures: u64,
    /// Ticks skipped because a pass was still running.
    pub overlaps: u64,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub last_report: Option<SyncReport>,
}

#[derive(Debug)]
struct Control {
    state: PollState,
    generation: u64,
}

struct Inner {
    synchronizer: FieldSynchronizer,
    timer: Arc<dyn TaskScheduler>,
    initial_delay: Duration,
    poll_interval: Duration,
    control: Mutex<Control>,
    in_flight: AtomicBool,
    status: Mutex<SchedulerStatus>,
}

impl Inner {
    fn control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn status(&self) -> MutexGuard<'_, SchedulerStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        let control = self.control();
        control.state == PollState::Polling && control.generation == generation
    }
}

/// Schedules synchronization passes while the link is connected.
#[derive(Clone)]
pub struct PollScheduler {
    inner: Arc<Inner>,
}

impl PollScheduler {
    pub fn new(
        synchronizer: FieldSynchronizer,
        timer: Arc<dyn TaskScheduler>,
        initial_delay: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                synchronizer,
                timer,
                initial_delay,
                poll_interval,
                control: Mutex::new(Control {
                    state: PollState::Idle,
                    generation: 0,
                }),
                in_flight: AtomicBool::new(false),
                status: Mutex::new(SchedulerStatus {
                    state: PollState::Idle,
                    passes: 0,
                    failures: 0,
                    overlaps: 0,
                    last_success_at: None,
                    last_error: None,
                    last_report: None,
                }),
            }),
        }
    }

    pub fn state(&self) -> PollState {
        self.inner.control().state
    }

    pub fn status(&self) -> SchedulerStatus {
        let mut status = self.inner.status().clone();
        status.state = self.state();
        status
    }

    /// Starts polling. Ignored while already polling.
    pub fn on_connected(&self) {
        let generation = {
            let mut control = self.inner.control();
            if control.state == PollState::Polling {
                debug!("Already polling; connect ignored");
                return;
            }
            control.state = PollState::Polling;
            control.generation += 1;
            control.generation
        };
        info!(
            "Polling started; first pass in {:?}, then every {:?}",
            self.inner.initial_delay, self.inner.poll_interval
        );
        self.arm(generation, self.inner.initial_delay, true);
    }

    /// Stops polling. An armed timer becomes a no-op when it fires.
    pub fn on_disconnected(&self) {
        let mut control = self.inner.control();
        if control.state == PollState::Polling {
            info!("Polling stopped");
        }
        control.state = PollState::Stopped;
    }

    fn arm(&self, generation: u64, delay: Duration, first: bool) {
        let this = self.clone();
        self.inner.timer.schedule_after(
            delay,
            Box::pin(async move {
                this.fire(generation, first).await;
            }),
        );
    }

    /// `first` marks the opening tick of a connection. If it lands on a pass
    /// still running from an earlier connection, it is retried after the
    /// initial delay instead of a full interval.
    async fn fire(&self, generation: u64, first: bool) {
        if !self.inner.is_current(generation) {
            debug!("Stale poll timer fired (generation {generation}); ignoring");
            return;
        }

        let overlapped = self.inner.in_flight.swap(true, Ordering::SeqCst);
        if overlapped {
            warn!("Previous synchronization pass still running; skipping this tick");
            self.inner.status().overlaps += 1;
        } else {
            let result = self.inner.synchronizer.sync_once().await;
            self.inner.in_flight.store(false, Ordering::SeqCst);
            self.record(result);
        }

        if !self.inner.is_current(generation) {
            debug!("Disconnected during pass; not re-arming");
        } else if overlapped && first {
            self.arm(generation, self.inner.initial_delay, true);
        } else {
            self.arm(generation, self.inner.poll_interval, false);
        }
    }

    fn record(&self, result: SyncResult<SyncReport>) {
        let mut status = self.inner.status();
        status.passes += 1;
        match result {
            Ok(report) => {
                status.last_success_at = Some(Utc::now());
                status.last_error = None;
                status.last_report = Some(report);
            }
            Err(e) => {
                warn!("Synchronization pass failed, keeping last values: {e}");
                status.failures += 1;
                status.last_error = Some(e.to_string());
            }
        }
    }
}

impl std::fmt::Debug for PollScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollScheduler")
            .field("state", &self.state())
            .field("initial_delay", &self.inner.initial_delay)
            .field("poll_interval", &self.inner.poll_interval)
            .finish()
    }
}
