//! Time source and deferred one-shot callbacks.
//!
//! SessionManager never reads the wall clock or spawns timers directly; it is
//! handed a `Clock` and a `Scheduler`. Production code uses `SystemClock` and
//! `TokioScheduler`; `ManualClock` and `ManualScheduler` drive expiry
//! deterministically.

pub mod manual;

pub use manual::{ManualClock, ManualScheduler};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A one-shot callback, run at most once.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs one-shot callbacks after a delay.
pub trait Scheduler: Send + Sync {
    /// Run `task` once `delay` has elapsed. Zero or negative delays run as
    /// soon as the scheduler permits.
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle;
}

/// Cancels a scheduled task. Dropping the handle does not cancel it.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Prevent the task from running. No-op if it already ran.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

/// Spawns a tokio task per timer. Must be used from within a tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let sleep_for = delay.to_std().unwrap_or(std::time::Duration::ZERO);
        debug!(delay_ms = delay.num_milliseconds(), "Scheduling timer");

        let join = tokio::spawn(async move {
            tokio::time::sleep(sleep_for).await;
            task();
        });

        let abort = join.abort_handle();
        TimerHandle::new(move || abort.abort())
    }
}

// ============================================================================
// Tests
// ============================================================================
