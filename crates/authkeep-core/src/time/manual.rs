use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::{DateTime, Duration, Utc};

use super::{Clock, Scheduler, Task, TimerHandle};

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = lock(&self.now);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *lock(&self.now)
    }
}

struct PendingTimer {
    id: u64,
    due: DateTime<Utc>,
    task: Task,
}

#[derive(Default)]
struct Queue {
    next_id: u64,
    timers: Vec<PendingTimer>,
}

/// Scheduler whose timers fire only from `advance`/`run_due`, on the caller's
/// thread, in due order.
pub struct ManualScheduler {
    clock: Arc<ManualClock>,
    queue: Arc<Mutex<Queue>>,
}

impl ManualScheduler {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            clock,
            queue: Arc::new(Mutex::new(Queue::default())),
        }
    }

    /// Number of timers that have neither fired nor been cancelled
    pub fn pending(&self) -> usize {
        lock(&self.queue).timers.len()
    }

    /// Due instant of the earliest pending timer
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        lock(&self.queue).timers.iter().map(|t| t.due).min()
    }

    /// Move the shared clock forward and fire every timer that came due.
    pub fn advance(&self, by: Duration) -> usize {
        self.clock.advance(by);
        self.run_due()
    }

    /// Fire every timer due at the current clock reading. Returns how many ran.
    pub fn run_due(&self) -> usize {
        let mut fired = 0;
        // The queue lock is released before each task runs so that tasks can
        // schedule or cancel timers themselves.
        while let Some(timer) = self.pop_due(self.clock.now()) {
            (timer.task)();
            fired += 1;
        }
        fired
    }

    fn pop_due(&self, now: DateTime<Utc>) -> Option<PendingTimer> {
        let mut queue = lock(&self.queue);
        let index = queue
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by_key(|(_, t)| (t.due, t.id))
            .map(|(i, _)| i)?;
        Some(queue.timers.remove(index))
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let due = self.clock.now() + delay.max(Duration::zero());

        let id = {
            let mut queue = lock(&self.queue);
            let id = queue.next_id;
            queue.next_id += 1;
            queue.timers.push(PendingTimer { id, due, task });
            id
        };

        let queue: Weak<Mutex<Queue>> = Arc::downgrade(&self.queue);
        TimerHandle::new(move || {
            if let Some(queue) = queue.upgrade() {
                lock(&queue).timers.retain(|t| t.id != id);
            }
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
