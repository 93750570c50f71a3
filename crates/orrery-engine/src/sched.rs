//! Single-outstanding-deadline tick scheduler
//!
//! One slot holds the next wake time; there is never more than one
//! outstanding tick. `schedule_at` fills (or replaces) the slot, `cancel`
//! empties it, and the worker blocks in [`TickScheduler::wait`] until the
//! deadline arrives, the bounded idle wait elapses, or shutdown. The slot
//! is consumed before `wait` reports it due, so ticks cannot pile up.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// What woke the worker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wake {
    /// The scheduled deadline arrived; the slot is now empty
    Due,
    /// Nothing is scheduled and the bounded idle wait elapsed
    Idle,
    /// The scheduler was shut down
    Shutdown,
}

#[derive(Debug)]
struct Slot {
    deadline: Option<Instant>,
    alive: bool,
}

/// A scheduler holding at most one outstanding deadline
#[derive(Debug)]
pub struct TickScheduler {
    slot: Mutex<Slot>,
    wakeup: Condvar,
}

impl TickScheduler {
    pub fn new() -> Self {
        TickScheduler {
            slot: Mutex::new(Slot {
                deadline: None,
                alive: true,
            }),
            wakeup: Condvar::new(),
        }
    }

    /// Fill the slot, replacing any previous deadline
    pub fn schedule_at(&self, deadline: Instant) {
        let mut slot = self.slot.lock();
        slot.deadline = Some(deadline);
        self.wakeup.notify_all();
    }

    /// Empty the slot, cancelling the outstanding tick if any
    pub fn cancel(&self) {
        let mut slot = self.slot.lock();
        slot.deadline = None;
        self.wakeup.notify_all();
    }

    /// Whether a deadline is outstanding
    pub fn is_scheduled(&self) -> bool {
        self.slot.lock().deadline.is_some()
    }

    /// Mark the scheduler dead and wake the worker
    pub fn shutdown(&self) {
        let mut slot = self.slot.lock();
        slot.alive = false;
        slot.deadline = None;
        self.wakeup.notify_all();
    }

    /// Block until the outstanding deadline arrives, the bounded `idle`
    /// wait elapses with nothing scheduled, or shutdown. Cancellation and
    /// replacement wake the waiter, which re-reads the slot.
    pub fn wait(&self, idle: Duration) -> Wake {
        let mut slot = self.slot.lock();
        loop {
            if !slot.alive {
                return Wake::Shutdown;
            }
            match slot.deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        slot.deadline = None;
                        return Wake::Due;
                    }
                    self.wakeup.wait_until(&mut slot, deadline);
                }
                None => {
                    self.wakeup.wait_for(&mut slot, idle);
                    if !slot.alive {
                        return Wake::Shutdown;
                    }
                    if slot.deadline.is_none() {
                        return Wake::Idle;
                    }
                    // something was scheduled while idling; loop to wait on it
                }
            }
        }
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}
