//! Scheduling abstraction for the debounce delay.
//!
//! The controller never talks to an event loop directly; it schedules
//! callbacks through a [`Timer`] so embedders can plug in whatever loop they
//! run, and tests can fire deadlines deterministically.

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Handle to one scheduled callback, usable to cancel it cooperatively.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl TimerHandle {
    fn new(id: u64) -> Self {
        Self {
            id,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Identifier of the scheduled callback, unique per timer.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns `true` once the callback has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(AtomicOrdering::Acquire)
    }

    fn mark_cancelled(&self) {
        self.cancelled.store(true, AtomicOrdering::Release);
    }
}

/// Schedules one-shot callbacks after a delay.
pub trait Timer: Send {
    /// Schedule `callback` to run once after `delay`.
    fn schedule(&mut self, delay: Duration, callback: Box<dyn FnOnce() + Send>) -> TimerHandle;

    /// Cancel a previously scheduled callback. Cancelling an already-fired
    /// or already-cancelled handle is a no-op.
    fn cancel(&mut self, handle: &TimerHandle);
}

/// Production timer backed by a sleeping thread per scheduled callback.
///
/// Cancellation is cooperative: a cancelled sleeper wakes up, sees the flag
/// and exits without invoking its callback.
#[derive(Debug, Default)]
pub struct ThreadTimer {
    next_id: u64,
}

impl ThreadTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Timer for ThreadTimer {
    fn schedule(&mut self, delay: Duration, callback: Box<dyn FnOnce() + Send>) -> TimerHandle {
        self.next_id = self.next_id.wrapping_add(1);
        let handle = TimerHandle::new(self.next_id);
        let cancelled = Arc::clone(&handle.cancelled);
        thread::spawn(move || {
            thread::sleep(delay);
            if !cancelled.load(AtomicOrdering::Acquire) {
                callback();
            }
        });
        handle
    }

    fn cancel(&mut self, handle: &TimerHandle) {
        handle.mark_cancelled();
    }
}

struct ManualTimerInner {
    next_id: u64,
    pending: Vec<(TimerHandle, Box<dyn FnOnce() + Send>)>,
}

/// Test timer whose deadlines fire only when told to.
///
/// Clones share the pending queue, so a test can hand one clone to the
/// controller and drive the other.
#[derive(Clone)]
pub struct ManualTimer {
    inner: Arc<Mutex<ManualTimerInner>>,
}

impl ManualTimer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualTimerInner {
                next_id: 0,
                pending: Vec::new(),
            })),
        }
    }

    /// Number of scheduled callbacks that have not fired or been cancelled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner
            .lock()
            .expect("manual timer lock")
            .pending
            .iter()
            .filter(|(handle, _)| !handle.is_cancelled())
            .count()
    }

    /// Fire every pending, uncancelled callback in scheduling order.
    pub fn fire_all(&self) {
        let pending = {
            let mut inner = self.inner.lock().expect("manual timer lock");
            std::mem::take(&mut inner.pending)
        };
        for (handle, callback) in pending {
            if !handle.is_cancelled() {
                callback();
            }
        }
    }
}

impl Default for ManualTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for ManualTimer {
    fn schedule(&mut self, _delay: Duration, callback: Box<dyn FnOnce() + Send>) -> TimerHandle {
        let mut inner = self.inner.lock().expect("manual timer lock");
        inner.next_id = inner.next_id.wrapping_add(1);
        let handle = TimerHandle::new(inner.next_id);
        inner.pending.push((handle.clone(), callback));
        handle
    }

    fn cancel(&mut self, handle: &TimerHandle) {
        handle.mark_cancelled();
    }
}
