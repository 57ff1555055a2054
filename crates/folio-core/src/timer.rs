//! Single-shot timer that the owner advances by frame deltas
//!
//! The slot holds at most one pending timer. Arming replaces whatever was
//! pending, so a stale deadline from a previous state can never fire.

use std::time::Duration;

#[derive(Debug, Clone)]
struct Pending<T> {
    remaining: Duration,
    payload: T,
}

#[derive(Debug, Clone)]
pub struct TimerSlot<T> {
    pending: Option<Pending<T>>,
}

impl<T> Default for TimerSlot<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> TimerSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the slot, cancelling any pending timer
    pub fn arm(&mut self, delay: Duration, payload: T) {
        self.pending = Some(Pending {
            remaining: delay,
            payload,
        });
    }

    /// Drop the pending timer, if any. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Time left before the pending timer fires
    pub fn remaining(&self) -> Option<Duration> {
        self.pending.as_ref().map(|p| p.remaining)
    }

    /// Advance by `dt`. Yields the payload exactly once, on the call that
    /// crosses the deadline; the slot is empty afterwards.
    pub fn advance(&mut self, dt: Duration) -> Option<T> {
        let pending = self.pending.as_mut()?;
        if dt < pending.remaining {
            pending.remaining -= dt;
            return None;
        }
        self.pending.take().map(|p| p.payload)
    }
}
