// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Manually advanced clock for deterministic tests of time-based publishers.
//!
//! Nothing ever sleeps: [`VirtualScheduler::advance`] runs every due action on the calling
//! thread, in fire-time order, and moves the clock forward.
//!
//! ```
//! use rheo_runtime::impls::virtual_time::VirtualScheduler;
//! use rheo_runtime::scheduler::Scheduler;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let scheduler = VirtualScheduler::new();
//! let fired = Arc::new(AtomicUsize::new(0));
//! let counter = fired.clone();
//!
//! scheduler
//!     .schedule(Duration::from_secs(5), Box::new(move || {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!     }))
//!     .detach();
//!
//! scheduler.advance(Duration::from_secs(4));
//! assert_eq!(fired.load(Ordering::SeqCst), 0);
//!
//! scheduler.advance(Duration::from_secs(1));
//! assert_eq!(fired.load(Ordering::SeqCst), 1);
//! assert_eq!(scheduler.now(), Duration::from_secs(5));
//! ```

use crate::scheduler::{effective_period, Action, PeriodicAction, ScheduledTask, Scheduler};
use core::cmp::Ordering;
use core::fmt;
use core::time::Duration;
use parking_lot::Mutex;
use rheo_core::CancellationToken;
use std::collections::BinaryHeap;

enum Work {
    Once(Action),
    Periodic {
        period: Duration,
        action: PeriodicAction,
    },
}

struct Entry {
    at: Duration,
    seq: u64,
    token: CancellationToken,
    work: Work,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Reversed: BinaryHeap is a max-heap and the earliest (at, seq) must surface first.
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.at, other.seq).cmp(&(self.at, self.seq))
    }
}

struct ClockState {
    now: Duration,
    next_seq: u64,
    queue: BinaryHeap<Entry>,
}

impl ClockState {
    fn push(&mut self, at: Duration, token: CancellationToken, work: Work) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Entry {
            at,
            seq,
            token,
            work,
        });
    }

    fn pop_due(&mut self, target: Duration) -> Option<Entry> {
        if self.queue.peek().is_some_and(|entry| entry.at <= target) {
            let entry = self.queue.pop()?;
            self.now = self.now.max(entry.at);
            Some(entry)
        } else {
            None
        }
    }
}

/// Virtual clock plus a priority queue of `(fire-time, action)` pairs.
pub struct VirtualScheduler {
    state: Mutex<ClockState>,
}

impl VirtualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ClockState {
                now: Duration::ZERO,
                next_seq: 0,
                queue: BinaryHeap::new(),
            }),
        }
    }

    /// Moves the clock forward by `duration`, running every action that falls due.
    ///
    /// Actions scheduled by running actions are honored within the same call when their fire
    /// time is inside the window. A live periodic task fires once per period of the window, so
    /// advancing by an enormous duration with one pending takes proportionally long. A periodic
    /// task whose next fire time would overflow the clock is retired.
    pub fn advance(&self, duration: Duration) {
        let target = self.now().saturating_add(duration);
        self.advance_to(target);
    }

    /// Moves the clock to `target`. Targets in the past only run actions already due.
    pub fn advance_to(&self, target: Duration) {
        loop {
            let entry = self.state.lock().pop_due(target);
            let Some(entry) = entry else {
                break;
            };
            if entry.token.is_cancelled() {
                continue;
            }

            match entry.work {
                Work::Once(action) => action(),
                Work::Periodic { period, action } => {
                    action();
                    let next = entry.at.checked_add(period);
                    if let Some(next) = next.filter(|_| !entry.token.is_cancelled()) {
                        self.state.lock().push(
                            next,
                            entry.token,
                            Work::Periodic { period, action },
                        );
                    }
                }
            }
        }

        let mut state = self.state.lock();
        state.now = state.now.max(target);
    }

    /// Runs actions due at the current instant without moving the clock.
    pub fn run_due(&self) {
        self.advance(Duration::ZERO);
    }

    /// Number of scheduled actions that have not been cancelled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state
            .lock()
            .queue
            .iter()
            .filter(|entry| !entry.token.is_cancelled())
            .count()
    }

    /// Fire time of the earliest live action, if any.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.state
            .lock()
            .queue
            .iter()
            .filter(|entry| !entry.token.is_cancelled())
            .map(|entry| entry.at)
            .min()
    }
}

impl Default for VirtualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for VirtualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("VirtualScheduler")
            .field("now", &state.now)
            .field("queued", &state.queue.len())
            .finish()
    }
}

impl Scheduler for VirtualScheduler {
    fn now(&self) -> Duration {
        self.state.lock().now
    }

    fn schedule(&self, delay: Duration, action: Action) -> ScheduledTask {
        let token = CancellationToken::new();
        let mut state = self.state.lock();
        let at = state.now.saturating_add(delay);
        state.push(at, token.clone(), Work::Once(action));
        ScheduledTask::new(token)
    }

    fn schedule_periodic(
        &self,
        initial_delay: Duration,
        period: Duration,
        action: PeriodicAction,
    ) -> ScheduledTask {
        let token = CancellationToken::new();
        let mut state = self.state.lock();
        let at = state.now.saturating_add(initial_delay);
        state.push(
            at,
            token.clone(),
            Work::Periodic {
                period: effective_period(period),
                action,
            },
        );
        ScheduledTask::new(token)
    }
}
