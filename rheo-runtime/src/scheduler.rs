// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use core::fmt::Debug;
use core::time::Duration;
use rheo_core::CancellationToken;
use std::sync::Arc;

/// One-shot work item.
pub type Action = Box<dyn FnOnce() + Send + 'static>;

/// Work item run on every tick of a periodic schedule.
pub type PeriodicAction = Arc<dyn Fn() + Send + Sync + 'static>;

/// Shared, type-erased scheduler as accepted by time-based publishers.
pub type SchedulerRef = Arc<dyn Scheduler>;

/// Decouples emission timing from the caller.
///
/// Time is a [`Duration`] measured from the scheduler's own origin, so virtual and real clocks
/// are interchangeable. Actions scheduled for the same instant run in scheduling order.
pub trait Scheduler: Send + Sync + Debug + 'static {
    /// Current time on this scheduler's clock.
    fn now(&self) -> Duration;

    /// Runs `action` once, `delay` after now.
    fn schedule(&self, delay: Duration, action: Action) -> ScheduledTask;

    /// Runs `action` at `initial_delay` after now, then every `period`.
    ///
    /// Ticks are anchored to the first fire time, not to when the previous action finished.
    /// A zero period is treated as one nanosecond.
    fn schedule_periodic(
        &self,
        initial_delay: Duration,
        period: Duration,
        action: PeriodicAction,
    ) -> ScheduledTask;
}

/// Handle to scheduled work.
///
/// Dropping the handle cancels the work unless it was [`detach`](Self::detach)ed. Cancellation
/// is cooperative: an action already running is not interrupted.
#[derive(Debug)]
#[must_use = "dropping a ScheduledTask cancels it"]
pub struct ScheduledTask {
    token: CancellationToken,
    detached: bool,
}

impl ScheduledTask {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            detached: false,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Lets the work run to completion regardless of this handle.
    pub fn detach(mut self) {
        self.detached = true;
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        if !self.detached {
            self.token.cancel();
        }
    }
}

pub(crate) fn effective_period(period: Duration) -> Duration {
    period.max(Duration::from_nanos(1))
}
