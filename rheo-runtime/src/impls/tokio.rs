// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#[cfg(feature = "runtime-tokio")]
use crate::scheduler::{effective_period, Action, PeriodicAction, ScheduledTask, Scheduler};
#[cfg(feature = "runtime-tokio")]
use rheo_core::{CancellationToken, Result, RheoError};
#[cfg(feature = "runtime-tokio")]
use std::time::Duration;
#[cfg(feature = "runtime-tokio")]
use tokio::runtime::Handle;
#[cfg(feature = "runtime-tokio")]
use tokio::time::{Instant, MissedTickBehavior};

/// Real-time scheduler spawning its work on a tokio runtime.
///
/// Uses `tokio::time`, so tests can drive it with `tokio::time::pause` and `advance`.
#[cfg(feature = "runtime-tokio")]
#[derive(Clone, Debug)]
pub struct TokioScheduler {
    handle: Handle,
    origin: Instant,
}

#[cfg(feature = "runtime-tokio")]
impl TokioScheduler {
    pub fn from_handle(handle: Handle) -> Self {
        Self {
            handle,
            origin: Instant::now(),
        }
    }

    /// Binds to the runtime of the calling context.
    ///
    /// # Errors
    ///
    /// Returns [`RheoError::Runtime`] when called outside a tokio runtime.
    pub fn try_current() -> Result<Self> {
        Handle::try_current()
            .map(Self::from_handle)
            .map_err(|e| RheoError::runtime_error(e.to_string()))
    }
}

#[cfg(feature = "runtime-tokio")]
impl Scheduler for TokioScheduler {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn schedule(&self, delay: Duration, action: Action) -> ScheduledTask {
        let token = CancellationToken::new();
        let cancel = token.clone();

        self.handle.spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(delay) => {
                    if !cancel.is_cancelled() {
                        action();
                    }
                }
                () = cancel.cancelled() => {}
            }
        });

        ScheduledTask::new(token)
    }

    fn schedule_periodic(
        &self,
        initial_delay: Duration,
        period: Duration,
        action: PeriodicAction,
    ) -> ScheduledTask {
        let token = CancellationToken::new();
        let cancel = token.clone();

        self.handle.spawn(async move {
            let start = Instant::now() + initial_delay;
            let mut ticker = tokio::time::interval_at(start, effective_period(period));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if cancel.is_cancelled() {
                            break;
                        }
                        action();
                    }
                    () = cancel.cancelled() => break,
                }
            }
        });

        ScheduledTask::new(token)
    }
}
