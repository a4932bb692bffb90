// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::publisher::Publisher;
use crate::subscription::{Pull, Source, SourceSubscription};
use core::time::Duration;
use parking_lot::Mutex;
use rheo_core::{BoxSubscriber, RheoError, SubscriptionHandle};
use rheo_runtime::{ScheduledTask, SchedulerRef};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Periodic tick publisher. See [`interval`].
#[derive(Debug, Clone)]
pub struct Interval {
    period: Duration,
    scheduler: SchedulerRef,
}

/// Emits `0, 1, 2, …` on `scheduler`, one value per `period`, the first one `period` after
/// subscription. Never completes on its own.
///
/// Ticks are not buffered: a tick that finds no outstanding demand terminates the subscription
/// with [`RheoError::DemandExceeded`].
pub fn interval(period: Duration, scheduler: SchedulerRef) -> Interval {
    Interval { period, scheduler }
}

#[derive(Default)]
struct TickShared {
    pending: AtomicU64,
    task: Mutex<Option<ScheduledTask>>,
}

struct IntervalSource {
    shared: Arc<TickShared>,
    next: u64,
}

impl Source<u64> for IntervalSource {
    fn pull(&mut self, has_demand: bool) -> Pull<u64> {
        if self.shared.pending.load(Ordering::Acquire) == 0 {
            return Pull::Idle;
        }
        if !has_demand {
            return Pull::Fail(RheoError::demand_exceeded(format!(
                "interval tick {} fired without outstanding demand",
                self.next
            )));
        }
        self.shared.pending.fetch_sub(1, Ordering::AcqRel);
        let value = self.next;
        self.next = self.next.wrapping_add(1);
        Pull::Next(value)
    }

    fn dispose(&mut self) {
        if let Some(task) = self.shared.task.lock().take() {
            task.cancel();
        }
    }
}

impl Publisher<u64> for Interval {
    fn subscribe(&self, subscriber: BoxSubscriber<u64>) -> SubscriptionHandle {
        let shared = Arc::new(TickShared::default());
        let source = IntervalSource {
            shared: Arc::clone(&shared),
            next: 0,
        };
        let subscription = SourceSubscription::new(source, subscriber);

        let weak: Weak<SourceSubscription<u64, IntervalSource>> = Arc::downgrade(&subscription);
        let ticks = Arc::clone(&shared);
        let task = self.scheduler.schedule_periodic(
            self.period,
            self.period,
            Arc::new(move || {
                if let Some(subscription) = weak.upgrade() {
                    ticks.pending.fetch_add(1, Ordering::AcqRel);
                    subscription.drain();
                }
            }),
        );
        *shared.task.lock() = Some(task);

        subscription.start();
        subscription.handle()
    }
}
