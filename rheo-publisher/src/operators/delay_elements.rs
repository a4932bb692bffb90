// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Per-item delay on a scheduler.
//!
//! [`delay_elements(d, scheduler)`](DelayElementsExt::delay_elements) shifts every item by `d`.
//! It keeps at most one item in flight: the next item is requested from the upstream only after
//! the previous one has been delivered and while the downstream still has demand, so consecutive
//! items are spaced at least `d` apart.
//!
//! Completion waits for the in-flight item. Errors are relayed immediately and drop it.

use crate::publisher::Publisher;
use core::time::Duration;
use parking_lot::Mutex;
use rheo_core::{
    BoxSubscriber, Demand, RheoError, SerializedEmitter, Subscriber, Subscription,
    SubscriptionHandle, SubscriptionId,
};
use rheo_runtime::{ScheduledTask, SchedulerRef};
use std::sync::{Arc, Weak};

/// Extension trait providing [`delay_elements`](Self::delay_elements).
pub trait DelayElementsExt<T>: Publisher<T> + Sized {
    fn delay_elements(self, delay: Duration, scheduler: SchedulerRef) -> DelayElements<Self> {
        DelayElements {
            source: self,
            delay,
            scheduler,
        }
    }
}

impl<T, P: Publisher<T>> DelayElementsExt<T> for P {}

pub struct DelayElements<P> {
    source: P,
    delay: Duration,
    scheduler: SchedulerRef,
}

impl<P, T> Publisher<T> for DelayElements<P>
where
    P: Publisher<T>,
    T: Send + 'static,
{
    fn subscribe(&self, subscriber: BoxSubscriber<T>) -> SubscriptionHandle {
        let inner = Arc::new(DelayInner {
            id: SubscriptionId::next(),
            delay: self.delay,
            scheduler: Arc::clone(&self.scheduler),
            emitter: SerializedEmitter::new(subscriber),
            demand: Demand::new(),
            state: Mutex::new(DelayState::default()),
        });
        self.source.subscribe(Box::new(DelayUpstream {
            inner: Arc::clone(&inner),
        }));
        inner.handle()
    }
}

#[derive(Default)]
struct DelayState {
    upstream: Option<SubscriptionHandle>,
    /// One item requested from the upstream and not yet received.
    awaiting: bool,
    /// One item received and waiting on its timer.
    scheduled: bool,
    upstream_complete: bool,
    done: bool,
    generation: u64,
    timer: Option<ScheduledTask>,
}

struct DelayInner<T> {
    id: SubscriptionId,
    delay: Duration,
    scheduler: SchedulerRef,
    emitter: SerializedEmitter<T>,
    demand: Demand,
    state: Mutex<DelayState>,
}

impl<T: Send + 'static> DelayInner<T> {
    fn handle(self: &Arc<Self>) -> SubscriptionHandle {
        SubscriptionHandle::new(self.id, Arc::clone(self) as Arc<dyn Subscription>)
    }

    /// Requests one more upstream item if nothing is in flight and the downstream wants one.
    fn pull_next(&self) {
        let upstream = {
            let mut state = self.state.lock();
            if state.awaiting
                || state.scheduled
                || state.upstream_complete
                || state.done
                || self.demand.outstanding() == 0
            {
                return;
            }
            let Some(upstream) = state.upstream.clone() else {
                return;
            };
            state.awaiting = true;
            upstream
        };
        upstream.request(1);
    }

    fn schedule(self: &Arc<Self>, item: T) {
        let generation = {
            let mut state = self.state.lock();
            if state.done {
                return;
            }
            state.awaiting = false;
            state.scheduled = true;
            state.generation += 1;
            state.generation
        };

        let weak: Weak<Self> = Arc::downgrade(self);
        let timer = self.scheduler.schedule(
            self.delay,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.deliver(item);
                }
            }),
        );
        let mut state = self.state.lock();
        if state.done {
            timer.cancel();
        } else if state.scheduled && state.generation == generation {
            state.timer = Some(timer);
        } else {
            timer.detach();
        }
    }

    fn deliver(&self, item: T) {
        let complete_after = {
            let mut state = self.state.lock();
            state.timer = None;
            state.scheduled = false;
            if state.done {
                return;
            }
            if state.upstream_complete {
                state.done = true;
            }
            state.upstream_complete
        };

        self.demand.try_consume();
        // Lifecycle violations are logged by the emitter.
        let _ = self.emitter.next(item);

        if complete_after {
            let _ = self.emitter.complete();
        } else {
            self.pull_next();
        }
    }

    fn fail(&self, error: RheoError) {
        let (timer, upstream) = {
            let mut state = self.state.lock();
            if state.done {
                return;
            }
            state.done = true;
            (state.timer.take(), state.upstream.take())
        };
        if let Some(timer) = timer {
            timer.cancel();
        }
        if let Some(upstream) = upstream {
            upstream.cancel();
        }
        self.demand.clear();
        let _ = self.emitter.error(error);
    }
}

impl<T: Send + 'static> Subscription for DelayInner<T> {
    fn request(&self, n: u64) {
        match self.demand.grant(n) {
            Ok(_) => self.pull_next(),
            Err(error) => self.fail(error),
        }
    }

    fn cancel(&self) {
        let (timer, upstream) = {
            let mut state = self.state.lock();
            state.done = true;
            (state.timer.take(), state.upstream.take())
        };
        if let Some(timer) = timer {
            timer.cancel();
        }
        if let Some(upstream) = upstream {
            upstream.cancel();
        }
        self.demand.clear();
        self.emitter.cancel();
    }

    fn is_cancelled(&self) -> bool {
        self.emitter.is_cancelled()
    }
}

struct DelayUpstream<T> {
    inner: Arc<DelayInner<T>>,
}

impl<T: Send + 'static> Subscriber<T> for DelayUpstream<T> {
    fn on_subscribe(&mut self, subscription: SubscriptionHandle) {
        self.inner.state.lock().upstream = Some(subscription);
        let _ = self.inner.emitter.on_subscribe(self.inner.handle());
    }

    fn on_next(&mut self, item: T) {
        self.inner.schedule(item);
    }

    fn on_error(&mut self, error: RheoError) {
        self.inner.fail(error);
    }

    fn on_complete(&mut self) {
        let complete_now = {
            let mut state = self.inner.state.lock();
            state.upstream_complete = true;
            state.upstream.take();
            if state.scheduled || state.done {
                false
            } else {
                state.done = true;
                true
            }
        };
        if complete_now {
            self.inner.demand.clear();
            let _ = self.inner.emitter.complete();
        }
    }
}
