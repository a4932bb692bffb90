// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The emission state machine shared by every source publisher.
//!
//! A subscription is `Emitting` while some caller owns its drain loop, `Idle` otherwise, and
//! ends in `Terminated` or `Cancelled`. `request`, `cancel` and scheduler ticks only record their
//! effect and then try to enter the loop; whoever gets in emits everything the recorded demand
//! allows.

use crate::wip::Wip;
use parking_lot::Mutex;
use rheo_core::{
    BoxSubscriber, Demand, RheoError, Subscription, SubscriptionHandle, SubscriptionId,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What a [`Source`] has to offer on a pull.
pub(crate) enum Pull<T> {
    Next(T),
    /// Nothing now. The source will be pulled again on the next request or tick.
    Idle,
    Complete,
    Fail(RheoError),
}

/// Generator behind a source publisher, driven by [`SourceSubscription`].
pub(crate) trait Source<T>: Send + 'static {
    /// Returns the next signal. Without demand only terminal signals or `Idle` may be returned.
    fn pull(&mut self, has_demand: bool) -> Pull<T>;

    /// Releases timers or other resources once the subscription is over.
    fn dispose(&mut self) {}
}

struct DrainState<T, S> {
    source: S,
    subscriber: Option<BoxSubscriber<T>>,
}

pub(crate) struct SourceSubscription<T, S> {
    id: SubscriptionId,
    demand: Demand,
    wip: Wip,
    cancelled: AtomicBool,
    illegal_request: Mutex<Option<RheoError>>,
    state: Mutex<DrainState<T, S>>,
}

impl<T, S> SourceSubscription<T, S>
where
    T: Send + 'static,
    S: Source<T>,
{
    /// Creates the subscription with its drain loop owned by the caller, who must call
    /// [`start`](Self::start).
    pub(crate) fn new(source: S, subscriber: BoxSubscriber<T>) -> Arc<Self> {
        Arc::new(Self {
            id: SubscriptionId::next(),
            demand: Demand::new(),
            wip: Wip::entered(),
            cancelled: AtomicBool::new(false),
            illegal_request: Mutex::new(None),
            state: Mutex::new(DrainState {
                source,
                subscriber: Some(subscriber),
            }),
        })
    }

    /// Subscribes `subscriber` to a fresh execution of `source`.
    pub(crate) fn launch(source: S, subscriber: BoxSubscriber<T>) -> SubscriptionHandle {
        let subscription = Self::new(source, subscriber);
        subscription.start();
        subscription.handle()
    }

    pub(crate) fn handle(self: &Arc<Self>) -> SubscriptionHandle {
        SubscriptionHandle::new(self.id, Arc::clone(self) as Arc<dyn Subscription>)
    }

    /// Delivers `on_subscribe`, then emits whatever was requested from inside it.
    pub(crate) fn start(self: &Arc<Self>) {
        let handle = self.handle();
        if let Some(subscriber) = self.state.lock().subscriber.as_mut() {
            subscriber.on_subscribe(handle);
        }
        self.wip.resume(|| self.emit_available());
    }

    /// Re-enters the drain loop after external progress such as a scheduler tick.
    pub(crate) fn drain(&self) {
        self.wip.run(|| self.emit_available());
    }

    fn emit_available(&self) {
        let mut state = self.state.lock();
        let DrainState { source, subscriber } = &mut *state;
        let Some(mut target) = subscriber.take() else {
            return;
        };

        loop {
            if self.is_cancelled() {
                source.dispose();
                return;
            }

            if let Some(error) = self.illegal_request.lock().take() {
                self.finish(source);
                target.on_error(error);
                return;
            }

            // Demand is taken before pulling, so a cancel clearing it cannot race an emission.
            let has_demand = self.demand.try_consume();
            match source.pull(has_demand) {
                Pull::Next(item) => {
                    if self.is_cancelled() {
                        source.dispose();
                        return;
                    }
                    target.on_next(item);
                }
                Pull::Idle => {
                    if has_demand {
                        self.demand.refund();
                    }
                    *subscriber = Some(target);
                    return;
                }
                Pull::Complete => {
                    self.finish(source);
                    target.on_complete();
                    return;
                }
                Pull::Fail(error) => {
                    self.finish(source);
                    target.on_error(error);
                    return;
                }
            }
        }
    }

    fn finish(&self, source: &mut S) {
        self.demand.clear();
        source.dispose();
    }
}

impl<T, S> Subscription for SourceSubscription<T, S>
where
    T: Send + 'static,
    S: Source<T>,
{
    fn request(&self, n: u64) {
        if let Err(error) = self.demand.grant(n) {
            self.illegal_request.lock().get_or_insert(error);
        }
        self.drain();
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.demand.clear();
        self.drain();
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
