// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A pass-through publisher recording the demand its subscribers request.

use parking_lot::Mutex;
use rheo_core::{BoxSubscriber, RheoError, Subscriber, Subscription, SubscriptionHandle};
use rheo_publisher::Publisher;
use std::sync::Arc;

/// Shared log of `request(n)` and `cancel()` calls seen by a [`RequestSpy`].
#[derive(Debug, Clone, Default)]
pub struct RequestLog {
    requests: Arc<Mutex<Vec<u64>>>,
    cancels: Arc<Mutex<usize>>,
}

impl RequestLog {
    /// Every requested amount, in call order.
    pub fn requests(&self) -> Vec<u64> {
        self.requests.lock().clone()
    }

    pub fn total_requested(&self) -> u64 {
        self.requests
            .lock()
            .iter()
            .fold(0u64, |total, n| total.saturating_add(*n))
    }

    pub fn cancels(&self) -> usize {
        *self.cancels.lock()
    }
}

/// Wraps `publisher`, recording the demand flowing into it.
pub fn spy_requests<P>(publisher: P) -> (RequestSpy<P>, RequestLog) {
    let log = RequestLog::default();
    (
        RequestSpy {
            source: publisher,
            log: log.clone(),
        },
        log,
    )
}

pub struct RequestSpy<P> {
    source: P,
    log: RequestLog,
}

impl<P, T> Publisher<T> for RequestSpy<P>
where
    P: Publisher<T>,
    T: Send + 'static,
{
    fn subscribe(&self, subscriber: BoxSubscriber<T>) -> SubscriptionHandle {
        let upstream = self.source.subscribe(Box::new(SpySubscriber {
            downstream: subscriber,
            log: self.log.clone(),
        }));
        spied(upstream, &self.log)
    }
}

fn spied(upstream: SubscriptionHandle, log: &RequestLog) -> SubscriptionHandle {
    SubscriptionHandle::new(
        upstream.id(),
        Arc::new(SpySubscription {
            upstream,
            log: log.clone(),
        }),
    )
}

struct SpySubscription {
    upstream: SubscriptionHandle,
    log: RequestLog,
}

impl Subscription for SpySubscription {
    fn request(&self, n: u64) {
        self.log.requests.lock().push(n);
        self.upstream.request(n);
    }

    fn cancel(&self) {
        *self.log.cancels.lock() += 1;
        self.upstream.cancel();
    }

    fn is_cancelled(&self) -> bool {
        self.upstream.is_cancelled()
    }
}

struct SpySubscriber<T> {
    downstream: BoxSubscriber<T>,
    log: RequestLog,
}

impl<T: Send> Subscriber<T> for SpySubscriber<T> {
    fn on_subscribe(&mut self, subscription: SubscriptionHandle) {
        self.downstream.on_subscribe(spied(subscription, &self.log));
    }

    fn on_next(&mut self, item: T) {
        self.downstream.on_next(item);
    }

    fn on_error(&mut self, error: RheoError) {
        self.downstream.on_error(error);
    }

    fn on_complete(&mut self) {
        self.downstream.on_complete();
    }
}
