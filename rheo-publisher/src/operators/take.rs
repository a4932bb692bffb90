// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::publisher::Publisher;
use rheo_core::{BoxSubscriber, RheoError, Subscriber, SubscriptionHandle};

/// Extension trait providing [`take`](Self::take).
pub trait TakeExt<T>: Publisher<T> + Sized {
    /// Emits at most `n` items, then cancels the upstream and completes.
    ///
    /// `take(0)` completes right after subscription.
    fn take(self, n: u64) -> Take<Self> {
        Take { source: self, n }
    }
}

impl<T, P: Publisher<T>> TakeExt<T> for P {}

pub struct Take<P> {
    source: P,
    n: u64,
}

impl<P, T> Publisher<T> for Take<P>
where
    P: Publisher<T>,
    T: Send + 'static,
{
    fn subscribe(&self, subscriber: BoxSubscriber<T>) -> SubscriptionHandle {
        self.source.subscribe(Box::new(TakeSubscriber {
            downstream: subscriber,
            remaining: self.n,
            upstream: None,
            done: false,
        }))
    }
}

struct TakeSubscriber<T> {
    downstream: BoxSubscriber<T>,
    remaining: u64,
    upstream: Option<SubscriptionHandle>,
    done: bool,
}

impl<T> TakeSubscriber<T> {
    fn finish(&mut self) {
        self.done = true;
        let Some(upstream) = self.upstream.take() else {
            return;
        };
        // Cancelled by the downstream itself: no terminal signal is owed.
        if upstream.is_cancelled() {
            return;
        }
        upstream.cancel();
        self.downstream.on_complete();
    }
}

impl<T: Send> Subscriber<T> for TakeSubscriber<T> {
    fn on_subscribe(&mut self, subscription: SubscriptionHandle) {
        self.upstream = Some(subscription.clone());
        self.downstream.on_subscribe(subscription);
        if self.remaining == 0 && !self.done {
            self.finish();
        }
    }

    fn on_next(&mut self, item: T) {
        if self.done {
            return;
        }
        self.remaining -= 1;
        self.downstream.on_next(item);
        // Upstream is cancelled only once the downstream returned from the last item.
        if self.remaining == 0 && !self.done {
            self.finish();
        }
    }

    fn on_error(&mut self, error: RheoError) {
        if !self.done {
            self.done = true;
            self.downstream.on_error(error);
        }
    }

    fn on_complete(&mut self) {
        if !self.done {
            self.done = true;
            self.downstream.on_complete();
        }
    }
}
