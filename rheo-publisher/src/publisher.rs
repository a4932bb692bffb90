// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::subscriber::LambdaSubscriber;
use rheo_core::{BoxSubscriber, SubscriptionHandle};
use std::sync::Arc;

/// A deferred, repeatable description of a sequence.
///
/// Every call to [`subscribe`](Self::subscribe) starts an independent execution. The subscriber
/// receives `on_subscribe` before `subscribe` returns, and nothing else until it requests demand
/// through the handle.
pub trait Publisher<T>: Send + Sync {
    fn subscribe(&self, subscriber: BoxSubscriber<T>) -> SubscriptionHandle;

    /// Subscribes with an unbounded request, forwarding every item to `on_next`.
    ///
    /// Errors are logged; use [`LambdaSubscriber`] directly to observe them.
    fn subscribe_with<F>(&self, on_next: F) -> SubscriptionHandle
    where
        Self: Sized,
        T: Send + 'static,
        F: FnMut(T) + Send + 'static,
    {
        self.subscribe(Box::new(LambdaSubscriber::new(on_next)))
    }
}

/// Type-erased, shareable publisher.
pub type BoxPublisher<T> = Arc<dyn Publisher<T>>;

impl<T, P> Publisher<T> for Arc<P>
where
    P: Publisher<T> + ?Sized,
{
    fn subscribe(&self, subscriber: BoxSubscriber<T>) -> SubscriptionHandle {
        (**self).subscribe(subscriber)
    }
}

impl<T, P> Publisher<T> for Box<P>
where
    P: Publisher<T> + ?Sized,
{
    fn subscribe(&self, subscriber: BoxSubscriber<T>) -> SubscriptionHandle {
        (**self).subscribe(subscriber)
    }
}
