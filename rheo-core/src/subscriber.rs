// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::RheoError;
use crate::signal::Signal;
use crate::subscription::SubscriptionHandle;

/// The receiving side of a publisher.
///
/// Publishers call `on_subscribe` exactly once, then `on_next` zero or more times, then at most
/// one of `on_error` or `on_complete`. Calls never overlap.
///
/// Subscribers drive backpressure themselves: nothing is emitted until the handle received in
/// `on_subscribe` is asked for demand.
///
/// ```
/// use rheo_core::{RheoError, Subscriber, SubscriptionHandle};
///
/// struct TwoAtATime {
///     handle: Option<SubscriptionHandle>,
///     received: u64,
/// }
///
/// impl Subscriber<i64> for TwoAtATime {
///     fn on_subscribe(&mut self, subscription: SubscriptionHandle) {
///         subscription.request(2);
///         self.handle = Some(subscription);
///     }
///
///     fn on_next(&mut self, _item: i64) {
///         self.received += 1;
///         if self.received % 2 == 0 {
///             if let Some(handle) = &self.handle {
///                 handle.request(2);
///             }
///         }
///     }
///
///     fn on_error(&mut self, _error: RheoError) {}
///
///     fn on_complete(&mut self) {}
/// }
/// ```
pub trait Subscriber<T>: Send {
    fn on_subscribe(&mut self, subscription: SubscriptionHandle);

    fn on_next(&mut self, item: T);

    fn on_error(&mut self, error: RheoError);

    fn on_complete(&mut self);

    /// Dispatches a [`Signal`] to the matching callback.
    fn on_signal(&mut self, signal: Signal<T>) {
        match signal {
            Signal::Subscribe(s) => self.on_subscribe(s),
            Signal::Next(v) => self.on_next(v),
            Signal::Error(e) => self.on_error(e),
            Signal::Complete => self.on_complete(),
        }
    }
}

/// Type-erased subscriber, the form publishers accept.
pub type BoxSubscriber<T> = Box<dyn Subscriber<T>>;

impl<T, S> Subscriber<T> for Box<S>
where
    S: Subscriber<T> + ?Sized,
{
    fn on_subscribe(&mut self, subscription: SubscriptionHandle) {
        (**self).on_subscribe(subscription);
    }

    fn on_next(&mut self, item: T) {
        (**self).on_next(item);
    }

    fn on_error(&mut self, error: RheoError) {
        (**self).on_error(error);
    }

    fn on_complete(&mut self) {
        (**self).on_complete();
    }
}
