// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use rheo_core::{RheoError, Subscriber, Subscription, SubscriptionHandle, UNBOUNDED};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How a [`HookSubscriber`] finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Complete,
    Error,
    Cancel,
}

/// Callbacks of a [`HookSubscriber`].
///
/// Every hook receives the live subscription, so hooks can request more or cancel. Only
/// [`hook_on_next`](Self::hook_on_next) is mandatory. The default `hook_on_subscribe` requests
/// unbounded demand.
pub trait SubscriberHooks<T>: Send {
    fn hook_on_subscribe(&mut self, subscription: &SubscriptionHandle) {
        subscription.request(UNBOUNDED);
    }

    fn hook_on_next(&mut self, item: T, subscription: &SubscriptionHandle);

    fn hook_on_error(&mut self, error: RheoError) {
        error!("Unhandled error in subscriber: {}", error);
    }

    fn hook_on_complete(&mut self) {}

    /// Runs once after completion, error, or a cancel issued from a hook.
    fn hook_finally(&mut self, _termination: Termination) {}
}

/// Subscriber delegating to a [`SubscriberHooks`] implementation.
///
/// ```
/// use rheo_core::SubscriptionHandle;
/// use rheo_publisher::prelude::*;
///
/// struct OneByOne(Vec<i64>);
///
/// impl SubscriberHooks<i64> for OneByOne {
///     fn hook_on_subscribe(&mut self, subscription: &SubscriptionHandle) {
///         subscription.request(1);
///     }
///
///     fn hook_on_next(&mut self, item: i64, subscription: &SubscriptionHandle) {
///         self.0.push(item);
///         subscription.request(1);
///     }
/// }
///
/// range(1, 3).subscribe(Box::new(HookSubscriber::new(OneByOne(Vec::new()))));
/// ```
pub struct HookSubscriber<H> {
    hooks: H,
    subscription: Option<SubscriptionHandle>,
    hook_cancel: Option<Arc<HookSubscription>>,
    finished: bool,
}

/// The subscription as seen by the hooks, tracking whether a hook cancelled it.
struct HookSubscription {
    upstream: SubscriptionHandle,
    cancelled: AtomicBool,
}

impl Subscription for HookSubscription {
    fn request(&self, n: u64) {
        self.upstream.request(n);
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.upstream.cancel();
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire) || self.upstream.is_cancelled()
    }
}

impl<H> HookSubscriber<H> {
    pub fn new(hooks: H) -> Self {
        Self {
            hooks,
            subscription: None,
            hook_cancel: None,
            finished: false,
        }
    }

    fn finish<T>(&mut self, termination: Termination)
    where
        H: SubscriberHooks<T>,
    {
        if !self.finished {
            self.finished = true;
            self.subscription = None;
            self.hook_cancel = None;
            self.hooks.hook_finally(termination);
        }
    }

    fn cancelled_by_hook(&self) -> bool {
        self.hook_cancel
            .as_ref()
            .is_some_and(|s| s.cancelled.load(Ordering::Acquire))
    }
}

impl<T, H> Subscriber<T> for HookSubscriber<H>
where
    H: SubscriberHooks<T>,
{
    fn on_subscribe(&mut self, subscription: SubscriptionHandle) {
        let id = subscription.id();
        let hook_cancel = Arc::new(HookSubscription {
            upstream: subscription,
            cancelled: AtomicBool::new(false),
        });
        let subscription =
            SubscriptionHandle::new(id, Arc::clone(&hook_cancel) as Arc<dyn Subscription>);
        self.subscription = Some(subscription.clone());
        self.hook_cancel = Some(hook_cancel);
        self.hooks.hook_on_subscribe(&subscription);
        if self.cancelled_by_hook() {
            self.finish::<T>(Termination::Cancel);
        }
    }

    fn on_next(&mut self, item: T) {
        if self.finished {
            return;
        }
        let Some(subscription) = self.subscription.clone() else {
            return;
        };
        self.hooks.hook_on_next(item, &subscription);
        if self.cancelled_by_hook() {
            self.finish::<T>(Termination::Cancel);
        }
    }

    fn on_error(&mut self, error: RheoError) {
        if self.finished {
            return;
        }
        self.hooks.hook_on_error(error);
        self.finish::<T>(Termination::Error);
    }

    fn on_complete(&mut self) {
        if self.finished {
            return;
        }
        self.hooks.hook_on_complete();
        self.finish::<T>(Termination::Complete);
    }
}
