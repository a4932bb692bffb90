// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Signal logging.
//!
//! [`log`](LogExt::log) records every signal crossing it at `info` level without altering the
//! sequence: `onSubscribe`, `request(n)`, `onNext(v)`, `onError(e)`, `onComplete()` and
//! `cancel()`. Each record is prefixed with a category, `rheo.Publisher` unless set with
//! [`log_with`](LogExt::log_with).

use crate::publisher::Publisher;
use core::fmt::Debug;
use rheo_core::{BoxSubscriber, RheoError, Subscriber, Subscription, SubscriptionHandle};
use std::sync::Arc;

pub const DEFAULT_CATEGORY: &str = "rheo.Publisher";

/// Extension trait providing [`log`](Self::log) and [`log_with`](Self::log_with).
pub trait LogExt<T>: Publisher<T> + Sized {
    fn log(self) -> Log<Self> {
        self.log_with(DEFAULT_CATEGORY)
    }

    fn log_with(self, category: impl Into<String>) -> Log<Self> {
        Log {
            source: self,
            category: Arc::from(category.into()),
        }
    }
}

impl<T, P: Publisher<T>> LogExt<T> for P {}

pub struct Log<P> {
    source: P,
    category: Arc<str>,
}

impl<P> Log<P> {
    pub fn category(&self) -> &str {
        &self.category
    }
}

impl<P, T> Publisher<T> for Log<P>
where
    P: Publisher<T>,
    T: Debug + Send + 'static,
{
    fn subscribe(&self, subscriber: BoxSubscriber<T>) -> SubscriptionHandle {
        let upstream = self.source.subscribe(Box::new(LogSubscriber {
            downstream: subscriber,
            category: Arc::clone(&self.category),
        }));
        logged(upstream, &self.category)
    }
}

fn logged(upstream: SubscriptionHandle, category: &Arc<str>) -> SubscriptionHandle {
    let id = upstream.id();
    SubscriptionHandle::new(
        id,
        Arc::new(LoggedSubscription {
            upstream,
            category: Arc::clone(category),
        }),
    )
}

struct LoggedSubscription {
    upstream: SubscriptionHandle,
    category: Arc<str>,
}

impl Subscription for LoggedSubscription {
    fn request(&self, n: u64) {
        if n == u64::MAX {
            info!("[{}] request(unbounded)", self.category);
        } else {
            info!("[{}] request({})", self.category, n);
        }
        self.upstream.request(n);
    }

    fn cancel(&self) {
        info!("[{}] cancel()", self.category);
        self.upstream.cancel();
    }

    fn is_cancelled(&self) -> bool {
        self.upstream.is_cancelled()
    }
}

struct LogSubscriber<T> {
    downstream: BoxSubscriber<T>,
    category: Arc<str>,
}

impl<T: Debug + Send> Subscriber<T> for LogSubscriber<T> {
    fn on_subscribe(&mut self, subscription: SubscriptionHandle) {
        info!("[{}] onSubscribe({})", self.category, subscription.id());
        let logged = logged(subscription, &self.category);
        self.downstream.on_subscribe(logged);
    }

    fn on_next(&mut self, item: T) {
        info!("[{}] onNext({:?})", self.category, item);
        self.downstream.on_next(item);
    }

    fn on_error(&mut self, error: RheoError) {
        info!("[{}] onError({})", self.category, error);
        self.downstream.on_error(error);
    }

    fn on_complete(&mut self) {
        info!("[{}] onComplete()", self.category);
        self.downstream.on_complete();
    }
}
