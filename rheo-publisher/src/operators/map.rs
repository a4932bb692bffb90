// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Item transformation.
//!
//! [`map`](MapExt::map) applies an infallible function. [`try_map`](MapExt::try_map) applies a
//! fallible one: the first `Err` cancels the upstream and is delivered downstream as
//! [`RheoError::SourceTransform`] wrapping the original cause. Demand and cancellation pass
//! straight through to the upstream.

use crate::publisher::Publisher;
use core::marker::PhantomData;
use rheo_core::{BoxSubscriber, RheoError, Subscriber, SubscriptionHandle};
use std::error::Error;
use std::sync::Arc;

/// Extension trait providing [`map`](Self::map) and [`try_map`](Self::try_map).
pub trait MapExt<T>: Publisher<T> + Sized {
    fn map<U, F>(self, f: F) -> Map<Self, F, T>
    where
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        Map {
            source: self,
            f: Arc::new(f),
            _marker: PhantomData,
        }
    }

    /// Like [`map`](Self::map), but a failing call terminates the subscription.
    fn try_map<U, E, F>(self, f: F) -> TryMap<Self, F, T, E>
    where
        E: Error + Send + Sync + 'static,
        F: Fn(T) -> Result<U, E> + Send + Sync + 'static,
    {
        TryMap {
            source: self,
            f: Arc::new(f),
            _marker: PhantomData,
        }
    }
}

impl<T, P: Publisher<T>> MapExt<T> for P {}

pub struct Map<P, F, T> {
    source: P,
    f: Arc<F>,
    _marker: PhantomData<fn(T)>,
}

impl<P, F, T, U> Publisher<U> for Map<P, F, T>
where
    P: Publisher<T>,
    F: Fn(T) -> U + Send + Sync + 'static,
    T: Send + 'static,
    U: Send + 'static,
{
    fn subscribe(&self, subscriber: BoxSubscriber<U>) -> SubscriptionHandle {
        self.source.subscribe(Box::new(MapSubscriber {
            downstream: subscriber,
            f: Arc::clone(&self.f),
        }))
    }
}

struct MapSubscriber<U, F> {
    downstream: BoxSubscriber<U>,
    f: Arc<F>,
}

impl<T, U, F> Subscriber<T> for MapSubscriber<U, F>
where
    F: Fn(T) -> U + Send + Sync,
{
    fn on_subscribe(&mut self, subscription: SubscriptionHandle) {
        self.downstream.on_subscribe(subscription);
    }

    fn on_next(&mut self, item: T) {
        let mapped = (self.f)(item);
        self.downstream.on_next(mapped);
    }

    fn on_error(&mut self, error: RheoError) {
        self.downstream.on_error(error);
    }

    fn on_complete(&mut self) {
        self.downstream.on_complete();
    }
}

pub struct TryMap<P, F, T, E> {
    source: P,
    f: Arc<F>,
    _marker: PhantomData<fn(T) -> E>,
}

impl<P, F, T, U, E> Publisher<U> for TryMap<P, F, T, E>
where
    P: Publisher<T>,
    F: Fn(T) -> Result<U, E> + Send + Sync + 'static,
    E: Error + Send + Sync + 'static,
    T: Send + 'static,
    U: Send + 'static,
{
    fn subscribe(&self, subscriber: BoxSubscriber<U>) -> SubscriptionHandle {
        self.source.subscribe(Box::new(TryMapSubscriber {
            downstream: subscriber,
            f: Arc::clone(&self.f),
            upstream: None,
            done: false,
            _marker: PhantomData,
        }))
    }
}

struct TryMapSubscriber<U, F, E> {
    downstream: BoxSubscriber<U>,
    f: Arc<F>,
    upstream: Option<SubscriptionHandle>,
    done: bool,
    _marker: PhantomData<fn() -> E>,
}

impl<T, U, E, F> Subscriber<T> for TryMapSubscriber<U, F, E>
where
    F: Fn(T) -> Result<U, E> + Send + Sync,
    E: Error + Send + Sync + 'static,
{
    fn on_subscribe(&mut self, subscription: SubscriptionHandle) {
        self.upstream = Some(subscription.clone());
        self.downstream.on_subscribe(subscription);
    }

    fn on_next(&mut self, item: T) {
        if self.done {
            return;
        }
        match (self.f)(item) {
            Ok(mapped) => self.downstream.on_next(mapped),
            Err(cause) => {
                self.done = true;
                if let Some(upstream) = self.upstream.take() {
                    upstream.cancel();
                }
                self.downstream.on_error(RheoError::transform(cause));
            }
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
