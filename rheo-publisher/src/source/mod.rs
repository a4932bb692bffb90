// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Source publishers.
//!
//! Sources emit synchronously on the thread that requests demand, except [`interval`], which
//! emits from its scheduler. Finite sources complete as soon as their last item has been
//! delivered, without waiting for further demand.
//!
//! ```
//! use rheo_core::{RheoError, Subscriber, SubscriptionHandle};
//! use rheo_publisher::prelude::*;
//! use std::sync::{Arc, Mutex};
//!
//! struct Collect(Arc<Mutex<Vec<i64>>>);
//!
//! impl Subscriber<i64> for Collect {
//!     fn on_subscribe(&mut self, subscription: SubscriptionHandle) {
//!         subscription.request(u64::MAX);
//!     }
//!     fn on_next(&mut self, item: i64) {
//!         self.0.lock().unwrap().push(item);
//!     }
//!     fn on_error(&mut self, _error: RheoError) {}
//!     fn on_complete(&mut self) {}
//! }
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! range(1, 5).subscribe(Box::new(Collect(seen.clone())));
//! assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4, 5]);
//! ```

mod interval;

pub use interval::{interval, Interval};

use crate::publisher::Publisher;
use crate::subscription::{Pull, Source, SourceSubscription};
use core::marker::PhantomData;
use rheo_core::{BoxSubscriber, RheoError, SubscriptionHandle};
use std::iter::Peekable;

/// Publisher over a cloneable iterable, re-iterated for every subscription.
#[derive(Debug, Clone)]
pub struct FromIter<I> {
    iterable: I,
}

/// Emits every item of `iterable`, then completes.
///
/// The iterator is read one item ahead of demand: completion is signalled as soon as the last
/// requested item was delivered, which needs to know the iterator is exhausted. A lazy iterator
/// therefore produces item `k + 1` once `k` items were requested.
pub fn from_iter<I>(iterable: I) -> FromIter<I>
where
    I: IntoIterator + Clone + Send + Sync,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    FromIter { iterable }
}

/// Emits the given items in order, then completes.
pub fn just<T, I>(items: I) -> FromIter<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
    I: IntoIterator<Item = T>,
{
    FromIter {
        iterable: items.into_iter().collect(),
    }
}

struct IterSource<I: Iterator> {
    items: Peekable<I>,
}

impl<I> Source<I::Item> for IterSource<I>
where
    I: Iterator + Send + 'static,
    I::Item: Send + 'static,
{
    fn pull(&mut self, has_demand: bool) -> Pull<I::Item> {
        // Lookahead for eager completion.
        if self.items.peek().is_none() {
            return Pull::Complete;
        }
        if !has_demand {
            return Pull::Idle;
        }
        self.items.next().map_or(Pull::Complete, Pull::Next)
    }
}

impl<I> Publisher<I::Item> for FromIter<I>
where
    I: IntoIterator + Clone + Send + Sync,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    fn subscribe(&self, subscriber: BoxSubscriber<I::Item>) -> SubscriptionHandle {
        let source = IterSource {
            items: self.iterable.clone().into_iter().peekable(),
        };
        SourceSubscription::launch(source, subscriber)
    }
}

/// Publisher of consecutive integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    start: i64,
    count: u64,
}

/// Emits `count` consecutive integers starting at `start`, then completes.
///
/// The count is clamped so the sequence never passes `i64::MAX`.
pub fn range(start: i64, count: u64) -> Range {
    let room = i64::MAX.abs_diff(start).saturating_add(1);
    Range {
        start,
        count: count.min(room),
    }
}

struct RangeSource {
    next: i64,
    remaining: u64,
}

impl Source<i64> for RangeSource {
    fn pull(&mut self, has_demand: bool) -> Pull<i64> {
        if self.remaining == 0 {
            return Pull::Complete;
        }
        if !has_demand {
            return Pull::Idle;
        }
        let value = self.next;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.next += 1;
        }
        Pull::Next(value)
    }
}

impl Publisher<i64> for Range {
    fn subscribe(&self, subscriber: BoxSubscriber<i64>) -> SubscriptionHandle {
        let source = RangeSource {
            next: self.start,
            remaining: self.count,
        };
        SourceSubscription::launch(source, subscriber)
    }
}

/// Publisher that completes without emitting.
#[derive(Debug)]
pub struct Empty<T> {
    _marker: PhantomData<fn() -> T>,
}

pub fn empty<T>() -> Empty<T> {
    Empty {
        _marker: PhantomData,
    }
}

impl<T> Clone for Empty<T> {
    fn clone(&self) -> Self {
        empty()
    }
}

struct EmptySource;

impl<T> Source<T> for EmptySource {
    fn pull(&mut self, _has_demand: bool) -> Pull<T> {
        Pull::Complete
    }
}

impl<T: Send + 'static> Publisher<T> for Empty<T> {
    fn subscribe(&self, subscriber: BoxSubscriber<T>) -> SubscriptionHandle {
        SourceSubscription::launch(EmptySource, subscriber)
    }
}

/// Publisher that fails every subscription with the same error.
#[derive(Debug)]
pub struct Failing<T> {
    error: RheoError,
    _marker: PhantomData<fn() -> T>,
}

/// Signals `error` right after subscription, without emitting.
pub fn error<T>(error: RheoError) -> Failing<T> {
    Failing {
        error,
        _marker: PhantomData,
    }
}

impl<T> Clone for Failing<T> {
    fn clone(&self) -> Self {
        error(self.error.clone())
    }
}

struct FailingSource {
    error: Option<RheoError>,
}

impl<T> Source<T> for FailingSource {
    fn pull(&mut self, _has_demand: bool) -> Pull<T> {
        match self.error.take() {
            Some(error) => Pull::Fail(error),
            None => Pull::Idle,
        }
    }
}

impl<T: Send + 'static> Publisher<T> for Failing<T> {
    fn subscribe(&self, subscriber: BoxSubscriber<T>) -> SubscriptionHandle {
        let source = FailingSource {
            error: Some(self.error.clone()),
        };
        SourceSubscription::launch(source, subscriber)
    }
}
