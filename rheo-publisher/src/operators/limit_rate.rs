// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Upstream request capping.
//!
//! [`limit_rate(n)`](LimitRateExt::limit_rate) never asks the upstream for more than `n` items at
//! once, whatever the downstream requests. It prefetches `n`, queues what arrives, delivers
//! within downstream demand, and asks for more once three quarters of the batch has been
//! delivered. Terminal signals are delivered after the queued items.

use crate::publisher::Publisher;
use crate::wip::Wip;
use parking_lot::Mutex;
use rheo_core::{
    BoxSubscriber, Demand, RheoError, Signal, Subscriber, Subscription, SubscriptionHandle,
    SubscriptionId, UNBOUNDED,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Extension trait providing [`limit_rate`](Self::limit_rate).
pub trait LimitRateExt<T>: Publisher<T> + Sized {
    /// Caps every upstream request at `n` (at least 1).
    fn limit_rate(self, n: u64) -> LimitRate<Self> {
        LimitRate {
            source: self,
            prefetch: n.max(1),
        }
    }
}

impl<T, P: Publisher<T>> LimitRateExt<T> for P {}

pub struct LimitRate<P> {
    source: P,
    prefetch: u64,
}

impl<P, T> Publisher<T> for LimitRate<P>
where
    P: Publisher<T>,
    T: Send + 'static,
{
    fn subscribe(&self, subscriber: BoxSubscriber<T>) -> SubscriptionHandle {
        let inner = Arc::new(LimitRateInner::new(subscriber, self.prefetch));
        self.source.subscribe(Box::new(LimitRateUpstream {
            inner: Arc::clone(&inner),
        }));
        inner.handle()
    }
}

struct Buffer<T> {
    items: VecDeque<T>,
    terminal: Option<Signal<T>>,
    delivered_since_refill: u64,
}

enum Ready<T> {
    Item { item: T, refill: bool },
    Terminal(Signal<T>),
    Wait,
}

struct LimitRateInner<T> {
    id: SubscriptionId,
    prefetch: u64,
    refill: u64,
    demand: Demand,
    wip: Wip,
    cancelled: AtomicBool,
    illegal_request: Mutex<Option<RheoError>>,
    buffer: Mutex<Buffer<T>>,
    upstream: Mutex<Option<SubscriptionHandle>>,
    downstream: Mutex<Option<BoxSubscriber<T>>>,
}

impl<T: Send + 'static> LimitRateInner<T> {
    fn new(downstream: BoxSubscriber<T>, prefetch: u64) -> Self {
        let refill = if prefetch == UNBOUNDED {
            UNBOUNDED
        } else {
            prefetch - prefetch / 4
        };
        Self {
            id: SubscriptionId::next(),
            prefetch,
            refill,
            demand: Demand::new(),
            wip: Wip::entered(),
            cancelled: AtomicBool::new(false),
            illegal_request: Mutex::new(None),
            buffer: Mutex::new(Buffer {
                items: VecDeque::new(),
                terminal: None,
                delivered_since_refill: 0,
            }),
            upstream: Mutex::new(None),
            downstream: Mutex::new(Some(downstream)),
        }
    }

    fn handle(self: &Arc<Self>) -> SubscriptionHandle {
        SubscriptionHandle::new(self.id, Arc::clone(self) as Arc<dyn Subscription>)
    }

    fn request_upstream(&self, n: u64) {
        let upstream = self.upstream.lock().clone();
        if let Some(upstream) = upstream {
            upstream.request(n);
        }
    }

    fn cancel_upstream(&self) {
        let upstream = self.upstream.lock().take();
        if let Some(upstream) = upstream {
            upstream.cancel();
        }
    }

    fn terminate(&self, signal: Signal<T>) {
        self.buffer.lock().terminal.get_or_insert(signal);
        self.drain();
    }

    fn drain(&self) {
        self.wip.run(|| self.deliver());
    }

    fn next_ready(&self) -> Ready<T> {
        let mut buffer = self.buffer.lock();
        if buffer.items.is_empty() {
            return buffer.terminal.take().map_or(Ready::Wait, Ready::Terminal);
        }
        if self.demand.outstanding() == 0 {
            return Ready::Wait;
        }
        let Some(item) = buffer.items.pop_front() else {
            return Ready::Wait;
        };
        buffer.delivered_since_refill += 1;
        let refill = buffer.delivered_since_refill >= self.refill;
        if refill {
            buffer.delivered_since_refill = 0;
        }
        Ready::Item { item, refill }
    }

    fn deliver(&self) {
        let mut slot = self.downstream.lock();
        loop {
            if self.cancelled.load(Ordering::Acquire) {
                slot.take();
                self.buffer.lock().items.clear();
                return;
            }
            let Some(downstream) = slot.as_mut() else {
                return;
            };

            if let Some(error) = self.illegal_request.lock().take() {
                self.buffer.lock().items.clear();
                self.demand.clear();
                downstream.on_error(error);
                slot.take();
                return;
            }

            match self.next_ready() {
                Ready::Wait => return,
                Ready::Terminal(signal) => {
                    self.demand.clear();
                    downstream.on_signal(signal);
                    slot.take();
                    return;
                }
                Ready::Item { item, refill } => {
                    self.demand.try_consume();
                    downstream.on_next(item);
                    if refill {
                        self.request_upstream(self.refill);
                    }
                }
            }
        }
    }
}

impl<T: Send + 'static> Subscription for LimitRateInner<T> {
    fn request(&self, n: u64) {
        if let Err(error) = self.demand.grant(n) {
            self.illegal_request.lock().get_or_insert(error);
            self.cancel_upstream();
        }
        self.drain();
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.cancel_upstream();
        self.drain();
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

struct LimitRateUpstream<T> {
    inner: Arc<LimitRateInner<T>>,
}

impl<T: Send + 'static> Subscriber<T> for LimitRateUpstream<T> {
    fn on_subscribe(&mut self, subscription: SubscriptionHandle) {
        let inner = &self.inner;
        *inner.upstream.lock() = Some(subscription);
        if let Some(downstream) = inner.downstream.lock().as_mut() {
            downstream.on_subscribe(inner.handle());
        }
        if !inner.cancelled.load(Ordering::Acquire) {
            inner.request_upstream(inner.prefetch);
        }
        inner.wip.resume(|| inner.deliver());
    }

    fn on_next(&mut self, item: T) {
        self.inner.buffer.lock().items.push_back(item);
        self.inner.drain();
    }

    fn on_error(&mut self, error: RheoError) {
        self.inner.terminate(Signal::Error(error));
    }

    fn on_complete(&mut self) {
        self.inner.terminate(Signal::Complete);
    }
}
