// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Multicast hub.
//!
//! [`publish`](PublishExt::publish) turns a publisher into a [`ConnectablePublisher`]: one
//! upstream subscription shared by any number of downstream subscribers.
//!
//! # Activation
//!
//! - **Manual**: the upstream is subscribed on the first [`connect`](ConnectablePublisher::connect).
//! - **Auto(n)**: the upstream is subscribed once `n` downstreams have attached. `n == 0`
//!   connects immediately.
//!
//! # Behavior
//!
//! - Downstreams attaching while connected only see later items; nothing is replayed.
//! - While connected with nobody attached, the upstream is still pulled one item at a time and
//!   its items are dropped.
//! - Downstreams attaching after the upstream terminated receive `on_subscribe` followed by the
//!   recorded terminal signal.
//! - Items and terminal signals fan out in attachment order.
//! - The upstream is asked for no more than the smallest outstanding demand among attached
//!   downstreams. A downstream without demand when an item is relayed misses that item.
//! - A downstream cancelling never affects its siblings.
//!
//! # Example
//!
//! ```
//! use rheo_publisher::prelude::*;
//! use std::sync::{Arc, Mutex};
//!
//! let hub = range(1, 3).publish();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! for _ in 0..2 {
//!     let sink = seen.clone();
//!     hub.subscribe_with(move |v| sink.lock().unwrap().push(v));
//! }
//! assert!(seen.lock().unwrap().is_empty());
//!
//! hub.connect();
//! assert_eq!(*seen.lock().unwrap(), vec![1, 1, 2, 2, 3, 3]);
//! ```

use crate::publisher::Publisher;
use parking_lot::Mutex;
use rheo_core::{
    BoxSubscriber, DemandLedger, RheoError, SerializedEmitter, Signal, Subscriber, Subscription,
    SubscriptionHandle, SubscriptionId, UNBOUNDED,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Extension trait providing [`publish`](Self::publish).
pub trait PublishExt<T>: Publisher<T> + Sized + 'static {
    fn publish(self) -> ConnectablePublisher<T>
    where
        T: Clone + Send + 'static,
    {
        ConnectablePublisher::new(Box::new(self))
    }
}

impl<T, P: Publisher<T> + 'static> PublishExt<T> for P {}

/// When the hub subscribes to its upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Manual,
    Auto(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Connected,
    Terminated,
}

struct HubState<T> {
    phase: Phase,
    activation: Activation,
    attached: usize,
    downstreams: Vec<Arc<Downstream<T>>>,
    terminal: Option<Signal<T>>,
    connection: Option<Arc<Connection<T>>>,
    upstream: Option<SubscriptionHandle>,
    /// Upstream demand requested and not yet fulfilled.
    requested: u64,
}

struct HubInner<T> {
    source: Box<dyn Publisher<T>>,
    ledger: DemandLedger,
    state: Mutex<HubState<T>>,
}

/// A publisher sharing one upstream subscription among its subscribers.
pub struct ConnectablePublisher<T> {
    inner: Arc<HubInner<T>>,
}

impl<T> Clone for ConnectablePublisher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> ConnectablePublisher<T> {
    fn new(source: Box<dyn Publisher<T>>) -> Self {
        Self {
            inner: Arc::new(HubInner {
                source,
                ledger: DemandLedger::new(),
                state: Mutex::new(HubState {
                    phase: Phase::Idle,
                    activation: Activation::Manual,
                    attached: 0,
                    downstreams: Vec::new(),
                    terminal: None,
                    connection: None,
                    upstream: None,
                    requested: 0,
                }),
            }),
        }
    }

    /// Subscribes to the upstream once `n` subscribers have attached, counting those already
    /// attached. `auto_connect(0)` connects right away.
    #[must_use]
    pub fn auto_connect(self, n: usize) -> Self {
        let connect_now = {
            let mut state = self.inner.state.lock();
            state.activation = Activation::Auto(n);
            state.phase == Phase::Idle && state.attached >= n
        };
        if connect_now {
            self.connect();
        }
        self
    }

    /// Subscribes the hub to its upstream. Idempotent while connected.
    ///
    /// Returns the connection handle: cancelling it disconnects the upstream without signalling
    /// the downstreams, and a later `connect` subscribes the upstream again.
    pub fn connect(&self) -> SubscriptionHandle {
        HubInner::connect(&self.inner)
    }

    #[must_use]
    pub fn activation(&self) -> Activation {
        self.inner.state.lock().activation
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.state.lock().phase == Phase::Connected
    }

    /// Number of downstreams currently receiving items.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.state.lock().downstreams.len()
    }
}

impl<T: Clone + Send + 'static> Publisher<T> for ConnectablePublisher<T> {
    fn subscribe(&self, subscriber: BoxSubscriber<T>) -> SubscriptionHandle {
        HubInner::attach(&self.inner, subscriber)
    }
}

impl<T: Clone + Send + 'static> HubInner<T> {
    fn connect(this: &Arc<Self>) -> SubscriptionHandle {
        let connection = {
            let mut state = this.state.lock();
            if let Some(connection) = &state.connection {
                return Connection::handle(connection);
            }
            if state.phase == Phase::Terminated {
                return SubscriptionHandle::cancelled();
            }
            let connection = Arc::new(Connection {
                id: SubscriptionId::next(),
                hub: Arc::downgrade(this),
                cancelled: AtomicBool::new(false),
            });
            state.connection = Some(Arc::clone(&connection));
            state.phase = Phase::Connected;
            state.requested = 0;
            connection
        };

        this.source.subscribe(Box::new(HubUpstream {
            hub: Arc::downgrade(this),
            connection: connection.id,
        }));
        Connection::handle(&connection)
    }

    fn attach(this: &Arc<Self>, subscriber: BoxSubscriber<T>) -> SubscriptionHandle {
        let id = SubscriptionId::next();
        let downstream = Arc::new(Downstream {
            id,
            emitter: SerializedEmitter::new(subscriber),
            hub: Arc::downgrade(this),
        });
        let handle = SubscriptionHandle::new(id, Arc::clone(&downstream) as Arc<dyn Subscription>);

        this.ledger.open(id);
        // First signal on a fresh emitter, accepted unconditionally.
        let _ = downstream.emitter.on_subscribe(handle.clone());

        let (replay, connect_now) = {
            let mut state = this.state.lock();
            if let Some(terminal) = &state.terminal {
                (Some(terminal.clone()), false)
            } else if downstream.emitter.is_done() {
                (None, false)
            } else {
                state.downstreams.push(Arc::clone(&downstream));
                state.attached += 1;
                let threshold_reached = matches!(
                    state.activation,
                    Activation::Auto(n) if state.attached >= n
                );
                (None, threshold_reached && state.phase == Phase::Idle)
            }
        };

        if let Some(terminal) = replay {
            this.ledger.clear(id);
            // Lifecycle violations are logged by the emitter.
            let _ = downstream.emitter.emit(terminal);
            return handle;
        }

        if connect_now {
            Self::connect(this);
        } else {
            this.refresh_upstream_demand();
        }
        handle
    }

    fn detach(&self, id: SubscriptionId) {
        self.state.lock().downstreams.retain(|d| d.id != id);
        self.ledger.clear(id);
        self.refresh_upstream_demand();
    }

    /// Tops the upstream demand up to the smallest outstanding demand among downstreams, or to
    /// a single item while nobody is attached.
    fn refresh_upstream_demand(&self) {
        let request = {
            let mut state = self.state.lock();
            if state.phase != Phase::Connected {
                return;
            }
            let Some(upstream) = state.upstream.clone() else {
                return;
            };
            let floor = state
                .downstreams
                .iter()
                .map(|d| self.ledger.outstanding(d.id))
                .min()
                .unwrap_or(1);

            let n = if floor == UNBOUNDED {
                (state.requested != UNBOUNDED).then_some(UNBOUNDED)
            } else {
                floor
                    .checked_sub(state.requested)
                    .filter(|missing| *missing > 0)
            };
            let Some(n) = n else {
                return;
            };
            state.requested = state.requested.saturating_add(n);
            (upstream, n)
        };

        let (upstream, n) = request;
        upstream.request(n);
    }

    fn is_current(&self, connection: SubscriptionId) -> bool {
        self.state
            .lock()
            .connection
            .as_ref()
            .is_some_and(|c| c.id == connection)
    }

    fn relay(&self, connection: SubscriptionId, item: T) {
        let targets = {
            let mut state = self.state.lock();
            if state.connection.as_ref().map(|c| c.id) != Some(connection) {
                return;
            }
            if state.requested != UNBOUNDED {
                state.requested = state.requested.saturating_sub(1);
            }
            state.downstreams.clone()
        };

        if targets.is_empty() {
            self.refresh_upstream_demand();
            return;
        }

        for downstream in targets {
            if self.ledger.consume(downstream.id) {
                // Lifecycle violations are logged by the emitter.
                let _ = downstream.emitter.next(item.clone());
            } else {
                warn!(
                    "hub dropped an item for subscriber {}: no outstanding demand",
                    downstream.id
                );
            }
        }
    }

    fn terminate(&self, connection: SubscriptionId, signal: Signal<T>) {
        let targets = {
            let mut state = self.state.lock();
            if state.connection.as_ref().map(|c| c.id) != Some(connection) {
                return;
            }
            state.phase = Phase::Terminated;
            state.terminal = Some(signal.clone());
            state.connection = None;
            state.upstream = None;
            std::mem::take(&mut state.downstreams)
        };

        for downstream in targets {
            self.ledger.clear(downstream.id);
            // Lifecycle violations are logged by the emitter.
            let _ = downstream.emitter.emit(signal.clone());
        }
    }

    fn disconnect(&self, connection: SubscriptionId) {
        let upstream = {
            let mut state = self.state.lock();
            if state.connection.as_ref().map(|c| c.id) != Some(connection) {
                return;
            }
            state.connection = None;
            state.phase = Phase::Idle;
            state.requested = 0;
            state.upstream.take()
        };
        if let Some(upstream) = upstream {
            upstream.cancel();
        }
    }
}

/// The hub's subscription to its upstream, one per connection.
struct HubUpstream<T> {
    hub: Weak<HubInner<T>>,
    connection: SubscriptionId,
}

impl<T: Clone + Send + 'static> Subscriber<T> for HubUpstream<T> {
    fn on_subscribe(&mut self, subscription: SubscriptionHandle) {
        let Some(hub) = self.hub.upgrade() else {
            subscription.cancel();
            return;
        };
        {
            let mut state = hub.state.lock();
            if !state.connection.as_ref().is_some_and(|c| c.id == self.connection) {
                drop(state);
                subscription.cancel();
                return;
            }
            state.upstream = Some(subscription);
        }
        hub.refresh_upstream_demand();
    }

    fn on_next(&mut self, item: T) {
        if let Some(hub) = self.hub.upgrade() {
            hub.relay(self.connection, item);
        }
    }

    fn on_error(&mut self, error: RheoError) {
        if let Some(hub) = self.hub.upgrade() {
            hub.terminate(self.connection, Signal::Error(error));
        }
    }

    fn on_complete(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.terminate(self.connection, Signal::Complete);
        }
    }
}

/// One attached subscriber.
struct Downstream<T> {
    id: SubscriptionId,
    emitter: SerializedEmitter<T>,
    hub: Weak<HubInner<T>>,
}

impl<T: Clone + Send + 'static> Subscription for Downstream<T> {
    fn request(&self, n: u64) {
        let Some(hub) = self.hub.upgrade() else {
            return;
        };
        match hub.ledger.grant(self.id, n) {
            Ok(_) => hub.refresh_upstream_demand(),
            Err(error) => {
                hub.detach(self.id);
                // Lifecycle violations are logged by the emitter.
                let _ = self.emitter.error(error);
            }
        }
    }

    fn cancel(&self) {
        self.emitter.cancel();
        if let Some(hub) = self.hub.upgrade() {
            hub.detach(self.id);
        }
    }

    fn is_cancelled(&self) -> bool {
        self.emitter.is_cancelled()
    }
}

/// Handle side of a connection. Cancelling it disconnects the upstream.
struct Connection<T> {
    id: SubscriptionId,
    hub: Weak<HubInner<T>>,
    cancelled: AtomicBool,
}

impl<T: Clone + Send + 'static> Connection<T> {
    fn handle(this: &Arc<Self>) -> SubscriptionHandle {
        SubscriptionHandle::new(this.id, Arc::clone(this) as Arc<dyn Subscription>)
    }
}

impl<T: Clone + Send + 'static> Subscription for Connection<T> {
    fn request(&self, _n: u64) {}

    fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(hub) = self.hub.upgrade() {
            hub.disconnect(self.id);
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
            || self.hub.upgrade().is_some_and(|hub| !hub.is_current(self.id))
    }
}
