// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Allocates the next identifier.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The demand-control side of a live binding between a publisher and a subscriber.
///
/// Implementations must tolerate concurrent and re-entrant calls: a subscriber typically calls
/// `request` from inside its own `on_next`.
pub trait Subscription: Send + Sync {
    /// Grants permission for `n` more items. `n == 0` is answered with an
    /// [`IllegalDemand`](crate::RheoError::IllegalDemand) error delivered to the subscriber.
    fn request(&self, n: u64);

    /// Stops emission. No signal of any kind reaches the subscriber after cancellation is
    /// observed.
    fn cancel(&self);

    fn is_cancelled(&self) -> bool;
}

/// Cloneable handle to a [`Subscription`], handed to subscribers in `on_subscribe`.
#[derive(Clone)]
pub struct SubscriptionHandle {
    id: SubscriptionId,
    inner: Arc<dyn Subscription>,
}

impl SubscriptionHandle {
    pub fn new(id: SubscriptionId, inner: Arc<dyn Subscription>) -> Self {
        Self { id, inner }
    }

    /// A handle that ignores requests and starts out cancelled.
    ///
    /// Used when a publisher terminates a subscriber before any emission can happen.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(SubscriptionId::next(), Arc::new(CancelledSubscription))
    }

    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn request(&self, n: u64) {
        self.inner.request(n);
    }

    pub fn cancel(&self) {
        self.inner.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

struct CancelledSubscription;

impl Subscription for CancelledSubscription {
    fn request(&self, _n: u64) {}

    fn cancel(&self) {}

    fn is_cancelled(&self) -> bool {
        true
    }
}
