// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Demand accounting for backpressure.
//!
//! A [`Demand`] is one ledger entry: the number of items a subscriber has asked for and not yet
//! received. A [`DemandLedger`] keys many entries by [`SubscriptionId`], which is what a
//! multicast hub uses to track each of its downstreams.
//!
//! Demand saturates at [`UNBOUNDED`]. Once a subscriber has asked for unbounded demand, emissions
//! no longer decrement the counter.
//!
//! ```
//! use rheo_core::demand::{Demand, UNBOUNDED};
//!
//! let demand = Demand::new();
//! demand.grant(2).unwrap();
//! assert!(demand.try_consume());
//! assert!(demand.try_consume());
//! assert!(!demand.try_consume());
//!
//! demand.grant(UNBOUNDED).unwrap();
//! assert!(demand.try_consume());
//! assert_eq!(demand.outstanding(), UNBOUNDED);
//! ```

use crate::subscription::SubscriptionId;
use crate::{Result, RheoError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Sentinel meaning "no limit on the number of items".
pub const UNBOUNDED: u64 = u64::MAX;

/// A single outstanding-demand counter.
#[derive(Debug, Default)]
pub struct Demand {
    outstanding: AtomicU64,
    cleared: AtomicBool,
}

impl Demand {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `n` to the outstanding demand, saturating at [`UNBOUNDED`].
    ///
    /// Returns the outstanding demand after the grant. A cleared entry accepts the call but
    /// stays at zero.
    ///
    /// # Errors
    ///
    /// Returns [`RheoError::IllegalDemand`] when `n == 0`; the counter is left untouched.
    pub fn grant(&self, n: u64) -> Result<u64> {
        if n == 0 {
            return Err(RheoError::illegal_demand(n));
        }
        if self.is_cleared() {
            return Ok(0);
        }

        let mut current = self.outstanding.load(Ordering::Acquire);
        loop {
            let next = current.saturating_add(n);
            match self.outstanding.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(next),
                Err(actual) => current = actual,
            }
        }
    }

    /// Takes one unit of demand. Returns `false`, without side effects, when none is left.
    pub fn try_consume(&self) -> bool {
        let mut current = self.outstanding.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return false;
            }
            if current == UNBOUNDED {
                return true;
            }
            match self.outstanding.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Gives back a unit taken by [`try_consume`](Self::try_consume) that ended up unused.
    ///
    /// No effect on cleared or unbounded entries.
    pub fn refund(&self) {
        if self.is_cleared() {
            return;
        }
        let _ = self
            .outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != UNBOUNDED).then(|| current + 1)
            });
    }

    #[must_use]
    pub fn outstanding(&self) -> u64 {
        self.outstanding.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.outstanding() == UNBOUNDED
    }

    /// Drops all outstanding demand and refuses any later grant.
    pub fn clear(&self) {
        self.cleared.store(true, Ordering::Release);
        self.outstanding.store(0, Ordering::Release);
    }

    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.cleared.load(Ordering::Acquire)
    }
}

/// Demand entries keyed by subscription.
///
/// The map lock is only held to look an entry up; counter updates happen on the entry itself,
/// so concurrent grants for one subscription never lose updates.
#[derive(Debug, Default)]
pub struct DemandLedger {
    entries: Mutex<HashMap<SubscriptionId, Arc<Demand>>>,
}

impl DemandLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a zeroed entry for `id`, replacing any previous one.
    pub fn open(&self, id: SubscriptionId) -> Arc<Demand> {
        let demand = Arc::new(Demand::new());
        self.entries.lock().insert(id, Arc::clone(&demand));
        demand
    }

    /// Adds `n` to the entry of `id`. Unknown or cleared ids are ignored and report zero.
    ///
    /// # Errors
    ///
    /// Returns [`RheoError::IllegalDemand`] when `n == 0`.
    pub fn grant(&self, id: SubscriptionId, n: u64) -> Result<u64> {
        if n == 0 {
            return Err(RheoError::illegal_demand(n));
        }
        match self.entry(id) {
            Some(demand) => demand.grant(n),
            None => Ok(0),
        }
    }

    /// Takes one unit of demand from `id`. Returns `false` if none is outstanding.
    pub fn consume(&self, id: SubscriptionId) -> bool {
        self.entry(id).is_some_and(|demand| demand.try_consume())
    }

    #[must_use]
    pub fn outstanding(&self, id: SubscriptionId) -> u64 {
        self.entry(id).map_or(0, |demand| demand.outstanding())
    }

    /// Removes the entry of `id`; later operations on it are no-ops.
    pub fn clear(&self, id: SubscriptionId) {
        if let Some(demand) = self.entries.lock().remove(&id) {
            demand.clear();
        }
    }

    #[must_use]
    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.entries.lock().contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn entry(&self, id: SubscriptionId) -> Option<Arc<Demand>> {
        self.entries.lock().get(&id).cloned()
    }
}
