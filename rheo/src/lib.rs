// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! # Rheo
//!
//! Pull-based reactive publishers: nothing flows until a subscriber asks for it.
//!
//! ## Overview
//!
//! - A [`Publisher`] describes a sequence. Every subscription is an independent execution.
//! - A [`Subscriber`] receives `on_subscribe`, then items, then at most one terminal signal.
//! - Demand is explicit: the subscriber calls [`SubscriptionHandle::request`] and the publisher
//!   never emits more than was requested. A request of `0` is answered with
//!   [`RheoError::IllegalDemand`].
//! - Time-based publishers take a [`SchedulerRef`]. Production code passes a
//!   [`TokioScheduler`]; tests pass a [`VirtualScheduler`] and move its clock by hand.
//!
//! ## Crates
//!
//! - `rheo-core`: subscriber/subscription contract, demand accounting, errors
//! - `rheo-runtime`: schedulers
//! - `rheo-publisher`: sources, operators, subscribers and the multicast hub
//! - `rheo-test-utils` (dev only): step verifier and recording subscribers
//!
//! ## Quick Start
//!
//! ```
//! use rheo::prelude::*;
//! use std::sync::{Arc, Mutex};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//!
//! just(["William", "Sabrina", "Mariah"])
//!     .log()
//!     .map(str::len)
//!     .subscribe_with(move |len| sink.lock().unwrap().push(len));
//!
//! assert_eq!(*seen.lock().unwrap(), vec![7, 7, 6]);
//! ```
//!
//! ## Virtual time
//!
//! ```
//! use rheo::prelude::*;
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//!
//! let clock = Arc::new(VirtualScheduler::new());
//! let ticks = Arc::new(Mutex::new(Vec::new()));
//! let sink = ticks.clone();
//!
//! interval(Duration::from_secs(86_400), clock.clone())
//!     .take(2)
//!     .subscribe_with(move |tick| sink.lock().unwrap().push(tick));
//!
//! clock.advance(Duration::from_secs(2 * 86_400));
//! assert_eq!(*ticks.lock().unwrap(), vec![0, 1]);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub use rheo_core::{
    BoxSubscriber, Demand, ErrorKind, RheoError, Signal, Subscriber, Subscription,
    SubscriptionHandle, SubscriptionId, UNBOUNDED,
};
pub use rheo_publisher::{
    connectable, operators, source, subscriber, Activation, BoxPublisher, ConnectablePublisher,
    Publisher,
};
#[cfg(feature = "runtime-tokio")]
pub use rheo_runtime::TokioScheduler;
pub use rheo_runtime::{ScheduledTask, Scheduler, SchedulerRef, VirtualScheduler};

/// Prelude module for convenient imports
pub mod prelude {
    pub use rheo_core::{RheoError, Subscriber, SubscriptionHandle, UNBOUNDED};
    pub use rheo_publisher::prelude::*;
    #[cfg(feature = "runtime-tokio")]
    pub use rheo_runtime::TokioScheduler;
    pub use rheo_runtime::{Scheduler, SchedulerRef, VirtualScheduler};
}
