// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Pull-based publishers for rheo.
//!
//! A [`Publisher`] describes a sequence; subscribing to it starts an independent execution that
//! emits nothing until the subscriber requests demand through its
//! [`SubscriptionHandle`](rheo_core::SubscriptionHandle).
//!
//! # Sources
//!
//! - [`just`](source::just), [`from_iter`](source::from_iter), [`range`](source::range),
//!   [`empty`](source::empty), [`error`](source::error): synchronous, finite
//! - [`interval`](source::interval): periodic ticks on a
//!   [`Scheduler`](rheo_runtime::Scheduler), strict about demand
//!
//! # Operators
//!
//! See [`operators`]. Every operator is an extension trait, so `use rheo_publisher::prelude::*`
//! brings all of them into scope.
//!
//! # Multicasting
//!
//! [`publish`](connectable::PublishExt::publish) shares one upstream subscription among many
//! subscribers through a [`ConnectablePublisher`](connectable::ConnectablePublisher).
//!
//! # Example
//!
//! ```
//! use rheo_publisher::prelude::*;
//! use std::sync::{Arc, Mutex};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//!
//! range(1, 5)
//!     .map(|v| v * 10)
//!     .take(3)
//!     .subscribe_with(move |v| sink.lock().unwrap().push(v));
//!
//! assert_eq!(*seen.lock().unwrap(), vec![10, 20, 30]);
//! ```

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]

#[macro_use]
mod logging;

mod subscription;
mod wip;

pub mod connectable;
pub mod operators;
pub mod prelude;
pub mod publisher;
pub mod source;
pub mod subscriber;

pub use connectable::{Activation, ConnectablePublisher, PublishExt};
pub use operators::{DelayElementsExt, LimitRateExt, LogExt, MapExt, TakeExt};
pub use publisher::{BoxPublisher, Publisher};
pub use subscriber::{HookSubscriber, LambdaSubscriber, SubscriberHooks, Termination};
