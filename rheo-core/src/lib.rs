// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Core traits and types for rheo publishers.
//!
//! - [`Subscriber`] / [`Subscription`]: the two halves of the reactive-streams contract
//! - [`Demand`] / [`DemandLedger`]: backpressure accounting
//! - [`SerializedEmitter`]: serialized, lifecycle-checked signal delivery
//! - [`RheoError`]: the error taxonomy every subscriber can observe

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]

#[macro_use]
mod logging;

pub mod cancellation_token;
pub mod demand;
pub mod emitter;
pub mod error;
pub mod signal;
pub mod subscriber;
pub mod subscription;

pub use self::cancellation_token::CancellationToken;
pub use self::demand::{Demand, DemandLedger, UNBOUNDED};
pub use self::emitter::SerializedEmitter;
pub use self::error::{ErrorKind, Result, RheoError};
pub use self::signal::Signal;
pub use self::subscriber::{BoxSubscriber, Subscriber};
pub use self::subscription::{Subscription, SubscriptionHandle, SubscriptionId};
