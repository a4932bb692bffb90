// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Ready-made [`Subscriber`](rheo_core::Subscriber) implementations.
//!
//! - [`LambdaSubscriber`]: closures per signal plus an initial request
//! - [`HookSubscriber`]: a [`SubscriberHooks`] implementation driven with the subscription at hand

mod hook;
mod lambda;

pub use hook::{HookSubscriber, SubscriberHooks, Termination};
pub use lambda::LambdaSubscriber;
