// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Prelude re-exporting the publisher trait, every source, operator extension trait and
//! subscriber kind.
//!
//! ```
//! use rheo_publisher::prelude::*;
//!
//! let doubled = range(1, 3).map(|v| v * 2).take(2);
//! # let _ = doubled;
//! ```

pub use crate::connectable::{Activation, ConnectablePublisher, PublishExt};
pub use crate::operators::{
    DelayElementsExt, LimitRateExt, LogExt, MapExt, TakeExt,
};
pub use crate::publisher::{BoxPublisher, Publisher};
pub use crate::source::{empty, error, from_iter, interval, just, range};
pub use crate::subscriber::{HookSubscriber, LambdaSubscriber, SubscriberHooks, Termination};
