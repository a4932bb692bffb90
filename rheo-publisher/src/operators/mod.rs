// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Operators, each provided by an extension trait implemented for every [`Publisher`].
//!
//! | Operator | Demand upstream | Notes |
//! |----------|-----------------|-------|
//! | [`map`](MapExt::map) / [`try_map`](MapExt::try_map) | pass-through | failing `try_map` cancels upstream |
//! | [`take`](TakeExt::take) | pass-through | cancels upstream after `n` items |
//! | [`log`](LogExt::log) | pass-through | `info` record per signal |
//! | [`limit_rate`](LimitRateExt::limit_rate) | at most `n` per request | refills at 75% |
//! | [`delay_elements`](DelayElementsExt::delay_elements) | one item at a time | scheduler driven |
//!
//! [`Publisher`]: crate::Publisher

pub mod delay_elements;
pub mod limit_rate;
pub mod log;
pub mod map;
pub mod take;

pub use delay_elements::{DelayElements, DelayElementsExt};
pub use limit_rate::{LimitRate, LimitRateExt};
pub use log::{Log, LogExt, DEFAULT_CATEGORY};
pub use map::{Map, MapExt, TryMap};
pub use take::{Take, TakeExt};
