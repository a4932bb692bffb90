// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Schedulers for time-based rheo publishers.
//!
//! Schedulers are always passed explicitly to the publishers that need one. There is no global
//! default, so every test owns an isolated clock.
//!
//! - [`VirtualScheduler`]: manually advanced clock, no sleeping
//! - [`TokioScheduler`] (`runtime-tokio`): real timers on a tokio runtime

pub mod impls;
pub mod scheduler;

#[cfg(feature = "runtime-tokio")]
pub use impls::tokio::TokioScheduler;
pub use impls::virtual_time::VirtualScheduler;
pub use scheduler::{Action, PeriodicAction, ScheduledTask, Scheduler, SchedulerRef};
