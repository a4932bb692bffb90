// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test utilities for rheo publishers.
//!
//! Designed for use in development and tests only.
//!
//! - [`StepVerifier`]: scripted, optionally virtual-time verification of a publisher
//! - [`recorder`]: a subscriber that records signals and checks their lifecycle
//! - [`spy_requests`]: a pass-through publisher logging upstream demand
//! - [`helpers`]: assertion helpers such as [`assert_no_element_emitted`]
//! - [`test_data`]: fixtures

pub mod helpers;
pub mod recorder;
pub mod spy;
pub mod step_verifier;
pub mod test_data;

pub use helpers::{assert_no_element_emitted, assert_nothing_pending, collect_signals, record};
pub use recorder::{recorder, Recorded, Recording, RecordingSubscriber};
pub use spy::{spy_requests, RequestLog, RequestSpy};
pub use step_verifier::{StepVerifier, StepVerifierOptions, VerifyError};
