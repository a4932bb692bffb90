// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::recorder::{recorder, Recorded, Recording};
use core::fmt::Debug;
use rheo_core::{Signal, UNBOUNDED};
use rheo_publisher::Publisher;
use std::time::Duration;

/// Subscribes a recorder requesting `initial_request`, returning the recording.
pub fn record<T, P>(publisher: &P, initial_request: u64) -> Recording<T>
where
    T: Send + 'static,
    P: Publisher<T>,
{
    let (subscriber, recording) = recorder(initial_request);
    publisher.subscribe(Box::new(subscriber));
    recording
}

/// Subscribes with unbounded demand and returns every signal after `onSubscribe` delivered
/// synchronously.
pub fn collect_signals<T, P>(publisher: &P) -> Vec<Signal<T>>
where
    T: Send + 'static,
    P: Publisher<T>,
{
    record(publisher, UNBOUNDED).signals()
}

/// Fails the test if the recording receives anything within `timeout_ms`.
///
/// # Panics
///
/// Panics when an event arrives.
pub async fn assert_no_element_emitted<T: Debug>(recording: &mut Recording<T>, timeout_ms: u64) {
    if let Some(event) = recording
        .next_within(Duration::from_millis(timeout_ms))
        .await
    {
        match event {
            Recorded::Signal(signal) => panic!("Unexpected signal emitted: {signal:?}"),
            Recorded::Violation(violation) => panic!("Unexpected protocol violation: {violation}"),
        }
    }
}

/// Asserts that nothing is available in the recording right now.
///
/// # Panics
///
/// Panics when an event is available.
pub fn assert_nothing_pending<T: Debug>(recording: &mut Recording<T>) {
    if let Some(event) = recording.try_next() {
        panic!("Unexpected event pending: {event:?}");
    }
}
