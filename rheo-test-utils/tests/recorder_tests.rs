// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use rheo_core::{RheoError, Signal, Subscriber, SubscriptionHandle, UNBOUNDED};
use rheo_publisher::prelude::*;
use rheo_test_utils::{
    assert_no_element_emitted, collect_signals, record, recorder, spy_requests, Recorded,
};

#[test]
fn test_recorder_requests_initial_demand() {
    // Arrange
    let publisher = range(1, 5);

    // Act
    let mut recording = record(&publisher, 2);

    // Assert
    assert_eq!(recording.values(), vec![1, 2]);
}

#[test]
fn test_recording_request_pulls_more() {
    // Arrange
    let mut recording = record(&range(1, 3), 0);
    assert!(recording.values().is_empty());

    // Act
    recording.request(UNBOUNDED);

    // Assert
    let signals = recording.signals();
    assert_eq!(signals.len(), 4);
    assert!(matches!(signals[3], Signal::Complete));
}

#[test]
fn test_collect_signals_includes_terminal() {
    // Arrange
    let publisher = error::<i64>(RheoError::stream_error("boom"));

    // Act
    let signals = collect_signals(&publisher);

    // Assert
    assert_eq!(signals.len(), 1);
    assert!(matches!(signals[0], Signal::Error(_)));
}

#[test]
fn test_recorder_flags_signals_after_terminal() {
    // Arrange
    let (mut subscriber, mut recording) = recorder::<i64>(0);

    // Act
    subscriber.on_subscribe(SubscriptionHandle::cancelled());
    subscriber.on_complete();
    subscriber.on_next(1);

    // Assert
    let events = recording.drain();
    assert_eq!(events.len(), 3);
    assert!(matches!(events[2], Recorded::Violation(_)));
}

#[test]
fn test_recorder_flags_signal_before_subscribe() {
    // Arrange
    let (mut subscriber, mut recording) = recorder::<i64>(0);

    // Act
    subscriber.on_next(1);

    // Assert
    assert!(matches!(recording.try_next(), Some(Recorded::Violation(_))));
}

#[tokio::test(start_paused = true)]
async fn test_assert_no_element_emitted_without_demand() -> anyhow::Result<()> {
    // Arrange
    let mut recording = record(&range(1, 3), 0);
    assert!(matches!(
        recording.try_next(),
        Some(Recorded::Signal(Signal::Subscribe(_)))
    ));

    // Act & Assert
    assert_no_element_emitted(&mut recording, 100).await;
    Ok(())
}

#[test]
fn test_spy_records_upstream_requests_and_cancel() {
    // Arrange
    let (spy, log) = spy_requests(range(1, 10));
    let mut recording = record(&spy, 2);

    // Act
    recording.request(3);
    recording.cancel();

    // Assert
    assert_eq!(log.requests(), vec![2, 3]);
    assert_eq!(log.total_requested(), 5);
    assert_eq!(log.cancels(), 1);
    assert_eq!(recording.values(), vec![1, 2, 3, 4, 5]);
}
