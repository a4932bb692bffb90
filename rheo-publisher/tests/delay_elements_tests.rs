// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use rheo_core::{ErrorKind, RheoError, Signal};
use rheo_publisher::prelude::*;
use rheo_runtime::{Scheduler, SchedulerRef, VirtualScheduler};
use rheo_test_utils::{record, StepVerifier};
use std::sync::Arc;
use std::time::Duration;

const DELAY: Duration = Duration::from_millis(100);

#[tokio::test]
async fn test_delay_elements_spaces_items_in_virtual_time() -> anyhow::Result<()> {
    // Arrange & Act
    let result = StepVerifier::with_virtual_time(|scheduler| {
        range(1, 3).delay_elements(DELAY, scheduler)
    })
    .expect_subscription()
    .expect_no_event(DELAY)
    .expect_next([1])
    .expect_no_event(DELAY)
    .expect_next([2])
    .expect_no_event(DELAY)
    .expect_next([3])
    .verify_complete()
    .await;

    // Assert
    assert!(result.is_ok(), "{result:?}");
    Ok(())
}

#[test]
fn test_delay_elements_completes_after_last_delayed_item() {
    // Arrange
    let scheduler = Arc::new(VirtualScheduler::new());
    let publisher = range(1, 2).delay_elements(DELAY, Arc::clone(&scheduler) as SchedulerRef);
    let mut recording = record(&publisher, 10);

    // Act
    scheduler.advance(DELAY);
    let after_first = recording.signals();
    scheduler.advance(DELAY);
    let after_second = recording.signals();

    // Assert
    assert_eq!(after_first, vec![Signal::Next(1)]);
    assert_eq!(after_second, vec![Signal::Next(2), Signal::Complete]);
    assert_eq!(scheduler.now(), DELAY * 2);
}

#[test]
fn test_delay_elements_empty_completes_immediately() {
    // Arrange
    let scheduler = Arc::new(VirtualScheduler::new());
    let publisher = empty::<i64>().delay_elements(DELAY, Arc::clone(&scheduler) as SchedulerRef);

    // Act
    let mut recording = record(&publisher, 1);

    // Assert
    assert_eq!(recording.signals(), vec![Signal::Complete]);
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn test_delay_elements_relays_errors_without_delay() {
    // Arrange
    let scheduler = Arc::new(VirtualScheduler::new());
    let publisher = error::<i64>(RheoError::stream_error("upstream failed"))
        .delay_elements(DELAY, Arc::clone(&scheduler) as SchedulerRef);

    // Act
    let signals = record(&publisher, 1).signals();

    // Assert
    assert!(matches!(
        signals.as_slice(),
        [Signal::Error(e)] if e.kind() == ErrorKind::StreamProcessing
    ));
}

#[test]
fn test_delay_elements_waits_for_demand() {
    // Arrange
    let scheduler = Arc::new(VirtualScheduler::new());
    let publisher = range(1, 3).delay_elements(DELAY, Arc::clone(&scheduler) as SchedulerRef);
    let mut recording = record(&publisher, 1);

    // Act
    scheduler.advance(DELAY * 5);
    let before_request = recording.values();
    recording.request(1);
    scheduler.advance(DELAY);
    let after_request = recording.values();

    // Assert
    assert_eq!(before_request, vec![1]);
    assert_eq!(after_request, vec![2]);
}

#[test]
fn test_delay_elements_cancel_discards_pending_timer() {
    // Arrange
    let scheduler = Arc::new(VirtualScheduler::new());
    let publisher = range(1, 3).delay_elements(DELAY, Arc::clone(&scheduler) as SchedulerRef);
    let mut recording = record(&publisher, 3);
    assert_eq!(scheduler.pending(), 1);

    // Act
    recording.cancel();
    scheduler.advance(DELAY * 3);

    // Assert
    assert!(recording.signals().is_empty());
    assert_eq!(scheduler.pending(), 0);
}
