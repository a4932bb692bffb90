// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use rheo_core::{ErrorKind, RheoError, Signal, UNBOUNDED};
use rheo_publisher::prelude::*;
use rheo_runtime::{SchedulerRef, VirtualScheduler};
use rheo_test_utils::{record, spy_requests, StepVerifier};
use std::sync::Arc;
use std::time::Duration;

const DELAY: Duration = Duration::from_millis(100);

fn delayed_hub(count: u64) -> (Arc<VirtualScheduler>, ConnectablePublisher<i64>) {
    let scheduler = Arc::new(VirtualScheduler::new());
    let hub = range(1, count)
        .delay_elements(DELAY, Arc::clone(&scheduler) as SchedulerRef)
        .publish();
    (scheduler, hub)
}

#[test]
fn test_manual_hub_waits_for_connect() {
    // Arrange
    let hub = range(1, 3).publish();
    let mut first = record(&hub, UNBOUNDED);
    let mut second = record(&hub, UNBOUNDED);
    assert!(first.signals().is_empty());
    assert_eq!(hub.activation(), Activation::Manual);

    // Act
    hub.connect();

    // Assert
    let expected = vec![
        Signal::Next(1),
        Signal::Next(2),
        Signal::Next(3),
        Signal::Complete,
    ];
    assert_eq!(first.signals(), expected);
    assert_eq!(second.signals(), expected);
}

#[test]
fn test_connect_is_idempotent_while_connected() {
    // Arrange
    let (_scheduler, hub) = delayed_hub(3);

    // Act
    let first = hub.connect();
    let second = hub.connect();

    // Assert
    assert!(hub.is_connected());
    assert_eq!(first.id(), second.id());
}

#[test]
fn test_auto_connect_subscribes_upstream_at_threshold() {
    // Arrange
    let hub = range(1, 2).publish().auto_connect(2);
    let mut first = record(&hub, UNBOUNDED);
    assert!(!hub.is_connected());
    assert!(first.signals().is_empty());

    // Act
    let mut second = record(&hub, UNBOUNDED);

    // Assert
    let expected = vec![Signal::Next(1), Signal::Next(2), Signal::Complete];
    assert_eq!(first.signals(), expected);
    assert_eq!(second.signals(), expected);
    assert_eq!(hub.activation(), Activation::Auto(2));
}

#[test]
fn test_auto_connect_zero_connects_immediately() {
    // Arrange
    let (scheduler, hub) = delayed_hub(3);
    let hub = hub.auto_connect(0);
    assert!(hub.is_connected());
    scheduler.advance(DELAY);

    // Act
    let mut late = record(&hub, UNBOUNDED);
    scheduler.advance(DELAY * 2);

    // Assert
    assert_eq!(late.signals(), vec![Signal::Next(2), Signal::Next(3), Signal::Complete]);
}

#[test]
fn test_connected_hub_without_subscribers_keeps_pulling() {
    // Arrange
    let (scheduler, hub) = delayed_hub(10);
    hub.connect();
    scheduler.advance(DELAY * 3);

    // Act
    let mut late = record(&hub, UNBOUNDED);
    scheduler.advance(DELAY);

    // Assert
    assert_eq!(late.values(), vec![4]);
    assert!(hub.is_connected());
}

#[test]
fn test_synchronous_source_drains_when_connected_alone() {
    // Arrange
    let (spy, log) = spy_requests(range(1, 3));
    let hub = spy.publish();

    // Act
    hub.connect();
    let mut late = record(&hub, UNBOUNDED);

    // Assert
    assert_eq!(late.signals(), vec![Signal::Complete]);
    assert_eq!(log.requests(), vec![1, 1, 1, 1]);
    assert!(!hub.is_connected());
}

#[test]
fn test_upstream_demand_follows_slowest_subscriber() {
    // Arrange
    let (spy, log) = spy_requests(range(1, 10));
    let hub = spy.publish();
    let mut slow = record(&hub, 2);
    let mut fast = record(&hub, UNBOUNDED);

    // Act
    hub.connect();
    let slow_first = slow.values();
    slow.request(1);

    // Assert
    assert_eq!(slow_first, vec![1, 2]);
    assert_eq!(slow.values(), vec![3]);
    assert_eq!(fast.values(), vec![1, 2, 3]);
    assert_eq!(log.requests(), vec![2, 1]);
}

#[test]
fn test_late_subscriber_sees_only_later_items() {
    // Arrange
    let (scheduler, hub) = delayed_hub(3);
    let mut early = record(&hub, UNBOUNDED);
    hub.connect();
    scheduler.advance(DELAY);

    // Act
    let mut late = record(&hub, UNBOUNDED);
    scheduler.advance(DELAY * 2);

    // Assert
    assert_eq!(early.values(), vec![1, 2, 3]);
    assert_eq!(
        late.signals(),
        vec![Signal::Next(2), Signal::Next(3), Signal::Complete]
    );
}

#[test]
fn test_subscriber_without_demand_misses_items() {
    // Arrange
    let (scheduler, hub) = delayed_hub(3);
    let mut eager = record(&hub, UNBOUNDED);
    hub.connect();
    scheduler.advance(DELAY);
    let mut idle = record(&hub, 0);

    // Act
    scheduler.advance(DELAY);
    idle.request(1);
    scheduler.advance(DELAY);

    // Assert
    assert_eq!(eager.values(), vec![1, 2, 3]);
    assert_eq!(idle.signals(), vec![Signal::Next(3), Signal::Complete]);
}

#[test]
fn test_cancelling_one_subscriber_leaves_siblings_running() {
    // Arrange
    let (scheduler, hub) = delayed_hub(3);
    let mut leaving = record(&hub, UNBOUNDED);
    let mut staying = record(&hub, UNBOUNDED);
    hub.connect();
    scheduler.advance(DELAY);

    // Act
    leaving.cancel();
    scheduler.advance(DELAY * 2);

    // Assert
    assert_eq!(leaving.values(), vec![1]);
    assert_eq!(staying.values(), vec![1, 2, 3]);
    assert_eq!(hub.subscriber_count(), 0);
}

#[test]
fn test_terminal_signal_is_replayed_to_late_subscribers() {
    // Arrange
    let hub = error::<i64>(RheoError::stream_error("upstream failed")).publish();
    let mut early = record(&hub, UNBOUNDED);
    hub.connect();

    // Act
    let mut late = record(&hub, 0);

    // Assert
    for recording in [&mut early, &mut late] {
        assert!(matches!(
            recording.signals().as_slice(),
            [Signal::Error(e)] if e.kind() == ErrorKind::StreamProcessing
        ));
    }
    assert!(!hub.is_connected());
    assert!(hub.connect().is_cancelled());
}

#[test]
fn test_cancelling_connection_disconnects_and_allows_reconnect() {
    // Arrange
    let scheduler = Arc::new(VirtualScheduler::new());
    let hub = interval(DELAY, Arc::clone(&scheduler) as SchedulerRef).publish();
    let mut recording = record(&hub, UNBOUNDED);
    let connection = hub.connect();
    scheduler.advance(DELAY);

    // Act
    connection.cancel();
    scheduler.advance(DELAY * 2);
    let while_disconnected = recording.values();
    hub.connect();
    scheduler.advance(DELAY);

    // Assert
    assert!(connection.is_cancelled());
    assert!(while_disconnected.contains(&0));
    assert_eq!(while_disconnected.len(), 1);
    assert_eq!(recording.values(), vec![0]);
    assert!(hub.is_connected());
}

#[test]
fn test_illegal_request_fails_only_that_subscriber() {
    // Arrange
    let (scheduler, hub) = delayed_hub(2);
    let mut faulty = record(&hub, 0);
    let mut healthy = record(&hub, UNBOUNDED);
    hub.connect();

    // Act
    faulty.request(0);
    scheduler.advance(DELAY * 2);

    // Assert
    assert!(matches!(
        faulty.signals().as_slice(),
        [Signal::Error(e)] if e.kind() == ErrorKind::IllegalDemand
    ));
    assert_eq!(
        healthy.signals(),
        vec![Signal::Next(1), Signal::Next(2), Signal::Complete]
    );
}

#[tokio::test]
async fn test_connect_from_verifier_script() -> anyhow::Result<()> {
    // Arrange
    let (scheduler, hub) = delayed_hub(10);
    let connector = hub.clone();

    // Act & Assert
    StepVerifier::with_virtual_scheduler(scheduler, hub)
        .expect_subscription()
        .expect_no_event(DELAY * 5)
        .then(move || {
            connector.connect();
        })
        .then_consume_while(|v| *v <= 5)
        .expect_next(6..=10)
        .verify_complete()
        .await?;
    Ok(())
}
