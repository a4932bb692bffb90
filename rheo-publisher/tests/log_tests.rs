// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use rheo_core::{ErrorKind, Signal};
use rheo_publisher::operators::DEFAULT_CATEGORY;
use rheo_publisher::prelude::*;
use rheo_test_utils::test_data::names;
use rheo_test_utils::{record, spy_requests, StepVerifier};

#[tokio::test]
async fn test_log_passes_signals_through_unchanged() -> anyhow::Result<()> {
    // Arrange
    let publisher = just(names()).log();

    // Act & Assert
    StepVerifier::create(publisher)
        .expect_next(names())
        .verify_complete()
        .await?;
    Ok(())
}

#[test]
fn test_log_uses_default_category_unless_named() {
    // Arrange
    let default = range(1, 1).log();
    let named = range(1, 1).log_with("orders");

    // Act & Assert
    assert_eq!(default.category(), DEFAULT_CATEGORY);
    assert_eq!(named.category(), "orders");
}

#[test]
fn test_log_forwards_requests_and_cancel() {
    // Arrange
    let (spy, log) = spy_requests(range(1, 10));
    let mut recording = record(&spy.log(), 2);

    // Act
    recording.request(1);
    recording.cancel();

    // Assert
    assert_eq!(log.requests(), vec![2, 1]);
    assert_eq!(log.cancels(), 1);
    assert_eq!(recording.values(), vec![1, 2, 3]);
}

#[test]
fn test_log_passes_illegal_demand_through() {
    // Arrange
    let mut recording = record(&range(1, 3).log(), 0);

    // Act
    recording.request(0);

    // Assert
    match recording.signals().as_slice() {
        [Signal::Error(error)] => assert_eq!(error.kind(), ErrorKind::IllegalDemand),
        other => panic!("expected a single error, got {other:?}"),
    }
}
