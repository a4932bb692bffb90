// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use rheo_core::ErrorKind;
use rheo_runtime::{Scheduler, TokioScheduler};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::advance;

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[test]
fn test_try_current_outside_runtime_fails() {
    // Act
    let result = TokioScheduler::try_current();

    // Assert
    assert_eq!(result.unwrap_err().kind(), ErrorKind::Runtime);
}

#[tokio::test(start_paused = true)]
async fn test_schedule_fires_after_delay() -> anyhow::Result<()> {
    // Arrange
    let scheduler = TokioScheduler::try_current()?;
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);

    // Act
    let _task = scheduler.schedule(
        Duration::from_millis(100),
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );
    settle().await;

    // Assert
    advance(Duration::from_millis(99)).await;
    settle().await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    advance(Duration::from_millis(1)).await;
    settle().await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_schedule_never_fires() -> anyhow::Result<()> {
    // Arrange
    let scheduler = TokioScheduler::try_current()?;
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    let task = scheduler.schedule(
        Duration::from_millis(100),
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );

    // Act
    task.cancel();
    advance(Duration::from_millis(500)).await;
    settle().await;

    // Assert
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_periodic_schedule_ticks_each_period() -> anyhow::Result<()> {
    // Arrange
    let scheduler = TokioScheduler::try_current()?;
    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ticks);
    let task = scheduler.schedule_periodic(
        Duration::from_millis(50),
        Duration::from_millis(50),
        Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );
    settle().await;

    // Act & Assert
    for expected in 1..=3 {
        advance(Duration::from_millis(50)).await;
        settle().await;
        assert_eq!(ticks.load(Ordering::SeqCst), expected);
    }

    task.cancel();
    advance(Duration::from_millis(500)).await;
    settle().await;
    assert_eq!(ticks.load(Ordering::SeqCst), 3);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_now_follows_tokio_clock() -> anyhow::Result<()> {
    // Arrange
    let scheduler = TokioScheduler::try_current()?;

    // Act
    advance(Duration::from_secs(3)).await;

    // Assert
    assert!(scheduler.now() >= Duration::from_secs(3));

    Ok(())
}
