// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use parking_lot::Mutex;
use rheo_runtime::{Scheduler, VirtualScheduler};
use std::sync::Arc;
use std::time::Duration;

fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Box<dyn FnOnce() + Send>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let make = move |label: &str| -> Box<dyn FnOnce() + Send> {
        let sink = Arc::clone(&sink);
        let label = label.to_string();
        Box::new(move || sink.lock().push(label))
    };
    (log, make)
}

#[test]
fn test_actions_fire_in_fire_time_order() {
    // Arrange
    let scheduler = VirtualScheduler::new();
    let (log, action) = recorder();
    scheduler.schedule(Duration::from_millis(30), action("c")).detach();
    scheduler.schedule(Duration::from_millis(10), action("a")).detach();
    scheduler.schedule(Duration::from_millis(20), action("b")).detach();

    // Act
    scheduler.advance(Duration::from_millis(30));

    // Assert
    assert_eq!(*log.lock(), vec!["a", "b", "c"]);
    assert_eq!(scheduler.now(), Duration::from_millis(30));
}

#[test]
fn test_same_time_actions_fire_in_scheduling_order() {
    // Arrange
    let scheduler = VirtualScheduler::new();
    let (log, action) = recorder();
    for label in ["first", "second", "third"] {
        scheduler.schedule(Duration::from_secs(1), action(label)).detach();
    }

    // Act
    scheduler.advance(Duration::from_secs(1));

    // Assert
    assert_eq!(*log.lock(), vec!["first", "second", "third"]);
}

#[test]
fn test_advance_stops_at_window_end() {
    // Arrange
    let scheduler = VirtualScheduler::new();
    let (log, action) = recorder();
    scheduler.schedule(Duration::from_secs(2), action("late")).detach();

    // Act
    scheduler.advance(Duration::from_millis(1_999));

    // Assert
    assert!(log.lock().is_empty());
    assert_eq!(scheduler.pending(), 1);
    assert_eq!(scheduler.next_due(), Some(Duration::from_secs(2)));

    scheduler.advance(Duration::from_millis(1));
    assert_eq!(*log.lock(), vec!["late"]);
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn test_cancelled_task_does_not_fire() {
    // Arrange
    let scheduler = VirtualScheduler::new();
    let (log, action) = recorder();
    let task = scheduler.schedule(Duration::from_secs(1), action("cancelled"));

    // Act
    task.cancel();
    scheduler.advance(Duration::from_secs(5));

    // Assert
    assert!(log.lock().is_empty());
    assert!(task.is_cancelled());
}

#[test]
fn test_dropping_task_handle_cancels_it() {
    // Arrange
    let scheduler = VirtualScheduler::new();
    let (log, action) = recorder();

    // Act
    drop(scheduler.schedule(Duration::from_secs(1), action("dropped")));
    scheduler.advance(Duration::from_secs(1));

    // Assert
    assert!(log.lock().is_empty());
}

#[test]
fn test_periodic_action_fires_once_per_period() {
    // Arrange
    let scheduler = VirtualScheduler::new();
    let ticks = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&ticks);
    let task = scheduler.schedule_periodic(
        Duration::from_secs(1),
        Duration::from_secs(1),
        Arc::new(move || sink.lock().push(())),
    );

    // Act & Assert
    scheduler.advance(Duration::from_millis(999));
    assert_eq!(ticks.lock().len(), 0);

    scheduler.advance(Duration::from_millis(1));
    assert_eq!(ticks.lock().len(), 1);

    scheduler.advance(Duration::from_secs(3));
    assert_eq!(ticks.lock().len(), 4);

    task.cancel();
    scheduler.advance(Duration::from_secs(10));
    assert_eq!(ticks.lock().len(), 4);
}

#[test]
fn test_actions_scheduled_during_advance_run_within_window() {
    // Arrange
    let scheduler = Arc::new(VirtualScheduler::new());
    let log = Arc::new(Mutex::new(Vec::new()));
    let inner_scheduler = Arc::clone(&scheduler);
    let inner_log = Arc::clone(&log);

    scheduler
        .schedule(
            Duration::from_secs(1),
            Box::new(move || {
                inner_log.lock().push(inner_scheduler.now());
                let nested_log = Arc::clone(&inner_log);
                let nested_clock = Arc::clone(&inner_scheduler);
                inner_scheduler
                    .schedule(
                        Duration::from_secs(1),
                        Box::new(move || nested_log.lock().push(nested_clock.now())),
                    )
                    .detach();
            }),
        )
        .detach();

    // Act
    scheduler.advance(Duration::from_secs(5));

    // Assert
    assert_eq!(
        *log.lock(),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );
    assert_eq!(scheduler.now(), Duration::from_secs(5));
}

#[test]
fn test_clock_never_moves_backwards() {
    // Arrange
    let scheduler = VirtualScheduler::new();
    scheduler.advance(Duration::from_secs(10));

    // Act
    scheduler.advance_to(Duration::from_secs(3));

    // Assert
    assert_eq!(scheduler.now(), Duration::from_secs(10));
}

#[test]
fn test_periodic_action_retires_at_end_of_clock() {
    // Arrange
    let scheduler = VirtualScheduler::new();
    let ticks = Arc::new(Mutex::new(0_u32));
    let sink = Arc::clone(&ticks);
    let _task = scheduler.schedule_periodic(
        Duration::MAX - Duration::from_millis(250),
        Duration::from_millis(100),
        Arc::new(move || *sink.lock() += 1),
    );

    // Act
    scheduler.advance(Duration::MAX);

    // Assert
    assert_eq!(*ticks.lock(), 3);
    assert_eq!(scheduler.pending(), 0);
    assert_eq!(scheduler.now(), Duration::MAX);
}
