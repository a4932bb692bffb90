// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use parking_lot::Mutex;
use rheo_core::{
    ErrorKind, RheoError, SerializedEmitter, Subscriber, SubscriptionHandle,
};
use std::sync::{Arc, Weak};
use std::thread;

#[derive(Clone, Default)]
struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

struct LoggingSubscriber {
    log: Log,
    on_next_hook: Option<Box<dyn FnMut(i32) + Send>>,
}

impl LoggingSubscriber {
    fn boxed(log: &Log) -> Box<Self> {
        Box::new(Self {
            log: log.clone(),
            on_next_hook: None,
        })
    }
}

impl Subscriber<i32> for LoggingSubscriber {
    fn on_subscribe(&mut self, _subscription: SubscriptionHandle) {
        self.log.0.lock().push("subscribe".to_string());
    }

    fn on_next(&mut self, item: i32) {
        self.log.0.lock().push(format!("next {item}"));
        if let Some(hook) = self.on_next_hook.as_mut() {
            hook(item);
        }
    }

    fn on_error(&mut self, error: RheoError) {
        self.log.0.lock().push(format!("error {:?}", error.kind()));
    }

    fn on_complete(&mut self) {
        self.log.0.lock().push("complete".to_string());
    }
}

#[test]
fn test_emitter_delivers_in_order() -> anyhow::Result<()> {
    // Arrange
    let log = Log::default();
    let emitter = SerializedEmitter::new(LoggingSubscriber::boxed(&log));

    // Act
    emitter.on_subscribe(SubscriptionHandle::cancelled())?;
    emitter.next(1)?;
    emitter.next(2)?;
    emitter.complete()?;

    // Assert
    assert_eq!(log.entries(), vec!["subscribe", "next 1", "next 2", "complete"]);
    assert!(emitter.is_terminated());

    Ok(())
}

#[test]
fn test_emitter_rejects_signal_after_terminal() -> anyhow::Result<()> {
    // Arrange
    let log = Log::default();
    let emitter = SerializedEmitter::new(LoggingSubscriber::boxed(&log));
    emitter.on_subscribe(SubscriptionHandle::cancelled())?;
    emitter.error(RheoError::stream_error("boom"))?;

    // Act
    let next = emitter.next(3);
    let complete = emitter.complete();

    // Assert
    assert_eq!(next.unwrap_err().kind(), ErrorKind::ProtocolViolation);
    assert_eq!(complete.unwrap_err().kind(), ErrorKind::ProtocolViolation);
    assert_eq!(log.entries(), vec!["subscribe", "error StreamProcessing"]);

    Ok(())
}

#[test]
fn test_emitter_rejects_next_before_subscribe() {
    // Arrange
    let log = Log::default();
    let emitter = SerializedEmitter::new(LoggingSubscriber::boxed(&log));

    // Act
    let result = emitter.next(1);

    // Assert
    assert_eq!(result.unwrap_err().kind(), ErrorKind::ProtocolViolation);
    assert!(log.entries().is_empty());
}

#[test]
fn test_emitter_rejects_second_subscribe() -> anyhow::Result<()> {
    // Arrange
    let log = Log::default();
    let emitter = SerializedEmitter::new(LoggingSubscriber::boxed(&log));
    emitter.on_subscribe(SubscriptionHandle::cancelled())?;

    // Act
    let result = emitter.on_subscribe(SubscriptionHandle::cancelled());

    // Assert
    assert_eq!(result.unwrap_err().kind(), ErrorKind::ProtocolViolation);
    assert_eq!(log.entries(), vec!["subscribe"]);

    Ok(())
}

#[test]
fn test_emitter_drops_signals_after_cancel() -> anyhow::Result<()> {
    // Arrange
    let log = Log::default();
    let emitter = SerializedEmitter::new(LoggingSubscriber::boxed(&log));
    emitter.on_subscribe(SubscriptionHandle::cancelled())?;
    emitter.next(1)?;

    // Act
    emitter.cancel();
    emitter.next(2)?;
    emitter.complete()?;

    // Assert
    assert_eq!(log.entries(), vec!["subscribe", "next 1"]);
    assert!(emitter.is_done());

    Ok(())
}

#[test]
fn test_reentrant_emit_is_queued_not_nested() -> anyhow::Result<()> {
    // Arrange
    let log = Log::default();
    let emitter: Arc<Mutex<Weak<SerializedEmitter<i32>>>> = Arc::new(Mutex::new(Weak::new()));
    let hook_target = Arc::clone(&emitter);
    let hook_log = log.clone();
    let subscriber = Box::new(LoggingSubscriber {
        log: log.clone(),
        on_next_hook: Some(Box::new(move |item| {
            hook_log.0.lock().push(format!("hook enter {item}"));
            if item == 1 {
                if let Some(target) = hook_target.lock().upgrade() {
                    target.next(2).unwrap();
                }
            }
            hook_log.0.lock().push(format!("hook exit {item}"));
        })),
    });
    let strong = Arc::new(SerializedEmitter::new(subscriber));
    *emitter.lock() = Arc::downgrade(&strong);

    // Act
    strong.on_subscribe(SubscriptionHandle::cancelled())?;
    strong.next(1)?;

    // Assert
    assert_eq!(
        log.entries(),
        vec![
            "subscribe",
            "next 1",
            "hook enter 1",
            "hook exit 1",
            "next 2",
            "hook enter 2",
            "hook exit 2",
        ]
    );

    Ok(())
}

#[test]
fn test_concurrent_emitters_deliver_every_item_once() -> anyhow::Result<()> {
    // Arrange
    let log = Log::default();
    let emitter = Arc::new(SerializedEmitter::new(LoggingSubscriber::boxed(&log)));
    emitter.on_subscribe(SubscriptionHandle::cancelled())?;

    // Act
    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let emitter = Arc::clone(&emitter);
            thread::spawn(move || {
                for i in 0..250 {
                    emitter.next(worker * 1_000 + i).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    emitter.complete()?;

    // Assert
    let entries = log.entries();
    assert_eq!(entries.len(), 1 + 1_000 + 1);
    assert_eq!(entries.last().map(String::as_str), Some("complete"));

    Ok(())
}
