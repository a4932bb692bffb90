// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Serialized signal delivery.
//!
//! Operators that receive signals from more than one place (an upstream publisher, a scheduler
//! thread, a late subscriber attaching to a finished hub) deliver through a
//! [`SerializedEmitter`]. It guarantees that the wrapped subscriber sees a well-formed,
//! non-overlapping sequence, even when `emit` is called concurrently or re-entrantly.
//!
//! Lifecycle misuse is rejected with [`RheoError::ProtocolViolation`] returned to the caller.
//! The subscriber never sees a second terminal signal.

use crate::error::{Result, RheoError};
use crate::signal::Signal;
use crate::subscriber::BoxSubscriber;
use crate::subscription::SubscriptionHandle;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

struct EmitterState<T> {
    queue: VecDeque<Signal<T>>,
    subscribed: bool,
    terminated: bool,
}

/// Queue-and-drain wrapper around a subscriber.
///
/// Whoever increments the work counter from zero becomes the drainer and delivers every queued
/// signal, including those pushed by other threads while it is busy. Everybody else only
/// enqueues.
pub struct SerializedEmitter<T> {
    subscriber: Mutex<Option<BoxSubscriber<T>>>,
    state: Mutex<EmitterState<T>>,
    wip: AtomicUsize,
    cancelled: AtomicBool,
}

impl<T: Send> SerializedEmitter<T> {
    pub fn new(subscriber: BoxSubscriber<T>) -> Self {
        Self {
            subscriber: Mutex::new(Some(subscriber)),
            state: Mutex::new(EmitterState {
                queue: VecDeque::new(),
                subscribed: false,
                terminated: false,
            }),
            wip: AtomicUsize::new(0),
            cancelled: AtomicBool::new(false),
        }
    }

    /// # Errors
    ///
    /// [`RheoError::ProtocolViolation`] if a subscription was already delivered.
    pub fn on_subscribe(&self, subscription: SubscriptionHandle) -> Result<()> {
        self.emit(Signal::Subscribe(subscription))
    }

    /// # Errors
    ///
    /// [`RheoError::ProtocolViolation`] if called before `on_subscribe` or after a terminal signal.
    pub fn next(&self, item: T) -> Result<()> {
        self.emit(Signal::Next(item))
    }

    /// # Errors
    ///
    /// [`RheoError::ProtocolViolation`] if a terminal signal was already accepted.
    pub fn error(&self, error: RheoError) -> Result<()> {
        self.emit(Signal::Error(error))
    }

    /// # Errors
    ///
    /// [`RheoError::ProtocolViolation`] if a terminal signal was already accepted.
    pub fn complete(&self) -> Result<()> {
        self.emit(Signal::Complete)
    }

    /// Validates `signal` against the lifecycle and queues it for delivery.
    ///
    /// Signals arriving after [`cancel`](Self::cancel) are dropped silently.
    ///
    /// # Errors
    ///
    /// [`RheoError::ProtocolViolation`] when the signal is out of order.
    pub fn emit(&self, signal: Signal<T>) -> Result<()> {
        if self.is_cancelled() {
            return Ok(());
        }

        {
            let mut state = self.state.lock();
            let violation = match &signal {
                Signal::Subscribe(_) if state.subscribed => Some("onSubscribe called twice"),
                Signal::Subscribe(_) => None,
                _ if !state.subscribed => Some("signal before onSubscribe"),
                _ if state.terminated => Some("signal after terminal event"),
                _ => None,
            };

            if let Some(rule) = violation {
                error!("Protocol violation: {} ({})", rule, signal.name());
                return Err(RheoError::protocol_violation(format!(
                    "{rule}: {}",
                    signal.name()
                )));
            }

            match &signal {
                Signal::Subscribe(_) => state.subscribed = true,
                Signal::Error(_) | Signal::Complete => state.terminated = true,
                Signal::Next(_) => {}
            }
            state.queue.push_back(signal);
        }

        self.drain();
        Ok(())
    }

    /// Discards queued signals and releases the subscriber at the next drain.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.drain();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Returns `true` once a terminal signal has been accepted.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.state.lock().terminated
    }

    /// Returns `true` once no further signal will be delivered.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.is_terminated()
    }

    fn drain(&self) {
        if self.wip.fetch_add(1, Ordering::AcqRel) != 0 {
            return;
        }

        let mut missed = 1;
        loop {
            self.deliver_queued();

            let remaining = self.wip.fetch_sub(missed, Ordering::AcqRel) - missed;
            if remaining == 0 {
                return;
            }
            missed = remaining;
        }
    }

    fn deliver_queued(&self) {
        loop {
            if self.is_cancelled() {
                self.state.lock().queue.clear();
                self.subscriber.lock().take();
                return;
            }

            let Some(signal) = self.state.lock().queue.pop_front() else {
                return;
            };

            let terminal = signal.is_terminal();
            let mut slot = self.subscriber.lock();
            if let Some(subscriber) = slot.as_mut() {
                subscriber.on_signal(signal);
            }
            if terminal {
                slot.take();
            }
        }
    }
}
