// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A subscriber that records every signal into a channel.
//!
//! The recording side checks the subscriber lifecycle as signals arrive. A double
//! `on_subscribe`, a signal before `on_subscribe`, or any signal after a terminal one is recorded
//! as a [`Recorded::Violation`] instead of a signal.

use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::{FutureExt, StreamExt};
use parking_lot::Mutex;
use rheo_core::{RheoError, Signal, Subscriber, SubscriptionHandle};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
pub enum Recorded<T> {
    Signal(Signal<T>),
    Violation(String),
}

/// Subscriber half of a recorder. See [`recorder`].
pub struct RecordingSubscriber<T> {
    sender: UnboundedSender<Recorded<T>>,
    subscription: Arc<Mutex<Option<SubscriptionHandle>>>,
    initial_request: u64,
    subscribed: bool,
    terminated: bool,
}

/// Receiving half of a recorder. See [`recorder`].
pub struct Recording<T> {
    receiver: UnboundedReceiver<Recorded<T>>,
    subscription: Arc<Mutex<Option<SubscriptionHandle>>>,
}

/// Creates a recording subscriber that requests `initial_request` on subscription (`0` for
/// none) and the [`Recording`] reading what it receives.
pub fn recorder<T>(initial_request: u64) -> (RecordingSubscriber<T>, Recording<T>) {
    let (sender, receiver) = unbounded();
    let subscription = Arc::new(Mutex::new(None));
    (
        RecordingSubscriber {
            sender,
            subscription: Arc::clone(&subscription),
            initial_request,
            subscribed: false,
            terminated: false,
        },
        Recording {
            receiver,
            subscription,
        },
    )
}

impl<T> RecordingSubscriber<T> {
    fn record(&mut self, signal: Signal<T>) {
        let violation = match &signal {
            Signal::Subscribe(_) if self.subscribed => Some("onSubscribe received twice"),
            Signal::Subscribe(_) => None,
            _ if !self.subscribed => Some("signal received before onSubscribe"),
            _ if self.terminated => Some("signal received after a terminal signal"),
            _ => None,
        };

        let event = match violation {
            Some(rule) => Recorded::Violation(format!("{rule}: {}", signal.name())),
            None => {
                match &signal {
                    Signal::Subscribe(_) => self.subscribed = true,
                    Signal::Error(_) | Signal::Complete => self.terminated = true,
                    Signal::Next(_) => {}
                }
                Recorded::Signal(signal)
            }
        };
        // The recording may have been dropped; nothing is left to observe then.
        let _ = self.sender.unbounded_send(event);
    }
}

impl<T: Send> Subscriber<T> for RecordingSubscriber<T> {
    fn on_subscribe(&mut self, subscription: SubscriptionHandle) {
        let first = !self.subscribed;
        self.record(Signal::Subscribe(subscription.clone()));
        if first {
            *self.subscription.lock() = Some(subscription.clone());
            if self.initial_request > 0 {
                subscription.request(self.initial_request);
            }
        }
    }

    fn on_next(&mut self, item: T) {
        self.record(Signal::Next(item));
    }

    fn on_error(&mut self, error: RheoError) {
        self.record(Signal::Error(error));
    }

    fn on_complete(&mut self) {
        self.record(Signal::Complete);
    }
}

impl<T> Recording<T> {
    /// The handle received in `on_subscribe`, once it has been received.
    pub fn subscription(&self) -> Option<SubscriptionHandle> {
        self.subscription.lock().clone()
    }

    pub fn request(&self, n: u64) {
        if let Some(subscription) = self.subscription() {
            subscription.request(n);
        }
    }

    pub fn cancel(&self) {
        if let Some(subscription) = self.subscription() {
            subscription.cancel();
        }
    }

    /// Returns the next recorded event if one is already available.
    pub fn try_next(&mut self) -> Option<Recorded<T>> {
        self.receiver.next().now_or_never().flatten()
    }

    /// Waits up to `timeout` for the next recorded event.
    ///
    /// Returns `None` on timeout, or when the subscriber was dropped with nothing left to read.
    pub async fn next_within(&mut self, timeout: Duration) -> Option<Recorded<T>> {
        tokio::time::timeout(timeout, self.receiver.next())
            .await
            .ok()
            .flatten()
    }

    /// Every event available right now.
    pub fn drain(&mut self) -> Vec<Recorded<T>> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Every signal available right now, skipping `onSubscribe`.
    ///
    /// # Panics
    ///
    /// Panics if a protocol violation was recorded.
    pub fn signals(&mut self) -> Vec<Signal<T>> {
        self.drain()
            .into_iter()
            .filter_map(|event| match event {
                Recorded::Signal(Signal::Subscribe(_)) => None,
                Recorded::Signal(signal) => Some(signal),
                Recorded::Violation(violation) => panic!("protocol violation: {violation}"),
            })
            .collect()
    }

    /// The items among the signals available right now.
    ///
    /// # Panics
    ///
    /// Panics if a protocol violation was recorded.
    pub fn values(&mut self) -> Vec<T> {
        self.signals()
            .into_iter()
            .filter_map(Signal::into_next)
            .collect()
    }
}
