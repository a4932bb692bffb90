// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use rheo_core::{RheoError, Subscriber, SubscriptionHandle, UNBOUNDED};

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type ErrorFn = Box<dyn FnMut(RheoError) + Send>;
type CompleteFn = Box<dyn FnMut() + Send>;

/// Subscriber built from closures.
///
/// Requests [`UNBOUNDED`] on subscription unless configured otherwise with
/// [`with_initial_request`](Self::with_initial_request). An initial request of `0` leaves demand
/// entirely to the caller, through the handle returned by `subscribe`.
///
/// ```
/// use rheo_publisher::prelude::*;
/// use std::sync::{Arc, Mutex};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// let done = Arc::new(Mutex::new(false));
/// let flag = done.clone();
///
/// just(["a", "b"]).subscribe(Box::new(
///     LambdaSubscriber::new(move |v| sink.lock().unwrap().push(v))
///         .with_complete(move || *flag.lock().unwrap() = true),
/// ));
///
/// assert_eq!(*seen.lock().unwrap(), vec!["a", "b"]);
/// assert!(*done.lock().unwrap());
/// ```
pub struct LambdaSubscriber<T> {
    on_next: NextFn<T>,
    on_error: Option<ErrorFn>,
    on_complete: Option<CompleteFn>,
    initial_request: u64,
}

impl<T> LambdaSubscriber<T> {
    pub fn new(on_next: impl FnMut(T) + Send + 'static) -> Self {
        Self {
            on_next: Box::new(on_next),
            on_error: None,
            on_complete: None,
            initial_request: UNBOUNDED,
        }
    }

    #[must_use]
    pub fn with_error(mut self, on_error: impl FnMut(RheoError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(on_error));
        self
    }

    #[must_use]
    pub fn with_complete(mut self, on_complete: impl FnMut() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(on_complete));
        self
    }

    #[must_use]
    pub fn with_initial_request(mut self, n: u64) -> Self {
        self.initial_request = n;
        self
    }
}

impl<T: Send> Subscriber<T> for LambdaSubscriber<T> {
    fn on_subscribe(&mut self, subscription: SubscriptionHandle) {
        if self.initial_request > 0 {
            subscription.request(self.initial_request);
        }
    }

    fn on_next(&mut self, item: T) {
        (self.on_next)(item);
    }

    fn on_error(&mut self, error: RheoError) {
        match self.on_error.as_mut() {
            Some(on_error) => on_error(error),
            None => error!("Unhandled error in subscriber: {}", error),
        }
    }

    fn on_complete(&mut self) {
        if let Some(on_complete) = self.on_complete.as_mut() {
            on_complete();
        }
    }
}
