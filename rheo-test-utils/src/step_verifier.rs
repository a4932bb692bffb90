// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Scripted verification of a publisher.
//!
//! A [`StepVerifier`] subscribes a recording subscriber to the publisher under test and walks an
//! ordered script of expectations and actions against the signals it receives.
//!
//! # Time
//!
//! - [`create`](StepVerifier::create) runs in real time: expectations wait up to
//!   [`default_timeout`](StepVerifierOptions::default_timeout) for a signal, `expect_no_event`
//!   and `then_await` wait on the tokio clock.
//! - [`with_virtual_time`](StepVerifier::with_virtual_time) hands the publisher factory a
//!   [`VirtualScheduler`]. `expect_no_event` and `then_await` advance it. An expectation that
//!   finds no signal advances the clock to the next scheduled action, until a signal arrives or
//!   nothing is scheduled.
//!
//! # Example
//!
//! ```
//! use rheo_publisher::prelude::*;
//! use rheo_test_utils::StepVerifier;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! StepVerifier::create(range(1, 3))
//!     .expect_next([1, 2, 3])
//!     .verify_complete()
//!     .await
//!     .unwrap();
//! # }
//! ```

use crate::recorder::{recorder, Recorded, Recording};
use core::fmt::Debug;
use core::time::Duration;
use rheo_core::{ErrorKind, RheoError, Signal, SubscriptionHandle, UNBOUNDED};
use rheo_publisher::Publisher;
use rheo_runtime::{SchedulerRef, VirtualScheduler};
use std::error::Error;
use std::sync::Arc;
use tokio::time::Instant;

/// Reasons a verification fails.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VerifyError {
    #[error("step {step}: expected {expected}, got {actual}")]
    Unexpected {
        step: usize,
        expected: String,
        actual: String,
    },

    #[error("step {step}: expected {expected}, but nothing arrived within {waited:?}")]
    Timeout {
        step: usize,
        expected: String,
        waited: Duration,
    },

    #[error("protocol violation observed by the subscriber: {0}")]
    Protocol(String),
}

/// Options for a [`StepVerifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepVerifierOptions {
    initial_request: u64,
    default_timeout: Duration,
}

impl Default for StepVerifierOptions {
    fn default() -> Self {
        Self {
            initial_request: UNBOUNDED,
            default_timeout: Duration::from_secs(5),
        }
    }
}

impl StepVerifierOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Demand requested on subscription. `0` requests nothing until `then_request`.
    #[must_use]
    pub fn initial_request(mut self, n: u64) -> Self {
        self.initial_request = n;
        self
    }

    /// How long a real-time expectation waits for its signal.
    #[must_use]
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }
}

type Predicate<T> = Box<dyn FnMut(&T) -> bool + Send>;
type ErrorPredicate = Box<dyn Fn(&RheoError) -> bool + Send>;

enum Step<T> {
    Subscription,
    Next(Vec<T>),
    NextCount(u64),
    ConsumeWhile(Predicate<T>),
    Error {
        description: String,
        matches: ErrorPredicate,
    },
    Complete,
    NoEvent(Duration),
    Await(Duration),
    Then(Box<dyn FnOnce() + Send>),
    Request(u64),
    Cancel,
}

/// Builder for a scripted verification. See the [module documentation](self).
pub struct StepVerifier<T> {
    publisher: Box<dyn Publisher<T>>,
    scheduler: Option<Arc<VirtualScheduler>>,
    options: StepVerifierOptions,
    steps: Vec<Step<T>>,
}

impl<T> StepVerifier<T>
where
    T: Debug + PartialEq + Send + 'static,
{
    /// Verifies `publisher` in real time.
    pub fn create(publisher: impl Publisher<T> + 'static) -> Self {
        Self {
            publisher: Box::new(publisher),
            scheduler: None,
            options: StepVerifierOptions::default(),
            steps: Vec::new(),
        }
    }

    /// Verifies the publisher built by `factory` on a fresh virtual clock.
    pub fn with_virtual_time<P, F>(factory: F) -> Self
    where
        P: Publisher<T> + 'static,
        F: FnOnce(SchedulerRef) -> P,
    {
        let scheduler = Arc::new(VirtualScheduler::new());
        let publisher = factory(Arc::clone(&scheduler) as SchedulerRef);
        Self {
            publisher: Box::new(publisher),
            scheduler: Some(scheduler),
            options: StepVerifierOptions::default(),
            steps: Vec::new(),
        }
    }

    /// Verifies `publisher` on a virtual clock owned by the caller, for publishers that have to
    /// be shared with `then` actions.
    pub fn with_virtual_scheduler(
        scheduler: Arc<VirtualScheduler>,
        publisher: impl Publisher<T> + 'static,
    ) -> Self {
        Self {
            publisher: Box::new(publisher),
            scheduler: Some(scheduler),
            options: StepVerifierOptions::default(),
            steps: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: StepVerifierOptions) -> Self {
        self.options = options;
        self
    }

    /// The virtual clock, for verifiers built with [`with_virtual_time`](Self::with_virtual_time).
    pub fn virtual_scheduler(&self) -> Option<Arc<VirtualScheduler>> {
        self.scheduler.clone()
    }

    #[must_use]
    pub fn expect_subscription(self) -> Self {
        self.step(Step::Subscription)
    }

    /// Expects the given items, in order.
    #[must_use]
    pub fn expect_next(self, items: impl IntoIterator<Item = T>) -> Self {
        self.step(Step::Next(items.into_iter().collect()))
    }

    /// Expects `n` items of any value.
    #[must_use]
    pub fn expect_next_count(self, n: u64) -> Self {
        self.step(Step::NextCount(n))
    }

    /// Consumes items while `predicate` holds. The first item failing it is left for the next
    /// step.
    #[must_use]
    pub fn then_consume_while(self, predicate: impl FnMut(&T) -> bool + Send + 'static) -> Self {
        self.step(Step::ConsumeWhile(Box::new(predicate)))
    }

    #[must_use]
    pub fn expect_error(self, kind: ErrorKind) -> Self {
        self.step(Step::Error {
            description: format!("onError({kind:?})"),
            matches: Box::new(move |error| error.kind() == kind),
        })
    }

    #[must_use]
    pub fn expect_error_matches(
        self,
        predicate: impl Fn(&RheoError) -> bool + Send + 'static,
    ) -> Self {
        self.step(Step::Error {
            description: "onError matching the predicate".to_string(),
            matches: Box::new(predicate),
        })
    }

    /// Expects a transform error whose cause is an `E`.
    #[must_use]
    pub fn expect_error_caused_by<E: Error + 'static>(self) -> Self {
        self.step(Step::Error {
            description: format!("onError caused by {}", std::any::type_name::<E>()),
            matches: Box::new(|error| error.cause_is::<E>()),
        })
    }

    #[must_use]
    pub fn expect_complete(self) -> Self {
        self.step(Step::Complete)
    }

    /// Expects no signal at all for `duration`. A signal arriving exactly at the end of the
    /// window is left for the next step.
    #[must_use]
    pub fn expect_no_event(self, duration: Duration) -> Self {
        self.step(Step::NoEvent(duration))
    }

    /// Lets `duration` pass without checking anything.
    #[must_use]
    pub fn then_await(self, duration: Duration) -> Self {
        self.step(Step::Await(duration))
    }

    /// Runs `action` at this point of the script.
    #[must_use]
    pub fn then(self, action: impl FnOnce() + Send + 'static) -> Self {
        self.step(Step::Then(Box::new(action)))
    }

    #[must_use]
    pub fn then_request(self, n: u64) -> Self {
        self.step(Step::Request(n))
    }

    /// Cancels the subscription. Steps after it are not run.
    #[must_use]
    pub fn then_cancel(self) -> Self {
        self.step(Step::Cancel)
    }

    /// Runs the script, returning how long it took.
    ///
    /// A script ending without a terminal expectation or `then_cancel` cancels the subscription
    /// once its last step passed.
    ///
    /// # Errors
    ///
    /// The first failing step, or [`VerifyError::Protocol`] if the subscriber observed a
    /// lifecycle violation at any point.
    pub async fn verify(self) -> Result<Duration, VerifyError> {
        let started = Instant::now();
        let Self {
            publisher,
            scheduler,
            options,
            steps,
        } = self;

        let (subscriber, recording) = recorder(options.initial_request);
        let handle = publisher.subscribe(Box::new(subscriber));
        let mut run = Run {
            recording,
            handle,
            scheduler,
            timeout: options.default_timeout,
            lookahead: None,
            subscription_seen: false,
        };

        let mut finished = false;
        for (index, step) in steps.into_iter().enumerate() {
            let position = index + 1;
            match step {
                Step::Subscription => run.expect_subscription(position).await?,
                Step::Next(items) => {
                    for item in items {
                        let expected = format!("onNext({item:?})");
                        match run.next_signal(position, &expected).await? {
                            Signal::Next(actual) if actual == item => {}
                            other => return Err(unexpected(position, expected, &other)),
                        }
                    }
                }
                Step::NextCount(n) => {
                    for received in 0..n {
                        let expected = format!("onNext (item {} of {n})", received + 1);
                        match run.next_signal(position, &expected).await? {
                            Signal::Next(_) => {}
                            other => return Err(unexpected(position, expected, &other)),
                        }
                    }
                }
                Step::ConsumeWhile(mut predicate) => loop {
                    let signal = run.next_signal(position, "onNext or a terminal").await?;
                    match signal {
                        Signal::Next(item) if predicate(&item) => {}
                        other => {
                            run.lookahead = Some(other);
                            break;
                        }
                    }
                },
                Step::Error {
                    description,
                    matches,
                } => {
                    match run.next_signal(position, &description).await? {
                        Signal::Error(error) if matches(&error) => {}
                        other => return Err(unexpected(position, description, &other)),
                    }
                    finished = true;
                    break;
                }
                Step::Complete => {
                    let expected = "onComplete()".to_string();
                    match run.next_signal(position, &expected).await? {
                        Signal::Complete => {}
                        other => return Err(unexpected(position, expected, &other)),
                    }
                    finished = true;
                    break;
                }
                Step::NoEvent(duration) => run.expect_no_event(position, duration).await?,
                Step::Await(duration) => run.pass_time(duration).await,
                Step::Then(action) => action(),
                Step::Request(n) => run.handle.request(n),
                Step::Cancel => {
                    run.handle.cancel();
                    finished = true;
                    break;
                }
            }
        }

        if !finished {
            run.handle.cancel();
        }
        run.check_no_violation()?;
        Ok(started.elapsed())
    }

    /// Appends [`expect_complete`](Self::expect_complete) and runs the script.
    ///
    /// # Errors
    ///
    /// See [`verify`](Self::verify).
    pub async fn verify_complete(self) -> Result<Duration, VerifyError> {
        self.expect_complete().verify().await
    }

    /// Appends [`expect_error`](Self::expect_error) and runs the script.
    ///
    /// # Errors
    ///
    /// See [`verify`](Self::verify).
    pub async fn verify_error(self, kind: ErrorKind) -> Result<Duration, VerifyError> {
        self.expect_error(kind).verify().await
    }

    fn step(mut self, step: Step<T>) -> Self {
        self.steps.push(step);
        self
    }
}

fn unexpected<T: Debug>(step: usize, expected: String, actual: &Signal<T>) -> VerifyError {
    VerifyError::Unexpected {
        step,
        expected,
        actual: format!("{actual:?}"),
    }
}

struct Run<T> {
    recording: Recording<T>,
    handle: SubscriptionHandle,
    scheduler: Option<Arc<VirtualScheduler>>,
    timeout: Duration,
    lookahead: Option<Signal<T>>,
    subscription_seen: bool,
}

impl<T: Debug> Run<T> {
    async fn expect_subscription(&mut self, step: usize) -> Result<(), VerifyError> {
        match self.next_event(step, "onSubscribe").await? {
            Recorded::Signal(Signal::Subscribe(_)) => {
                self.subscription_seen = true;
                Ok(())
            }
            Recorded::Signal(other) => Err(unexpected(step, "onSubscribe".to_string(), &other)),
            Recorded::Violation(violation) => Err(VerifyError::Protocol(violation)),
        }
    }

    /// Next signal other than the initial `onSubscribe`.
    async fn next_signal(&mut self, step: usize, expected: &str) -> Result<Signal<T>, VerifyError> {
        if let Some(signal) = self.lookahead.take() {
            return Ok(signal);
        }
        loop {
            match self.next_event(step, expected).await? {
                Recorded::Signal(Signal::Subscribe(_)) if !self.subscription_seen => {
                    self.subscription_seen = true;
                }
                Recorded::Signal(signal) => return Ok(signal),
                Recorded::Violation(violation) => return Err(VerifyError::Protocol(violation)),
            }
        }
    }

    async fn next_event(&mut self, step: usize, expected: &str) -> Result<Recorded<T>, VerifyError> {
        match &self.scheduler {
            Some(scheduler) => loop {
                if let Some(event) = self.recording.try_next() {
                    return Ok(event);
                }
                let Some(due) = scheduler.next_due() else {
                    return Err(VerifyError::Timeout {
                        step,
                        expected: expected.to_string(),
                        waited: Duration::ZERO,
                    });
                };
                scheduler.advance_to(due);
            },
            None => self
                .recording
                .next_within(self.timeout)
                .await
                .ok_or_else(|| VerifyError::Timeout {
                    step,
                    expected: expected.to_string(),
                    waited: self.timeout,
                }),
        }
    }

    /// Consumes the initial `onSubscribe` if no step did, so windows only see later signals.
    fn skip_initial_subscription(&mut self) -> Result<(), VerifyError> {
        if self.subscription_seen || self.lookahead.is_some() {
            return Ok(());
        }
        match self.recording.try_next() {
            Some(Recorded::Signal(Signal::Subscribe(_))) => self.subscription_seen = true,
            Some(Recorded::Signal(signal)) => self.lookahead = Some(signal),
            Some(Recorded::Violation(violation)) => return Err(VerifyError::Protocol(violation)),
            None => {}
        }
        Ok(())
    }

    async fn expect_no_event(&mut self, step: usize, duration: Duration) -> Result<(), VerifyError> {
        let expected = format!("no signal for {duration:?}");
        self.skip_initial_subscription()?;
        if let Some(signal) = self.lookahead.take() {
            return Err(unexpected(step, expected, &signal));
        }

        let window = duration.saturating_sub(Duration::from_nanos(1));
        let event = match &self.scheduler {
            Some(scheduler) => {
                scheduler.advance(window);
                let event = self.recording.try_next();
                scheduler.advance(duration - window);
                event
            }
            None => self.recording.next_within(duration).await,
        };

        match event {
            None => Ok(()),
            Some(Recorded::Signal(signal)) => Err(unexpected(step, expected, &signal)),
            Some(Recorded::Violation(violation)) => Err(VerifyError::Protocol(violation)),
        }
    }

    async fn pass_time(&mut self, duration: Duration) {
        match &self.scheduler {
            Some(scheduler) => scheduler.advance(duration),
            None => tokio::time::sleep(duration).await,
        }
    }

    fn check_no_violation(&mut self) -> Result<(), VerifyError> {
        self.recording
            .drain()
            .into_iter()
            .find_map(|event| match event {
                Recorded::Violation(violation) => Some(VerifyError::Protocol(violation)),
                Recorded::Signal(_) => None,
            })
            .map_or(Ok(()), Err)
    }
}
