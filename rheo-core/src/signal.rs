// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::RheoError;
use crate::subscription::SubscriptionHandle;
use core::fmt;

/// One event of the subscriber lifecycle.
///
/// A well-formed sequence is `Subscribe`, any number of `Next`, then at most one of `Error` or
/// `Complete`.
#[derive(Clone)]
pub enum Signal<T> {
    Subscribe(SubscriptionHandle),
    Next(T),
    Error(RheoError),
    Complete,
}

impl<T> Signal<T> {
    /// Returns `true` for `Error` and `Complete`.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Signal::Error(_) | Signal::Complete)
    }

    pub const fn is_next(&self) -> bool {
        matches!(self, Signal::Next(_))
    }

    /// Converts into the carried item, discarding every other signal.
    pub fn into_next(self) -> Option<T> {
        match self {
            Signal::Next(v) => Some(v),
            _ => None,
        }
    }

    /// Converts into the carried error, discarding every other signal.
    pub fn into_error(self) -> Option<RheoError> {
        match self {
            Signal::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Maps the carried item, leaving lifecycle signals unchanged.
    pub fn map<U, F>(self, f: F) -> Signal<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Signal::Subscribe(s) => Signal::Subscribe(s),
            Signal::Next(v) => Signal::Next(f(v)),
            Signal::Error(e) => Signal::Error(e),
            Signal::Complete => Signal::Complete,
        }
    }

    /// Name of the subscriber callback this signal is delivered through.
    pub const fn name(&self) -> &'static str {
        match self {
            Signal::Subscribe(_) => "onSubscribe",
            Signal::Next(_) => "onNext",
            Signal::Error(_) => "onError",
            Signal::Complete => "onComplete",
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Subscribe(s) => write!(f, "onSubscribe({})", s.id()),
            Signal::Next(v) => write!(f, "onNext({v:?})"),
            Signal::Error(e) => write!(f, "onError({e})"),
            Signal::Complete => write!(f, "onComplete()"),
        }
    }
}

impl<T: PartialEq> PartialEq for Signal<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Signal::Subscribe(a), Signal::Subscribe(b)) => a.id() == b.id(),
            (Signal::Next(a), Signal::Next(b)) => a == b,
            (Signal::Error(a), Signal::Error(b)) => a.kind() == b.kind(),
            (Signal::Complete, Signal::Complete) => true,
            _ => false,
        }
    }
}
