// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

pub fn names() -> Vec<&'static str> {
    vec!["William", "Sabrina", "Mariah", "Cristian", "Aprendizado"]
}

/// Failure raised by transform closures in tests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("index out of bounds: {0}")]
pub struct IndexOutOfBounds(pub i64);

/// Fails on `bad`, passes every other value through.
///
/// # Errors
///
/// [`IndexOutOfBounds`] when `value == bad`.
pub fn fail_on(bad: i64) -> impl Fn(i64) -> Result<i64, IndexOutOfBounds> + Send + Sync + 'static {
    move |value| {
        if value == bad {
            Err(IndexOutOfBounds(value))
        } else {
            Ok(value)
        }
    }
}
