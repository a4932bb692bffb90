// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::sync::atomic::{AtomicUsize, Ordering};

/// Work-in-progress counter serializing a drain loop.
///
/// The caller that moves the counter off zero owns the loop and keeps running passes until every
/// signal that arrived meanwhile (each one an increment) has been accounted for. Re-entrant calls
/// from inside a pass only increment and return, so callbacks never recurse into the loop.
#[derive(Debug, Default)]
pub(crate) struct Wip(AtomicUsize);

impl Wip {
    /// A counter already owned by its creator, released by [`resume`](Self::resume).
    pub(crate) fn entered() -> Self {
        Self(AtomicUsize::new(1))
    }

    /// Runs `pass` until no work is missed, unless another caller owns the loop.
    pub(crate) fn run(&self, pass: impl FnMut()) {
        if self.0.fetch_add(1, Ordering::AcqRel) != 0 {
            return;
        }
        self.resume(pass);
    }

    /// Continues a loop the caller already owns.
    pub(crate) fn resume(&self, mut pass: impl FnMut()) {
        let mut missed = 1;
        loop {
            pass();

            let remaining = self.0.fetch_sub(missed, Ordering::AcqRel) - missed;
            if remaining == 0 {
                return;
            }
            missed = remaining;
        }
    }
}
