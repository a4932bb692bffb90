// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Error types for the rheo publisher runtime.
//!
//! Every failure a subscriber can observe through `on_error`, and every protocol violation the
//! runtime detects, is a variant of [`RheoError`]. Errors are cheap to clone so a multicast hub
//! can relay the same failure to every attached downstream.
//!
//! # Examples
//!
//! ```
//! use rheo_core::{ErrorKind, RheoError, Result};
//!
//! fn grant(n: u64) -> Result<u64> {
//!     if n == 0 {
//!         return Err(RheoError::illegal_demand(n));
//!     }
//!     Ok(n)
//! }
//!
//! assert_eq!(grant(0).unwrap_err().kind(), ErrorKind::IllegalDemand);
//! ```

use std::error::Error;
use std::sync::Arc;

/// Root error type for all rheo operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RheoError {
    /// A subscriber requested a non-positive amount of demand.
    ///
    /// Demand is unsigned, so the only illegal request is `request(0)`.
    #[error("Illegal demand: request({requested}) must be positive")]
    IllegalDemand {
        /// The rejected request amount
        requested: u64,
    },

    /// A transform step raised an error while processing an item.
    ///
    /// The original cause is kept and can be inspected with [`RheoError::cause_is`].
    #[error("Source transform error: {0}")]
    SourceTransform(#[source] Arc<dyn Error + Send + Sync>),

    /// A timed source produced an item while the subscriber had no outstanding demand.
    #[error("Demand exceeded: {context}")]
    DemandExceeded {
        /// Which emission could not be delivered
        context: String,
    },

    /// A signal sequence violated the subscriber lifecycle.
    ///
    /// This is reported to the caller that produced the offending signal, never delivered
    /// to the subscriber as a second terminal event.
    #[error("Protocol violation: {context}")]
    ProtocolViolation {
        /// Description of the violated rule
        context: String,
    },

    /// A user-raised stream failure.
    #[error("Stream processing error: {context}")]
    StreamProcessing {
        /// Description of what went wrong
        context: String,
    },

    /// The scheduler could not be created or reached.
    #[error("Runtime error: {context}")]
    Runtime {
        /// Description of the missing runtime facility
        context: String,
    },
}

/// Discriminant of [`RheoError`], convenient for assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    IllegalDemand,
    SourceTransform,
    DemandExceeded,
    ProtocolViolation,
    StreamProcessing,
    Runtime,
}

impl RheoError {
    /// Create an illegal demand error for the rejected request amount
    pub fn illegal_demand(requested: u64) -> Self {
        Self::IllegalDemand { requested }
    }

    /// Wrap an error raised by a transform closure
    pub fn transform(error: impl Error + Send + Sync + 'static) -> Self {
        Self::SourceTransform(Arc::new(error))
    }

    /// Create a demand exceeded error with the given context
    pub fn demand_exceeded(context: impl Into<String>) -> Self {
        Self::DemandExceeded {
            context: context.into(),
        }
    }

    /// Create a protocol violation error with the given context
    pub fn protocol_violation(context: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            context: context.into(),
        }
    }

    /// Create a stream processing error with the given context
    pub fn stream_error(context: impl Into<String>) -> Self {
        Self::StreamProcessing {
            context: context.into(),
        }
    }

    /// Create a runtime error with the given context
    pub fn runtime_error(context: impl Into<String>) -> Self {
        Self::Runtime {
            context: context.into(),
        }
    }

    /// Returns the discriminant of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::IllegalDemand { .. } => ErrorKind::IllegalDemand,
            Self::SourceTransform(_) => ErrorKind::SourceTransform,
            Self::DemandExceeded { .. } => ErrorKind::DemandExceeded,
            Self::ProtocolViolation { .. } => ErrorKind::ProtocolViolation,
            Self::StreamProcessing { .. } => ErrorKind::StreamProcessing,
            Self::Runtime { .. } => ErrorKind::Runtime,
        }
    }

    /// Returns `true` if this is a transform error whose cause is of type `E`.
    ///
    /// ```
    /// use rheo_core::RheoError;
    ///
    /// #[derive(Debug, thiserror::Error)]
    /// #[error("index out of bounds")]
    /// struct IndexOutOfBounds;
    ///
    /// let error = RheoError::transform(IndexOutOfBounds);
    /// assert!(error.cause_is::<IndexOutOfBounds>());
    /// assert!(!error.cause_is::<std::fmt::Error>());
    /// ```
    #[must_use]
    pub fn cause_is<E: Error + 'static>(&self) -> bool {
        match self {
            Self::SourceTransform(cause) => cause.downcast_ref::<E>().is_some(),
            _ => false,
        }
    }

    /// Errors a subscriber caused itself, as opposed to failures of the source.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::IllegalDemand { .. } | Self::ProtocolViolation { .. }
        )
    }
}

/// Specialized Result type for rheo operations.
pub type Result<T> = std::result::Result<T, RheoError>;
