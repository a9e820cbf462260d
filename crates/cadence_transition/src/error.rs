// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transition errors.
//!
//! Cancellation and dead targets are not errors; they surface as
//! [`Outcome`](crate::board::Outcome) values.

use cadence_interp::InterpError;
use thiserror::Error;

/// Errors raised while authoring or applying transitions
#[derive(Debug, Error)]
pub enum TransitionError {
    /// A chain was cast to a different concrete target type
    #[error("Chain type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Requested target type
        expected: &'static str,
        /// Actual target type of the chain
        found: &'static str,
    },

    /// A property value type has no interpolator
    #[error("Property '{property}' of type {type_name} is not interpolable")]
    NotInterpolable {
        /// Property name
        property: &'static str,
        /// Value type name
        type_name: &'static str,
    },

    /// A frame value did not match the property it was written to
    #[error("Property '{property}' expects {expected}, got {found}")]
    ValueType {
        /// Property name
        property: &'static str,
        /// Declared value type
        expected: &'static str,
        /// Type of the value supplied
        found: &'static str,
    },

    /// An interpolator failed
    #[error("Interpolation failed: {0}")]
    Interp(#[from] InterpError),

    /// Configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(#[from] ron::error::SpannedError),

    /// Configuration could not be serialized
    #[error("Failed to serialize configuration: {0}")]
    ConfigWrite(#[from] ron::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Execution was requested outside a tokio runtime
    #[error("No tokio runtime available to drive transitions")]
    NoRuntime,
}

/// Result type for transition operations
pub type Result<T> = std::result::Result<T, TransitionError>;
