// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interpolation errors.

/// Error raised by an interpolator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterpError {
    /// An interpolator was handed values of a type it does not handle
    #[error("Value type mismatch: expected {expected}, found {found}")]
    ValueTypeMismatch {
        /// Type the interpolator handles
        expected: &'static str,
        /// Type it was given
        found: &'static str,
    },
}

/// Result type for interpolation
pub type Result<T> = std::result::Result<T, InterpError>;
