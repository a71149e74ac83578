/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for rendering and for writes through the reactive model.

use canopy_dom::DomError;
use thiserror::Error;

/// Errors that can occur while rendering.
///
/// Unresolved paths, unresolved recursive references and directives with
/// missing attributes are not errors: they expand to nothing. Only failures
/// reported by the host tree, and invalid configuration, surface here.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The host tree rejected an operation (e.g., an invalid tag name in a
    /// template).
    #[error(transparent)]
    Host(#[from] DomError),

    /// A configuration value is unusable.
    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by writes through a [`Reactive`](crate::Reactive) handle.
///
/// A failed write leaves the model untouched and does not notify the
/// listener.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The value this handle points at has been removed or replaced by a
    /// value of another shape.
    #[error("No value at path '{path}'")]
    StalePath { path: String },

    /// The handle points at a scalar, which has no keys.
    #[error("Value at path '{path}' is not a mapping or sequence")]
    NotAContainer { path: String },

    /// `push` or `insert` on something other than a sequence.
    #[error("Value at path '{path}' is not a sequence")]
    NotASequence { path: String },

    /// A sequence was addressed with a key that is not a decimal index.
    #[error("'{key}' is not a valid sequence index")]
    InvalidIndex { key: String },

    #[error("Index {index} is out of bounds for a sequence of length {len}")]
    OutOfBounds { index: usize, len: usize },

    #[error("No key '{key}' to remove")]
    MissingKey { key: String },

    /// A write was attempted from inside the change listener.
    #[error("Model was written while its change listener was running")]
    Reentrant,
}
