//! Error types for the reflection core.

use crate::value::ValueKind;
use thiserror::Error;

/// Errors produced by cast operations.
///
/// A cast error is always distinguishable from a valid result, including the
/// null kind: `Value::Null` is data, `Err(CastError)` is not.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CastError {
    /// The source and target kinds belong to incompatible categories.
    #[error("cannot cast {from} to {to}")]
    Incompatible { from: ValueKind, to: ValueKind },

    /// A string could not be parsed as a literal of the target kind.
    #[error("'{literal}' is not a valid {target} literal")]
    InvalidLiteral { literal: String, target: ValueKind },
}

/// Errors produced by function invocation.
#[derive(Error, Debug)]
pub enum InvokeError {
    /// Argument count does not match the function's signature.
    #[error("arity mismatch: expected {expected} arguments, got {got}")]
    Arity { expected: usize, got: usize },

    /// The backend implementation reported a failure.
    #[error("invocation failed: {0}")]
    Failed(String),

    /// The backend dropped the call promise without settling it.
    #[error("call abandoned by the backend before completion")]
    Abandoned,

    /// A cast failed while marshalling arguments or results.
    #[error(transparent)]
    Cast(#[from] CastError),
}

/// Errors produced by the reflection model itself.
#[derive(Error, Debug)]
pub enum ReflectError {
    /// A type with the same name is already defined in the registry.
    #[error("type '{0}' is already defined")]
    DuplicateType(String),

    /// The backend's `create` hook rejected the function binding.
    #[error("function '{name}' rejected by its backend: {reason}")]
    BindRejected { name: String, reason: String },
}

/// Result type for reflection operations.
pub type ReflectResult<T> = std::result::Result<T, ReflectError>;
