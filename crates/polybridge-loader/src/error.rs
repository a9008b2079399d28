//! Error types for the loader layer.

use polybridge_reflect::ReflectError;
use thiserror::Error;

/// Errors that can occur while loading, discovering, or managing backends.
#[derive(Error, Debug)]
pub enum LoadError {
    /// No backend factory is registered under the tag.
    #[error("unknown loader tag: {0}")]
    UnknownTag(String),

    /// The backend is already initialized.
    #[error("loader '{0}' is already initialized")]
    AlreadyInitialized(String),

    /// The backend has been destroyed; destruction is terminal.
    #[error("loader '{0}' has been destroyed")]
    Destroyed(String),

    /// Backend construction failed.
    #[error("loader initialization failed: {0}")]
    Initialization(String),

    /// None of the requested paths resolved, so no handle was produced.
    #[error("none of the {requested} requested paths resolved")]
    NoneResolved { requested: usize },

    /// The operation has no meaning for this backend.
    #[error("operation '{op}' is not supported by loader '{tag}'")]
    Unsupported { tag: String, op: &'static str },

    /// A type name was not found in the backend's registry.
    #[error("type '{0}' is not defined by this loader")]
    UnknownType(String),

    /// A handle references a resource the backend no longer holds.
    #[error("resource '{0}' is no longer held by this loader")]
    MissingResource(String),

    /// The loader configuration is malformed.
    #[error("invalid loader configuration: {0}")]
    InvalidConfig(String),

    /// Reflection error surfaced during discovery or binding.
    #[error("reflection error: {0}")]
    Reflect(#[from] ReflectError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML configuration parse error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON configuration parse error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for loader operations.
pub type LoadResult<T> = std::result::Result<T, LoadError>;
