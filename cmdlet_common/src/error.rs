//! Error type shared by the shell and the emulator.
//!
//! `CmdletError` covers everything that can end a cmdlet invocation: bad
//! parameters caught during binding, transport failures talking to the
//! endpoint, errors the service itself reports, and the few internal failure
//! modes of the emulator (channels, poisoned locks). Crates propagate it with
//! the `Result` alias from `result`.
use std::io;
use std::sync::PoisonError;

use thiserror::Error;

/// Unified error type shared by shell and emulator.
#[derive(Error, Debug)]
pub enum CmdletError {
    /// I/O error originating from sockets or files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic formatting/validation error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),

    /// No cmdlet with this name is registered in the catalog.
    #[error("Unknown cmdlet: {0}")]
    UnknownCmdlet(String),

    /// A named argument did not match any parameter of the cmdlet.
    #[error("A parameter cannot be found that matches parameter name '{0}'")]
    UnknownParameter(String),

    /// A required parameter was not bound.
    #[error("Missing required parameter '{0}'")]
    MissingParameter(String),

    /// A parameter value failed validation.
    #[error("Cannot bind parameter '{name}': {reason}")]
    InvalidParameter {
        /// Canonical parameter name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The endpoint could not be reached or replied with something unreadable.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Error reported by the remote service.
    #[error("{code}: {message}")]
    Service {
        /// Service error code, e.g. `InvalidNextToken`.
        code: String,
        /// Service error message.
        message: String,
    },

    /// The service answered with the same continuation token it was sent.
    #[error("Pagination stalled: service returned the same token '{0}' twice")]
    PaginationStalled(String),

    /// Channel send failed (e.g., receiver dropped); contains a short context string.
    #[error("Channel send failed: {0}")]
    ChannelSend(String),

    /// Channel receive failed (e.g., sender closed); contains a short context string.
    #[error("Channel receive failed: {0}")]
    ChannelRecv(String),

    /// Error indicating a poisoned mutex/lock was encountered.
    #[error("Mutex Lock Poisoned: {0}")]
    MutexLock(String),
}

impl CmdletError {
    /// Short machine-readable kind used when rendering the error as an object.
    pub fn kind(&self) -> &'static str {
        match self {
            CmdletError::Io(_) => "IoError",
            CmdletError::Json(_) => "SerializationError",
            CmdletError::Format(_) => "FormatError",
            CmdletError::UnknownCmdlet(_) => "CommandNotFound",
            CmdletError::UnknownParameter(_) => "ParameterBindingError",
            CmdletError::MissingParameter(_) => "ParameterBindingError",
            CmdletError::InvalidParameter { .. } => "ParameterBindingError",
            CmdletError::Transport(_) => "TransportError",
            CmdletError::Service { .. } => "ServiceError",
            CmdletError::PaginationStalled(_) => "PaginationError",
            CmdletError::ChannelSend(_) | CmdletError::ChannelRecv(_) => "ChannelError",
            CmdletError::MutexLock(_) => "InternalError",
        }
    }

    /// Builds an `InvalidParameter` error.
    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        CmdletError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl<T> From<PoisonError<T>> for CmdletError {
    fn from(err: PoisonError<T>) -> Self {
        CmdletError::MutexLock(err.to_string())
    }
}
