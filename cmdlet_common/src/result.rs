//! Result type alias shared across the workspace.
//!
//! Defaults the error type to `CmdletError`, so functions can simply return
//! `Result<T>`.
use crate::error::CmdletError;

/// Workspace-wide `Result` alias with `CmdletError` as the default error.
pub type Result<T, E = CmdletError> = std::result::Result<T, E>;
