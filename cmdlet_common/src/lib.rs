//!
//! Common types and the invoke path shared by the cmdlet shell and the emulator.
//!
//! This crate aggregates:
//! - `error` — unified error type `CmdletError` used across the workspace.
//! - `result` — handy `Result<T, CmdletError>` alias.
//! - `token` — continuation tokens.
//! - `paginator` — auto-iteration over paginated operations.
//! - `params` — shell-style parameter binding and request building.
//! - `output` — `-Select` projections of responses.
//! - `cmdlet` / `catalog` — static cmdlet descriptions, one catalog module per service.
//! - `wire` / `client` — the call envelope and the blocking TCP client.
//! - `invoke` — runs a bound cmdlet through a client.
//! - `net` — networking defaults.
#![warn(missing_docs)]
pub mod catalog;
pub mod client;
pub mod cmdlet;
pub mod error;
pub mod invoke;
pub mod net;
pub mod output;
pub mod paginator;
pub mod params;
pub mod result;
pub mod token;
pub mod wire;

pub use client::{ServiceClient, TcpServiceClient};
pub use cmdlet::{CmdletSpec, ServiceId};
pub use error::CmdletError;
pub use result::Result;
pub use token::ContinuationToken;
