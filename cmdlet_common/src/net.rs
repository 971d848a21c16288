//! Networking defaults shared by shell and emulator.
use std::time::Duration;

/// Port the emulator listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 4599;
/// Endpoint the shell talks to unless configured otherwise.
pub const DEFAULT_ENDPOINT: &str = "127.0.0.1:4599";
/// Region attached to calls when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";
/// Socket timeout for one service call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Helper to format an address with a port like "ip:port".
pub fn addr(ip: &str, port: u16) -> String {
    format!("{}:{}", ip, port)
}
