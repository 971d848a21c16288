//! Shell configuration.
//!
//! Settings resolve in order: command-line flag, environment variable (wired
//! through `clap`'s `env` support in `args`), built-in default. Cmdlet common
//! parameters (`-Region`, `-ProfileName`, `-EndpointUrl`) override the
//! resolved settings for a single call.
use std::time::Duration;

use cmdlet_common::TcpServiceClient;
use cmdlet_common::invoke::CallSettings;
use cmdlet_common::net::{DEFAULT_ENDPOINT, DEFAULT_REGION, DEFAULT_TIMEOUT};
use cmdlet_common::params::CommonParameters;
use log::debug;

use crate::args::Args;

/// Resolved shell settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Endpoint address.
    pub endpoint: String,
    /// Region attached to calls.
    pub region: String,
    /// Profile name attached to calls.
    pub profile: Option<String>,
    /// Socket timeout per call.
    pub timeout: Duration,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            region: DEFAULT_REGION.to_string(),
            profile: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ShellConfig {
    /// Settings from parsed arguments, falling back to defaults.
    pub fn from_args(args: &Args) -> Self {
        let defaults = Self::default();
        let config = Self {
            endpoint: non_empty(args.endpoint.as_deref()).unwrap_or(defaults.endpoint),
            region: non_empty(args.region.as_deref()).unwrap_or(defaults.region),
            profile: non_empty(args.profile.as_deref()),
            timeout: args
                .timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        };
        debug!("Resolved configuration: {:?}", config);
        config
    }

    /// Call metadata for one invocation.
    pub fn call_settings(&self) -> CallSettings {
        CallSettings {
            region: self.region.clone(),
            profile: self.profile.clone(),
        }
    }

    /// Client for one invocation, honoring `-EndpointUrl`.
    pub fn client_for(&self, common: &CommonParameters) -> TcpServiceClient {
        let endpoint =
            non_empty(common.endpoint_url.as_deref()).unwrap_or_else(|| self.endpoint.clone());
        TcpServiceClient::new(&endpoint, self.timeout)
    }
}

/// Trimmed, unquoted value; `None` when empty.
fn non_empty(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    (!unquoted.is_empty()).then(|| unquoted.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("cmdlet_shell").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&[
            "--endpoint",
            "\"10.0.0.5:4599\"",
            "--region",
            "eu-west-1",
            "--timeout-secs",
            "3",
            "list",
        ]);
        let config = ShellConfig::from_args(&args);
        assert_eq!(config.endpoint, "10.0.0.5:4599");
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let args = parse(&["--endpoint", "  ", "--timeout-secs", "0", "list"]);
        let config = ShellConfig::from_args(&args);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn endpoint_url_parameter_overrides_the_client() {
        let config = ShellConfig::default();
        let common = CommonParameters {
            endpoint_url: Some("tcp://127.0.0.1:9999".into()),
            ..Default::default()
        };
        assert_eq!(config.client_for(&common).endpoint(), "127.0.0.1:9999");
        assert_eq!(config.client_for(&CommonParameters::default()).endpoint(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn cmdlet_arguments_are_passed_through_verbatim() {
        let args = parse(&["invoke", "Get-GGGroupList", "-MaxResult", "2", "-NoAutoIteration"]);
        match args.command {
            crate::args::Command::Invoke { cmdlet, args } => {
                assert_eq!(cmdlet, "Get-GGGroupList");
                assert_eq!(args, vec!["-MaxResult", "2", "-NoAutoIteration"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
