//! Command-line arguments for the cmdlet shell.
//!
//! This module defines the CLI interface using `clap`. Global settings come
//! before the subcommand; cmdlet arguments follow the cmdlet name verbatim.
use clap::{Parser, Subcommand};

use crate::render::OutputFormat;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Endpoint address (`host:port`) calls are sent to.
    #[clap(long, env = "CMDLET_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Region attached to calls.
    #[clap(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Profile name attached to calls.
    #[clap(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// How written values are rendered.
    #[clap(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Connect/read timeout for one call, in seconds.
    #[clap(long)]
    pub timeout_secs: Option<u64>,

    /// Log at debug level.
    #[clap(short, long)]
    pub verbose: bool,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Shell subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the available cmdlets.
    List {
        /// Only cmdlets of this service (`monitoring`, `messaging-chime`,
        /// `greengrass`, or a noun prefix such as `CW`).
        #[clap(long)]
        service: Option<String>,
    },

    /// Show the parameters of a cmdlet.
    Describe {
        /// Cmdlet name, e.g. `Get-CWMetricList`.
        cmdlet: String,
    },

    /// Run a cmdlet.
    Invoke {
        /// Cmdlet name, e.g. `Get-CWMetricList`.
        cmdlet: String,

        /// Cmdlet arguments: `-Name value`, `-Name:value`, `-Switch`, or positional values.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}
