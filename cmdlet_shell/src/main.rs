//! Cmdlet Shell — runs catalog cmdlets against a service endpoint from the
//! command line.
//!
//! Cmdlet arguments follow the cmdlet name exactly as they would be typed in a
//! shell session: `-Name value`, `-Name:value`, switches, and positional
//! values. Paginated cmdlets follow continuation tokens until the listing is
//! exhausted unless `-NoAutoIteration` or `-NextToken` is given, in which case
//! one page is written and the next token is reported on stderr.
//!
//! Usage example (CLI):
//! ```bash
//! cmdlet_shell --endpoint 127.0.0.1:4599 invoke Get-CWMetricList -Namespace AWS/EC2
//! cmdlet_shell --format text invoke Get-GGGroupList -MaxResult 5 -NoAutoIteration
//! ```
//!
//! Errors are written to stderr as one JSON object and the exit status is 1.
#![warn(missing_docs)]
mod args;
mod commands;
mod config;
mod render;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use cmdlet_common::Result;
use log::{LevelFilter, debug};

use crate::args::{Args, Command};
use crate::config::ShellConfig;
use crate::render::{Renderer, write_error};

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logger(args.verbose);
    let config = ShellConfig::from_args(&args);

    let stdout = io::stdout();
    let mut renderer = Renderer::new(args.format, stdout.lock());
    let outcome = match &args.command {
        Command::List { service } => commands::list(service.as_deref(), &mut renderer),
        Command::Describe { cmdlet } => commands::describe(cmdlet, &mut renderer),
        Command::Invoke { cmdlet, args } => commands::invoke(&config, cmdlet, args, &mut renderer),
    };

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            debug!("Command failed after {} value(s): {:?}", renderer.written(), e);
            write_error(&mut io::stderr().lock(), &e)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn init_logger(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}
