//! Cmdlet Emulator — a local endpoint answering the operations of the cmdlet
//! catalog from in-memory fixture data.
//!
//! Usage example (CLI):
//! ```bash
//! cmdlet_emulator --bind 127.0.0.1:4599 --page-size 5 --fail-after 3
//! ```
//!
//! Point the shell at it with `--endpoint 127.0.0.1:4599` (or `CMDLET_ENDPOINT`).
#![warn(missing_docs)]
use clap::Parser;
use cmdlet_common::Result;
use cmdlet_common::net::{DEFAULT_PORT, addr};
use cmdlet_emulator::{DEFAULT_PAGE_SIZE, Emulator, EmulatorOptions, services};
use crossbeam_channel::bounded;
use log::info;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Address to listen on.
    #[clap(long, env = "CMDLET_EMULATOR_BIND", default_value_t = addr("127.0.0.1", DEFAULT_PORT))]
    bind: String,

    /// Page size used when a request does not name one.
    #[clap(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Fail every call after this many with `ServiceUnavailable`.
    #[clap(long)]
    fail_after: Option<usize>,
}

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();

    let emulator = Emulator::bind(
        args.bind.trim(),
        EmulatorOptions {
            page_size: args.page_size,
            fail_after: args.fail_after,
        },
    )?;
    let handle = emulator.spawn()?;
    info!("Serving {:?}", services());

    let (ctrlc_tx, ctrlc_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        info!("Ctrl+C received. Shutting down emulator...");
        let _ = ctrlc_tx.try_send(());
    })
    .map_err(|e| cmdlet_common::CmdletError::Format(format!("Error setting Ctrl+C handler: {e}")))?;

    ctrlc_rx
        .recv()
        .map_err(|e| cmdlet_common::CmdletError::ChannelRecv(e.to_string()))?;
    handle.shutdown();
    Ok(())
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
