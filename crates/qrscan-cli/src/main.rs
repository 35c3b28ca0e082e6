// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

mod check;
mod devices;
mod error;
mod replay;
mod utils;

use clap::{Parser, Subcommand};
use error::result_to_exit_code;
use std::process::ExitCode;

/// qrscan CLI - QR scan session replay and allow-list tool
#[derive(Parser)]
#[command(name = "qrscan")]
#[command(version)]
#[command(about = "qrscan CLI - QR scan session replay and allow-list tool")]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (use RUST_LOG=trace for more)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output results in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check scanned values against a URL prefix allow-list
    Check(check::Args),

    /// List the cameras described by a capture script
    Devices(devices::Args),

    /// Run a scan session over a recorded capture script
    Replay(replay::Args),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Check(args) => check::execute(args, cli.json),
        Commands::Devices(args) => devices::execute(args, cli.json),
        Commands::Replay(args) => replay::execute(args, cli.json),
    };

    result_to_exit_code(result)
}

/// Initialize env_logger based on verbosity flags
fn init_logging(verbose: bool, quiet: bool) {
    let env = env_logger::Env::default();

    let env = if quiet {
        env.default_filter_or("error")
    } else if verbose {
        env.default_filter_or("debug")
    } else {
        env.default_filter_or("info")
    };

    env_logger::Builder::from_env(env)
        .format_timestamp(None) // Disable timestamps for cleaner CLI output
        .format_target(false) // Disable target (module path) for cleaner output
        .init();

    log::debug!("Logging initialized (qrscan {})", qrscan::version());
}
