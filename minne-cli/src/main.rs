//! ## minne-cli
//! **Interactive test harness for the minne arena allocator**
//!
//! Thin glue over `minne-core`: parses process options, merges the
//! configuration layers, constructs one heap and drives a line-oriented
//! REPL against it.

use std::io;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use minne_core::Heap;

mod commands;
mod config;
mod error;

use commands::Cli;
use error::CliError;

fn main() -> Result<(), CliError> {
    init_tracing();

    let cli = Cli::parse();
    let settings = config::load(&cli)?;

    tracing::debug!(size = settings.size, strategy = %settings.strategy, "starting REPL");
    let mut heap = Heap::new(settings.size, settings.strategy);

    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();
    commands::repl(&mut heap, stdin, stdout)?;

    Ok(())
}

fn init_tracing() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init()
}
