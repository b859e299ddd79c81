use std::io;

use anyhow::Result;
use tracing::info;

use talon_uci::{Output, UciEngine};

fn main() -> Result<()> {
    // stdout carries the protocol, so logs go to stderr.
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    info!(version = env!("CARGO_PKG_VERSION"), "talon starting");

    let engine = UciEngine::new(Output::stdout());
    engine.run(io::stdin().lock())?;
    Ok(())
}
