//! docstitch CLI — multi-page document extraction and reconciliation.
//!
//! Sends scanned pages to the extraction provider, checks that they
//! belong to the same document, and merges them into one record.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
