//! cellstats CLI — knowledge-base cell-type curation statistics.
//!
//! Cross-references remote cell-type metadata against a locally curated
//! reading-notes graph and renders CSV/JSON/SVG statistics artifacts.

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
