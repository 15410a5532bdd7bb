use anyhow::Result;
use clap::Parser;

use hamo::{
    cli::Cli,
    runtime::Orchestrator,
    utils::{default_level, init_logger},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    init_logger(default_level(cli.verbose));

    let orchestrator = Orchestrator::new(cli)?;
    orchestrator.run().await
}
