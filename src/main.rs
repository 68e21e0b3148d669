//! soar-actions - action and function components for an incident-response platform.

use anyhow::Result;
use soar_actions::cli::Cli;
use soar_actions::config::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let cli = Cli::parse_args();
    cli.run().await
}
