mod cli;
mod config;
mod docker;
mod utils;

use anyhow::Result;
use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Argument errors exit with 1 like every other fatal failure
    let cli = Cli::parse_or_exit();

    // Initialize logging
    utils::logger::init(cli.verbose())?;

    cli.execute().await
}
