use clap::Parser;

use portfolio_sync::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    portfolio_sync::run(cli).await
}
