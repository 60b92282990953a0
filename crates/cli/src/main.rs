use clap::{Parser, Subcommand};

use hedge_trade_cli::commands;
use hedge_trade_cli::commands::RebalanceArgs;

#[derive(Parser)]
#[command(name = "hedge-trade")]
#[command(about = "Margin hedging tool for BitMEX", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect hedge exposure and optionally rebalance with a market order
    Rebalance(RebalanceArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Rebalance(args) => {
            commands::run_rebalance(args).await?;
        }
    }

    Ok(())
}
