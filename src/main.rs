use clap::Parser;
use pmp_identity::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Health(args) => cli::health::run(args).await,
    }
}
