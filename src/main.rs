use anyhow::Result;
use clap::Parser;
use jarvis::cli::Cli;
use jarvis::config::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing, so `.env` values feed the env-backed flags
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.log_format)?;
    cli.run().await
}
