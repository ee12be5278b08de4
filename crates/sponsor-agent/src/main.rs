//! sponsor-agent: random decision-maker speaking the line protocol on stdio

use anyhow::Result;
use clap::Parser;
use sponsor_agent::RandomAgent;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sponsor-agent", version, about = "Pick actions for JSON game states on stdin")]
struct Args {
    /// Seed for reproducible choices
    #[arg(long)]
    seed: Option<u64>,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut agent = RandomAgent::new(args.seed);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    sponsor_agent::run(stdin, tokio::io::stdout(), &mut agent).await?;

    Ok(())
}
