//! Card-game sponsor server
//!
//! Hosts game sessions over TCP. Every environment runs in its own engine
//! process, started with `--engine-command` and spoken to over stdio.

use anyhow::Result;
use clap::Parser;
use sponsor_bridge::{ProcessEngine, ProcessEngineConfig};
use sponsor_server::transport::MAX_FRAME_LEN;
use sponsor_server::{EngineRegistry, ResumePolicy, ServerConfig, SponsorServer};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sponsor-server", version)]
#[command(about = "Host card-game sessions for remote players")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:50051")]
    addr: SocketAddr,

    /// Engine executable, spawned once per environment
    #[arg(long, default_value = "sponsor-engine")]
    engine_command: String,

    /// Argument passed to the engine (repeatable)
    #[arg(long = "engine-arg")]
    engine_args: Vec<String>,

    /// Seconds a closed engine may take to exit before it is killed
    #[arg(long, default_value_t = 2)]
    engine_grace_secs: u64,

    /// What RESUME does: "reset" restarts the game, "in-place" keeps it
    #[arg(long, default_value_t = ResumePolicy::Reset)]
    resume: ResumePolicy,

    /// Only serve these game types (repeatable; default: any the engine knows)
    #[arg(long = "game")]
    games: Vec<String>,

    /// Largest inbound frame in bytes
    #[arg(long, default_value_t = MAX_FRAME_LEN)]
    max_frame_len: usize,

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

    info!("Sponsor server starting (engine: {})", args.engine_command);

    let engine = ProcessEngine::with_config(ProcessEngineConfig {
        command: args.engine_command,
        args: args.engine_args,
        shutdown_grace: Duration::from_secs(args.engine_grace_secs),
    });
    let mut registry = EngineRegistry::new().with_fallback(engine);
    if !args.games.is_empty() {
        info!("Serving game types: {}", args.games.join(", "));
        registry = registry.allow_only(args.games);
    }

    let config = ServerConfig {
        addr: args.addr,
        resume_policy: args.resume,
        max_frame_len: args.max_frame_len,
    };
    let server = SponsorServer::new(registry, config);
    let listener = server.bind().await?;

    server
        .serve(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}
