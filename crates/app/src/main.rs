//! Stash daemon - share URLs and small files as expiring, code-protected
//! secrets over a JSON HTTP API.

mod daemon;

pub use daemon::ServiceState;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use clap::Parser;

use daemon::{spawn_service, ServiceConfig};

/// Stash daemon - secret sharing over HTTP
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on for HTTP requests
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Path to the SQLite database file; an in-memory database is used if unset
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Bearer token required for create and statistics requests
    #[arg(long, env = "STASH_API_TOKEN")]
    api_token: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Directory for rolling log files (stdout only if unset)
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let listen_addr = SocketAddr::from_str(&format!("0.0.0.0:{}", args.port))?;
    let log_level: tracing::Level = args.log_level.parse().unwrap_or(tracing::Level::INFO);

    let config = ServiceConfig {
        listen_addr,
        sqlite_path: args.database,
        api_token: args.api_token,
        engine: common::prelude::EngineConfig::default(),
        log_level,
        log_dir: args.log_dir,
    };

    spawn_service(&config).await;

    Ok(())
}
