//! Payment Statistics Service - HTTP server
//!
//! Accepts transactions and answers windowed statistics queries:
//! - `POST /transactions` registers a transaction
//! - `GET /statistics` returns sum/avg/min/max/count over the trailing window
//! - `GET /health` liveness probe

use anyhow::Result;
use clap::Parser;
use payment_statistics::StatisticsConfig;
use payment_statistics::server;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const SERVICE_NAME: &str = "payment-statistics";

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = SERVICE_NAME, about = "Windowed payment statistics service")]
struct Args {
    /// Path to a JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured listen address
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let mut config = StatisticsConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }

    info!(
        "starting {} v{}",
        SERVICE_NAME,
        env!("CARGO_PKG_VERSION")
    );

    server::serve(config).await
}

/// Initialize tracing with environment filter
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=info,tower_http=info", SERVICE_NAME.replace('-', "_")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
