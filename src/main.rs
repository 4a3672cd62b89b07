//! Book Lab - command line entry point
//!
//! `features` runs the offline pipeline (snapshot table in, feature
//! artifact out); `relay` serves the health and metrics-proxy endpoints.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use book_lab::dataset::TimestampUnit;
use book_lab::relay::RelayConfig;
use book_lab::{pipeline, relay};

#[derive(Parser)]
#[command(name = "book_lab", version, about = "Microstructure research toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute order book features from L1 snapshots
    Features {
        /// Input table with L1 book snapshots (.csv or .parquet)
        #[arg(long)]
        book: PathBuf,
        /// Output artifact (.parquet or .csv, chosen by extension)
        #[arg(long)]
        out: PathBuf,
        /// Epoch unit of a numeric timestamp column; inferred when omitted
        #[arg(long, value_enum)]
        ts_unit: Option<TimestampUnit>,
    },
    /// Serve the health and metrics-proxy endpoints
    Relay {
        /// Bind address
        #[arg(long, default_value = "127.0.0.1:8000")]
        bind: SocketAddr,
        /// Upstream engine base URL; defaults to ENGINE_URL or the
        /// built-in placeholder
        #[arg(long)]
        upstream: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        error!("{}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> book_lab::Result<()> {
    match cli.command {
        Command::Features { book, out, ts_unit } => {
            let summary = pipeline::run(&book, &out, ts_unit)?;
            println!(
                "[features] rows={} cols={:?} -> {}",
                summary.rows,
                summary.columns,
                summary.path.display()
            );
        }
        Command::Relay { bind, upstream } => {
            let mut config = RelayConfig::from_env();
            if let Some(url) = upstream {
                config = config.with_upstream(url);
            }
            relay::serve(bind, config).await?;
        }
    }
    Ok(())
}
