//! sideretro-worker main executable

pub mod cluster;
pub mod common;
pub mod dbscan;
pub mod err;
pub mod floyd_warshall;
pub mod graph;
pub mod interval;
pub mod stats;
pub mod store;

use clap::{Parser, Subcommand};

/// CLI parser based on clap.
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Cluster abnormal alignments into retrocopy insertion candidates",
    long_about = "Reads abnormal alignment evidence from a SQLite store, clusters it per \
        chromosome with DBSCAN, and writes the resulting cluster labels back to the store"
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: common::Args,

    /// The sub command to run
    #[command(subcommand)]
    command: Commands,
}

/// Enum supporting the parsing of top-level commands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Cluster abnormal alignments in a store.
    Cluster(cluster::Args),
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Build a tracing subscriber according to the configuration in `cli.common`.
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(match cli.common.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        })
        .compact()
        .finish();

    tracing::subscriber::with_default(collector, || -> Result<(), anyhow::Error> {
        match &cli.command {
            Commands::Cluster(args) => {
                cluster::run(&cli.common, args)?;
            }
        }
        Ok(())
    })?;

    Ok(())
}
