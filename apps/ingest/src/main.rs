//! Vector Ingest
//!
//! Bulk-loads embedded records into a remote vector index. Reads JSON-lines
//! input, ensures the target index exists, and uploads in bounded chunks,
//! reporting per-chunk outcomes instead of dying on the first failure.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::Environment;
use domain_index::{
    BatchUpserter, ConnectionManager, IndexStore, PineconeStore, VectorRecord,
    DEFAULT_CHUNK_SIZE,
};
use eyre::{Result, WrapErr};
use tracing::{info, warn};

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "vector-ingest")]
#[command(about = "Bulk-load vector records into a remote index")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload records from a JSON-lines file (one {id, values, metadata} per line)
    Load {
        /// Path to the records file
        file: PathBuf,

        /// Records per write call
        #[arg(short, long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },

    /// Show the target index as the store sees it
    Describe,
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let environment = Environment::from_env();
    init_tracing(&environment);

    let config = Config::from_env()?;
    let cli = Cli::parse();

    let store =
        PineconeStore::new(config.store.clone()).wrap_err("Failed to build store client")?;

    match cli.command {
        Commands::Load { file, chunk_size } => {
            let records = read_records(&file)?;
            info!(records = records.len(), file = %file.display(), "Read input records");

            let connection = Arc::new(ConnectionManager::new(store, config.index)?);
            let upserter = BatchUpserter::new(connection).with_chunk_size(chunk_size);

            let report = upserter.upsert(records).await?;

            if report.is_complete() {
                info!(accepted = report.total_accepted, "Upload complete");
            } else {
                warn!(
                    accepted = report.total_accepted,
                    failed = report.total_failed,
                    rejected = report.rejected_before_send.len(),
                    failed_chunks = ?report.failed_chunk_indices(),
                    "Upload finished with failures"
                );
            }

            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Describe => match store.describe_index(&config.index.name).await? {
            Some(index_info) => println!("{}", serde_json::to_string_pretty(&index_info)?),
            None => eyre::bail!("Index '{}' does not exist", config.index.name),
        },
    }

    Ok(())
}

fn read_records(path: &Path) -> Result<Vec<VectorRecord>> {
    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;

    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str(line)
                .wrap_err_with(|| format!("Invalid record on line {}", number + 1))
        })
        .collect()
}
