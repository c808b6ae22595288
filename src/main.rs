//! # vecstream CLI application
//!
//! Command-line front-end for `vecstream`, an embedded ANN vector database.
//! This binary wires together the on-disk configuration, a
//! [`CollectionManager`], and the [`commands`] subcommand set; it optionally
//! starts the TCP server (`serve`). None of this dispatch logic carries core
//! semantics — it parses arguments, calls one core operation, and prints the
//! result.
//!
//! ## Configuration
//!
//! Settings live at `<config_dir>/config.yaml` (see
//! [`vecstream::config_dir`]); `--data-dir` on the command line overrides
//! the configured data directory for a single invocation.

use std::error::Error;

use clap::Parser;
use once_cell::sync::OnceCell;
use tracing::info;

use vecstream::collection_manager::CollectionManager;
use vecstream::commands::{Cli, Commands};
use vecstream::config;
use vecstream::hnsw::HnswParams;
use vecstream::metadata::Filter;
use vecstream::{config_dir, server};

static TRACING: OnceCell<()> = OnceCell::new();

fn initialize_tracing() {
    TRACING.get_or_init(|| {
        tracing_subscriber::fmt::init();
    });
}

fn main() -> Result<(), Box<dyn Error>> {
    initialize_tracing();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run())
}

async fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config_path = config_dir()?.join("config.yaml");
    let mut config = config::load_config(&config_path);
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }

    let mut manager = CollectionManager::new(&config.data_dir)?;

    match cli.command {
        Commands::CreateCollection { name, use_hnsw, m, ef_construction } => {
            let params = use_hnsw.then(|| {
                let mut p = HnswParams::default();
                if let Some(m) = m {
                    p.m = m;
                    p.m_max0 = m * 2;
                }
                if let Some(ef) = ef_construction {
                    p.ef_construction = ef;
                }
                p
            });
            manager.create(&name, use_hnsw, params)?;
            println!("created collection {name}");
        }

        Commands::Add { collection, id, vector, metadata } => {
            let metadata = metadata.map(|m| serde_json::from_str(&m)).transpose()?;
            let handle = manager.get(&collection)?;
            handle.add_vector(&id, vector, metadata)?;
            handle.save()?;
            println!("added {id} to {collection}");
        }

        Commands::Get { collection, id } => {
            let handle = manager.get(&collection)?;
            let (vector, metadata) = handle.get_vector_with_metadata(&id)?;
            println!("{}", serde_json::json!({"vector": vector, "metadata": metadata}));
        }

        Commands::Remove { collection, id } => {
            let handle = manager.get(&collection)?;
            handle.remove_vector(&id)?;
            handle.save()?;
            println!("removed {id} from {collection}");
        }

        Commands::Search { collection, query, k, threshold, filter } => {
            let filter: Option<Filter> = filter.map(|f| serde_json::from_str(&f)).transpose()?;
            let handle = manager.get(&collection)?;
            let results = handle.search_similar(&query, k, threshold, filter.as_ref())?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }

        Commands::Stats { collection } => {
            let stats = manager.stats(&collection)?;
            println!(
                "{}",
                serde_json::json!({
                    "name": stats.name,
                    "vector_count": stats.vector_count,
                    "dimension": stats.dimension,
                    "vectors_bytes": stats.vectors_bytes,
                    "metadata_bytes": stats.metadata_bytes,
                    "use_hnsw": stats.use_hnsw,
                    "created_at": stats.created_at,
                })
            );
        }

        Commands::List => {
            for name in manager.list() {
                println!("{name}");
            }
        }

        Commands::DeleteCollection { name } => {
            manager.delete(&name)?;
            println!("deleted collection {name}");
        }

        Commands::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| config.server_addr.clone());
            info!(%addr, "starting vecstream server");
            server::serve(&addr, manager).await?;
        }
    }

    Ok(())
}
