//! # Command-line interface
//!
//! Declarative CLI for the `vecstream` binary, built with
//! [`clap`](https://docs.rs/clap). It is a thin front-end over
//! [`crate::collection_manager::CollectionManager`] — every subcommand maps
//! directly onto one core operation plus argument parsing, so the core's
//! semantics are never duplicated here.
//!
//! ## Quick examples
//!
//! ```text
//! vecstream create-collection docs --use-hnsw
//! vecstream add docs doc1 --vector 1.0,0.0,0.0 --metadata '{"category":"x"}'
//! vecstream search docs --query 1.0,0.0,0.0 --k 5
//! vecstream serve --addr 127.0.0.1:7800
//! ```

use clap::{Parser, Subcommand};

/// Top-level CLI parser for the `vecstream` application.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "vecstream – an embedded ANN vector database with HNSW indexing and metadata filtering.",
    long_about = None,
    propagate_version = true,
    color = clap::ColorChoice::Always
)]
pub struct Cli {
    /// Override the data directory (defaults to the config's `data_dir`).
    #[arg(long, global = true)]
    pub data_dir: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// All supported subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new, empty collection.
    CreateCollection {
        /// Collection name.
        name: String,
        /// Build an HNSW index alongside the flat store.
        #[arg(long)]
        use_hnsw: bool,
        /// HNSW `M` (target degree at levels >= 1).
        #[arg(long)]
        m: Option<usize>,
        /// HNSW `ef_construction`.
        #[arg(long)]
        ef_construction: Option<usize>,
    },

    /// Insert or replace a vector.
    Add {
        /// Target collection name.
        collection: String,
        /// Vector ID.
        id: String,
        /// Comma-separated vector components, e.g. `1.0,0.0,0.0`.
        #[arg(long, value_delimiter = ',')]
        vector: Vec<f32>,
        /// Optional metadata as a JSON object string.
        #[arg(long)]
        metadata: Option<String>,
    },

    /// Fetch a vector and its metadata by ID.
    Get {
        collection: String,
        id: String,
    },

    /// Remove a vector by ID.
    Remove {
        collection: String,
        id: String,
    },

    /// Similarity search.
    Search {
        collection: String,
        /// Comma-separated query vector components.
        #[arg(long, value_delimiter = ',')]
        query: Vec<f32>,
        /// Number of results to return.
        #[arg(long, default_value_t = 10)]
        k: usize,
        /// Minimum similarity to admit a result.
        #[arg(long, default_value_t = 0.0)]
        threshold: f32,
        /// Optional dot-path filter as a JSON object string.
        #[arg(long)]
        filter: Option<String>,
    },

    /// Print vector count, dimension, disk sizes, and config for a collection.
    Stats {
        collection: String,
    },

    /// List known collections.
    List,

    /// Delete a collection and its on-disk data.
    DeleteCollection {
        name: String,
    },

    /// Run the TCP server over a `CollectionManager` rooted at `data_dir`.
    Serve {
        /// Bind address, e.g. `127.0.0.1:7800`. Overrides the config value.
        #[arg(long)]
        addr: Option<String>,
    },
}
