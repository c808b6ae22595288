//! # vecstream (library root)
//!
//! An embedded vector database for approximate nearest-neighbor similarity
//! search with metadata-aware filtering and multi-collection organization.
//!
//! ## Core
//! - [`vector_store`] — the flat, exact-cosine reference store.
//! - [`persistent_store`] — a single-file JSON sibling of `vector_store`.
//! - [`binary_store`] — a durable, metadata-carrying store backed by a
//!   binary vectors blob plus a JSON sidecar.
//! - [`hnsw`] — the Hierarchical Navigable Small World graph index.
//! - [`index_manager`] — keeps a flat index and an optional HNSW index in
//!   sync over the same [`binary_store::BinaryStore`].
//! - [`query_engine`] — threshold- and metadata-filter-aware search on top
//!   of [`index_manager`].
//! - [`metadata`] — the dot-path filter evaluator.
//! - [`collection`] — a named namespace bundling a store, an index, and the
//!   query engine.
//! - [`collection_manager`] — the on-disk registry of collections.
//!
//! ## Ambient
//! - [`error`] — the crate-wide error type.
//! - [`config`] — CLI/server configuration, never read by the core.
//! - [`commands`] — the `clap`-derived CLI surface.
//! - [`server`] / [`client`] — the optional length-prefixed TCP boundary.
//!
//! None of the ambient modules carry core semantics: they parse arguments,
//! call one core operation, and report the result.

use directories::ProjectDirs;
use std::error::Error;

pub mod binary_store;
pub mod client;
pub mod collection;
pub mod collection_manager;
pub mod commands;
pub mod config;
pub mod error;
pub mod hnsw;
pub mod index_manager;
pub mod math;
pub mod metadata;
pub mod persistent_store;
pub mod query_engine;
pub mod server;
pub mod vector_store;

/// Return the per-platform configuration directory used by `vecstream`.
///
/// This uses [`directories::ProjectDirs`] with the application triple
/// `("com", "vecstream", "vecstream")`, so you get the right place on each
/// OS (e.g., `~/Library/Application Support/com.vecstream.vecstream` on
/// macOS).
///
/// The directory is **not** created by this function; callers that need it
/// should create it with `fs::create_dir_all`.
///
/// # Errors
/// Returns an error if the platform configuration directory cannot be
/// determined (rare, but possible in heavily sandboxed environments).
pub fn config_dir() -> Result<std::path::PathBuf, Box<dyn Error>> {
    let proj_dirs = ProjectDirs::from("com", "vecstream", "vecstream")
        .ok_or("Unable to determine config directory")?;
    let config_dir = proj_dirs.config_dir().to_path_buf();

    Ok(config_dir)
}
