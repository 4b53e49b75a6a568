//! Shared types, error model, and configuration for cellstats.
//!
//! This crate is the foundation depended on by all other cellstats crates.
//! It provides:
//! - [`CellStatsError`] — the unified error type
//! - Domain types ([`Qid`], [`CellArticle`], [`TaxonRow`], [`EditorRecord`])
//! - Configuration ([`AppConfig`], [`StatsConfig`], config loading)
//! - Minimal CSV encoding/decoding for the flat-file artifacts

pub mod config;
pub mod csv;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CurationConfig, EndpointsConfig, PathsConfig, StatsConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{CellStatsError, Result};
pub use types::{
    AuthorMap, CellArticle, EditorRecord, Qid, ReportFigures, TaxonRow, format_percentage,
};
