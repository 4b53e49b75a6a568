//! Pipeline orchestration for cellstats.
//!
//! Wires the graph loader, remote client, cache merger, and reporter into
//! the two runnable pipelines: bibliography statistics and contributor
//! statistics.

pub mod pipeline;

pub use pipeline::{
    AuthorStatsResult, BibStatsResult, ProgressReporter, SilentProgress, run_author_stats,
    run_bib_stats,
};
