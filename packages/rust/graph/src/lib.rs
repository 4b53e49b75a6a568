//! Local graph loading and cross-referencing.
//!
//! The curated reading-notes graph is a Turtle file in which every article
//! carrying notes appears as a subject of a fixed predicate. This crate
//! extracts that identifier set and joins remote query rows against it.

mod crossref;
mod parser;

use std::collections::HashSet;
use std::path::Path;

use tracing::{info, instrument};

use cellstats_shared::{CellStatsError, Qid, Result};

pub use crossref::{CrossRefResult, cross_reference};
pub use parser::{Triple, parse_turtle};

/// Load the set of noted-article identifiers from a Turtle file.
///
/// Iterates every triple and keeps the subjects whose predicate equals
/// `notes_predicate`, reduced to their trailing path segment. Duplicate
/// subjects collapse via set semantics. A missing or malformed file is
/// fatal; there is no recovery path.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_noted_articles(path: &Path, notes_predicate: &str) -> Result<HashSet<Qid>> {
    let content = std::fs::read_to_string(path).map_err(|e| CellStatsError::io(path, e))?;
    let triples = parse_turtle(&content)?;

    let articles: HashSet<Qid> = triples
        .iter()
        .filter(|t| t.predicate == notes_predicate)
        .map(|t| Qid::from_uri(&t.subject))
        .collect();

    info!(
        triples = triples.len(),
        articles = articles.len(),
        "loaded noted articles from local graph"
    );

    Ok(articles)
}
