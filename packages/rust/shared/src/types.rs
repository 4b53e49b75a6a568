//! Core domain types for cellstats.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Qid
// ---------------------------------------------------------------------------

/// An opaque knowledge-base entity identifier (e.g., `Q7868`).
///
/// Identifiers are always derived by taking the final path segment of an
/// entity URI, so `http://www.wikidata.org/entity/Q42` and a bare `Q42`
/// both yield `Q42`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Qid(pub String);

impl Qid {
    /// Extract an identifier from the trailing path segment of a URI.
    pub fn from_uri(uri: &str) -> Self {
        let tail = uri.rsplit('/').next().unwrap_or(uri);
        Self(tail.to_string())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Qid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Qid {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Query result rows
// ---------------------------------------------------------------------------

/// A (cell, article) pair from the provenance query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellArticle {
    /// Cell-type entity.
    pub cell: Qid,
    /// Source article the cell-type statement was derived from.
    pub article: Qid,
}

/// A (cell, taxon label) pair from the taxon query.
///
/// `taxon_name` is `None` when the entity has no taxon statement; the
/// reporter substitutes a sentinel label before grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonRow {
    /// Cell-type entity.
    pub qid: Qid,
    /// Optional taxon label (e.g., `Homo sapiens`).
    pub taxon_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Editor / author records
// ---------------------------------------------------------------------------

/// One accumulated editor-count record: who edited which entity how often.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EditorRecord {
    /// Editor username.
    pub username: String,
    /// Number of edits this user made to the entity.
    pub count: u64,
    /// The edited entity.
    pub qid: Qid,
}

/// Entity → username of the page creator.
///
/// A `BTreeMap` keeps the persisted JSON deterministic across runs.
pub type AuthorMap = BTreeMap<Qid, String>;

// ---------------------------------------------------------------------------
// Report figures
// ---------------------------------------------------------------------------

/// Derived scalar statistics interpolated into the narrative report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFigures {
    /// Total number of cell-type entities.
    pub total: usize,
    /// Entities with the first configured species label.
    pub species_a_cells: usize,
    /// Entities with the second configured species label.
    pub species_b_cells: usize,
    /// Distinct entities edited at least once by the curator.
    pub edited: usize,
    /// Entities whose page author is the curator.
    pub created: usize,
}

impl ReportFigures {
    /// Percentage of entities edited by the curator, one decimal place.
    pub fn percentage_edited(&self) -> String {
        format_percentage(self.edited, self.total)
    }

    /// Percentage of entities created by the curator, one decimal place.
    pub fn percentage_created(&self) -> String {
        format_percentage(self.created, self.total)
    }
}

/// Format `100 * part / total` with exactly one decimal digit.
///
/// A zero total yields `0.0` rather than dividing by zero.
pub fn format_percentage(part: usize, total: usize) -> String {
    if total == 0 {
        return "0.0".to_string();
    }
    format!("{:.1}", 100.0 * part as f64 / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qid_from_entity_uri() {
        let qid = Qid::from_uri("http://www.wikidata.org/entity/Q42");
        assert_eq!(qid.as_str(), "Q42");
    }

    #[test]
    fn qid_from_bare_token() {
        let qid = Qid::from_uri("Q42");
        assert_eq!(qid.as_str(), "Q42");
    }

    #[test]
    fn qid_serializes_transparently() {
        let qid = Qid::from("Q7868");
        let json = serde_json::to_string(&qid).expect("serialize");
        assert_eq!(json, "\"Q7868\"");
    }

    #[test]
    fn percentage_formatting_one_decimal() {
        assert_eq!(format_percentage(1, 3), "33.3");
        assert_eq!(format_percentage(2, 3), "66.7");
        assert_eq!(format_percentage(10, 10), "100.0");
        assert_eq!(format_percentage(0, 10), "0.0");
    }

    #[test]
    fn percentage_zero_total() {
        assert_eq!(format_percentage(0, 0), "0.0");
    }

    #[test]
    fn percentages_within_bounds() {
        for part in 0..=20 {
            let s = format_percentage(part, 20);
            let v: f64 = s.parse().expect("numeric");
            assert!((0.0..=100.0).contains(&v));
            assert_eq!(s.split('.').nth(1).map(str::len), Some(1));
        }
    }
}
