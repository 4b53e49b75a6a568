//! Typed views over raw query rows.

use cellstats_shared::{CellArticle, Qid, TaxonRow};

use crate::Row;

/// Convert provenance-query rows into (cell, article) pairs.
///
/// Rows missing either variable are dropped; an empty result set simply
/// propagates as zero counts downstream.
pub fn rows_to_cell_articles(rows: &[Row]) -> Vec<CellArticle> {
    rows.iter()
        .filter_map(|row| {
            let cell = row.get("cell")?;
            let article = row.get("article")?;
            Some(CellArticle {
                cell: Qid::from_uri(cell),
                article: Qid::from_uri(article),
            })
        })
        .collect()
}

/// Convert taxon-query rows into (qid, optional taxon label) pairs.
///
/// The taxon label is a literal and is kept verbatim; only the entity
/// variable goes through trailing-segment extraction.
pub fn rows_to_taxon_rows(rows: &[Row]) -> Vec<TaxonRow> {
    rows.iter()
        .filter_map(|row| {
            let qid = row.get("qid")?;
            Some(TaxonRow {
                qid: Qid::from_uri(qid),
                taxon_name: row.get("taxon_name").cloned(),
            })
        })
        .collect()
}
