//! Cross-reference engine: join remote rows against the local article set.

use std::collections::HashSet;

use tracing::debug;

use cellstats_shared::{CellArticle, Qid};

/// Outcome of cross-referencing remote rows against the reference set.
#[derive(Debug, Clone)]
pub struct CrossRefResult {
    /// Rows whose article is in the reference set, in input order.
    pub matched: Vec<CellArticle>,
    /// Distinct cell identifiers among the matched rows.
    pub distinct_cells: usize,
    /// Distinct article identifiers among the matched rows.
    pub distinct_articles: usize,
}

/// Filter `rows` down to those whose article identifier is a member of
/// `reference`, preserving input order, and compute distinct cardinalities.
///
/// Pure function; persisting the matched subset is the caller's concern.
pub fn cross_reference(rows: &[CellArticle], reference: &HashSet<Qid>) -> CrossRefResult {
    let matched: Vec<CellArticle> = rows
        .iter()
        .filter(|row| reference.contains(&row.article))
        .cloned()
        .collect();

    let distinct_cells = matched
        .iter()
        .map(|row| &row.cell)
        .collect::<HashSet<_>>()
        .len();
    let distinct_articles = matched
        .iter()
        .map(|row| &row.article)
        .collect::<HashSet<_>>()
        .len();

    debug!(
        input_rows = rows.len(),
        matched = matched.len(),
        distinct_cells,
        distinct_articles,
        "cross-reference complete"
    );

    CrossRefResult {
        matched,
        distinct_cells,
        distinct_articles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cell: &str, article: &str) -> CellArticle {
        CellArticle {
            cell: Qid::from(cell),
            article: Qid::from(article),
        }
    }

    #[test]
    fn keeps_only_referenced_articles() {
        let reference: HashSet<Qid> = [Qid::from("A"), Qid::from("B")].into();
        let rows = vec![row("cell1", "A"), row("cell2", "C")];

        let result = cross_reference(&rows, &reference);

        assert_eq!(result.matched, vec![row("cell1", "A")]);
        assert_eq!(result.distinct_cells, 1);
        assert_eq!(result.distinct_articles, 1);
    }

    #[test]
    fn output_is_subset_in_input_order() {
        let reference: HashSet<Qid> = [Qid::from("A"), Qid::from("B")].into();
        let rows = vec![
            row("cell3", "B"),
            row("cell1", "A"),
            row("cell2", "X"),
            row("cell4", "A"),
        ];

        let result = cross_reference(&rows, &reference);

        assert_eq!(
            result.matched,
            vec![row("cell3", "B"), row("cell1", "A"), row("cell4", "A")]
        );
        for m in &result.matched {
            assert!(reference.contains(&m.article));
        }
    }

    #[test]
    fn distinct_counts_collapse_duplicates() {
        let reference: HashSet<Qid> = [Qid::from("A")].into();
        let rows = vec![row("cell1", "A"), row("cell1", "A"), row("cell2", "A")];

        let result = cross_reference(&rows, &reference);

        assert_eq!(result.matched.len(), 3);
        assert_eq!(result.distinct_cells, 2);
        assert_eq!(result.distinct_articles, 1);
    }

    #[test]
    fn empty_inputs_yield_zero_counts() {
        let result = cross_reference(&[], &HashSet::new());
        assert!(result.matched.is_empty());
        assert_eq!(result.distinct_cells, 0);
        assert_eq!(result.distinct_articles, 0);
    }
}
