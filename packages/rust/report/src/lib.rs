//! Aggregation and artifact rendering.
//!
//! Pure functions over the joined datasets (taxon grouping, author counts,
//! curator figures, the narrative report) plus the small writers that
//! persist each artifact: CSV tables, the JSON-encoded report string, the
//! plain-text unedited list, and the SVG badge.

mod rankings;
mod svg;

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use cellstats_shared::{
    AuthorMap, CellArticle, CellStatsError, EditorRecord, Qid, ReportFigures, Result, TaxonRow,
    csv,
};

pub use rankings::{EditorMatrix, RankedEditor};
pub use svg::{BadgeFigures, dated_badge_filename, render_badge};

/// Sentinel label substituted for entities without a taxon statement.
pub const NO_TAXON_LABEL: &str = "no taxon specified";

// ---------------------------------------------------------------------------
// Grouping and counting
// ---------------------------------------------------------------------------

/// Group entities by taxon label, substituting the sentinel for missing
/// labels, and sort ascending by count (ties by label).
pub fn group_by_taxon(rows: &[TaxonRow]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for row in rows {
        let label = row.taxon_name.as_deref().unwrap_or(NO_TAXON_LABEL);
        *counts.entry(label).or_default() += 1;
    }

    let mut groups: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(label, count)| (label.to_string(), count))
        .collect();
    groups.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    groups
}

/// Count the rows whose taxon label exactly equals `species`.
pub fn species_count(rows: &[TaxonRow], species: &str) -> usize {
    rows.iter()
        .filter(|row| row.taxon_name.as_deref() == Some(species))
        .count()
}

/// Count occurrences of each username among the author-map values,
/// sorted descending by count (ties by username).
pub fn count_authors(map: &AuthorMap) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for author in map.values() {
        *counts.entry(author).or_default() += 1;
    }

    let mut table: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(author, count)| (author.to_string(), count))
        .collect();
    table.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    table
}

/// Distinct entities the curator edited at least once.
pub fn edited_by<'a>(
    records: impl Iterator<Item = &'a EditorRecord>,
    username: &str,
) -> HashSet<Qid> {
    records
        .filter(|r| r.username == username)
        .map(|r| r.qid.clone())
        .collect()
}

/// All entities minus those the curator edited, sorted for stable output.
pub fn unedited_qids<'a>(
    rows: &[TaxonRow],
    records: impl Iterator<Item = &'a EditorRecord>,
    username: &str,
) -> Vec<Qid> {
    let edited = edited_by(records, username);
    let all: HashSet<&Qid> = rows.iter().map(|row| &row.qid).collect();

    let mut unedited: Vec<Qid> = all
        .into_iter()
        .filter(|qid| !edited.contains(qid))
        .cloned()
        .collect();
    unedited.sort();
    unedited
}

/// Derive the report figures from the joined datasets.
///
/// `species` lists the labels counted individually; the first two populate
/// the per-species report lines.
pub fn compute_figures<'a>(
    rows: &[TaxonRow],
    records: impl Iterator<Item = &'a EditorRecord>,
    authors: &AuthorMap,
    curator: &str,
    species: &[String],
) -> ReportFigures {
    let total = rows
        .iter()
        .map(|row| &row.qid)
        .collect::<HashSet<_>>()
        .len();
    let edited = edited_by(records, curator).len();
    let created = authors.values().filter(|a| a.as_str() == curator).count();

    let species_a_cells = species
        .first()
        .map(|s| species_count(rows, s))
        .unwrap_or(0);
    let species_b_cells = species
        .get(1)
        .map(|s| species_count(rows, s))
        .unwrap_or(0);

    let figures = ReportFigures {
        total,
        species_a_cells,
        species_b_cells,
        edited,
        created,
    };
    debug!(?figures, "report figures computed");
    figures
}

// ---------------------------------------------------------------------------
// Narrative report
// ---------------------------------------------------------------------------

/// Entries created by hand from an external catalog rather than through the
/// curation workflow; called out separately in the report.
const MANUALLY_CURATED_ENTRIES: usize = 430;

/// Format the report date as `{day} of {full month} of {year}`.
pub fn report_date(now: DateTime<Utc>) -> String {
    now.format("%d of %B of %Y").to_string()
}

/// Render the narrative report embedding the figures and the date.
pub fn render_report(figures: &ReportFigures, curator: &str, date: &str) -> String {
    let workflow_entries = figures.created.saturating_sub(MANUALLY_CURATED_ENTRIES);
    format!(
        "\nWikidata contains {total} subclasses of \"cell ([Q7868](https://www.wikidata.org/wiki/Q7868))\" as of {date}. \n\
From those, {human} cell classes are specific for humans, and {mouse} are specific for mice.  \n\
From the {total} cell classes on Wikidata, {edited} ({pct_edited}%) have been edited somehow by User:{curator}, and {created} ({pct_created}%) have been created by User:{curator}. \n\
Edits included adding multilanguage labels, connecting a dangling Wikipedia page to the cell subclass hierarchy, adding identifiers, images, markers, and other pieces of information. \n\
Approximately {manual} terms were added via manual curation based on PanglaoDB entries, while the remaining {workflow} entries were created either via Wikidata's web interface or via the curation workflow described in this chapter. \n\
These statistics demonstrate how the curation system efficiently contributes to the status of cell type information on Wikidata.\n",
        total = figures.total,
        human = figures.species_a_cells,
        mouse = figures.species_b_cells,
        edited = figures.edited,
        pct_edited = figures.percentage_edited(),
        created = figures.created,
        pct_created = figures.percentage_created(),
        manual = MANUALLY_CURATED_ENTRIES,
        workflow = workflow_entries,
    )
}

// ---------------------------------------------------------------------------
// Artifact writers
// ---------------------------------------------------------------------------

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CellStatsError::io(parent, e))?;
    }
    std::fs::write(path, content).map_err(|e| CellStatsError::io(path, e))?;
    info!(path = %path.display(), "artifact written");
    Ok(())
}

/// Persist the cross-referenced (cell, article) rows as CSV.
pub fn write_matched_cells(path: &Path, rows: &[CellArticle]) -> Result<()> {
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|row| vec![row.cell.to_string(), row.article.to_string()])
        .collect();
    write_file(path, &csv::encode(&["cell_qid", "article_qid"], &table))
}

/// Persist the taxon groups as CSV.
pub fn write_taxon_groups(path: &Path, groups: &[(String, usize)]) -> Result<()> {
    let table: Vec<Vec<String>> = groups
        .iter()
        .map(|(label, count)| vec![label.clone(), count.to_string()])
        .collect();
    write_file(path, &csv::encode(&["taxon_name", "count"], &table))
}

/// Persist the author counts as CSV.
pub fn write_author_counts(path: &Path, counts: &[(String, usize)]) -> Result<()> {
    let table: Vec<Vec<String>> = counts
        .iter()
        .map(|(author, count)| vec![author.clone(), count.to_string()])
        .collect();
    write_file(path, &csv::encode(&["author", "count"], &table))
}

/// Persist the narrative report as a JSON-encoded string.
pub fn write_report(path: &Path, report: &str) -> Result<()> {
    let encoded = serde_json::to_string(report)
        .map_err(|e| CellStatsError::validation(format!("report encoding: {e}")))?;
    write_file(path, &encoded)
}

/// Persist the unedited-entity list, one identifier per line.
pub fn write_unedited(path: &Path, qids: &[Qid]) -> Result<()> {
    let mut content = String::new();
    for qid in qids {
        content.push_str(qid.as_str());
        content.push('\n');
    }
    write_file(path, &content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taxon(qid: &str, name: Option<&str>) -> TaxonRow {
        TaxonRow {
            qid: Qid::from(qid),
            taxon_name: name.map(String::from),
        }
    }

    fn record(username: &str, count: u64, qid: &str) -> EditorRecord {
        EditorRecord {
            username: username.into(),
            count,
            qid: Qid::from(qid),
        }
    }

    #[test]
    fn taxon_groups_fill_sentinel_and_sort_ascending() {
        let rows: Vec<TaxonRow> = (0..5)
            .map(|i| taxon(&format!("Qh{i}"), Some("Homo sapiens")))
            .chain((0..3).map(|i| taxon(&format!("Qm{i}"), Some("Mus musculus"))))
            .chain((0..2).map(|i| taxon(&format!("Qn{i}"), None)))
            .collect();

        let groups = group_by_taxon(&rows);

        assert_eq!(
            groups,
            vec![
                (NO_TAXON_LABEL.to_string(), 2),
                ("Mus musculus".to_string(), 3),
                ("Homo sapiens".to_string(), 5),
            ]
        );
        assert_eq!(rows.len(), 10);
        assert_eq!(species_count(&rows, "Homo sapiens"), 5);
        assert_eq!(species_count(&rows, "Mus musculus"), 3);
    }

    #[test]
    fn author_counts_scenario() {
        let mut map = AuthorMap::new();
        map.insert(Qid::from("A"), "x".into());
        map.insert(Qid::from("B"), "x".into());
        map.insert(Qid::from("C"), "y".into());

        let counts = count_authors(&map);
        assert_eq!(
            counts,
            vec![("x".to_string(), 2), ("y".to_string(), 1)]
        );
    }

    #[test]
    fn unedited_is_set_difference() {
        let rows = vec![taxon("Q1", None), taxon("Q2", None), taxon("Q3", None)];
        let records = vec![
            record("curator", 5, "Q2"),
            record("someone", 9, "Q3"),
        ];

        let unedited = unedited_qids(&rows, records.iter(), "curator");
        assert_eq!(unedited, vec![Qid::from("Q1"), Qid::from("Q3")]);
    }

    #[test]
    fn figures_count_distinct_edits_and_creations() {
        let rows = vec![
            taxon("Q1", Some("Homo sapiens")),
            taxon("Q2", Some("Mus musculus")),
            taxon("Q3", None),
        ];
        let records = vec![
            record("curator", 2, "Q1"),
            record("curator", 7, "Q1"),
            record("curator", 1, "Q2"),
            record("other", 3, "Q3"),
        ];
        let mut authors = AuthorMap::new();
        authors.insert(Qid::from("Q1"), "curator".into());
        authors.insert(Qid::from("Q2"), "other".into());

        let figures = compute_figures(
            &rows,
            records.iter(),
            &authors,
            "curator",
            &["Homo sapiens".to_string(), "Mus musculus".to_string()],
        );

        assert_eq!(figures.total, 3);
        assert_eq!(figures.edited, 2);
        assert_eq!(figures.created, 1);
        assert_eq!(figures.species_a_cells, 1);
        assert_eq!(figures.species_b_cells, 1);
        assert_eq!(figures.percentage_edited(), "66.7");
        assert_eq!(figures.percentage_created(), "33.3");
    }

    #[test]
    fn report_embeds_figures_and_date() {
        let figures = ReportFigures {
            total: 1000,
            species_a_cells: 400,
            species_b_cells: 300,
            edited: 500,
            created: 250,
        };
        let report = render_report(&figures, "SomeCurator", "05 of August of 2026");

        assert!(report.contains("1000 subclasses"));
        assert!(report.contains("400 cell classes are specific for humans"));
        assert!(report.contains("300 are specific for mice"));
        assert!(report.contains("500 (50.0%)"));
        assert!(report.contains("250 (25.0%)"));
        assert!(report.contains("User:SomeCurator"));
        assert!(report.contains("05 of August of 2026"));
    }

    #[test]
    fn report_date_format() {
        let now = DateTime::parse_from_rfc3339("2026-08-05T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(report_date(now), "05 of August of 2026");
    }

    #[test]
    fn written_report_is_json_encoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("author_stats.txt");
        write_report(&path, "a \"quoted\" report\n").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let decoded: String = serde_json::from_str(&content).unwrap();
        assert_eq!(decoded, "a \"quoted\" report\n");
    }

    #[test]
    fn unedited_file_one_qid_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unedited.txt");
        write_unedited(&path, &[Qid::from("Q1"), Qid::from("Q2")]).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Q1\nQ2\n");
    }
}
