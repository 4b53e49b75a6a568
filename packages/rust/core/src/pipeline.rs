//! End-to-end pipelines: fetch → cross-reference/merge → aggregate → persist.

use std::time::Instant;

use chrono::Utc;
use tracing::{info, instrument};

use cellstats_cache::{AuthorStore, EditorTable, KeyValueStore, merge_missing};
use cellstats_graph::{cross_reference, load_noted_articles};
use cellstats_remote::{
    CELL_ARTICLE_QUERY, CELL_TAXON_QUERY, RemoteSource, rows_to_cell_articles, rows_to_taxon_rows,
};
use cellstats_report::{
    BadgeFigures, EditorMatrix, RankedEditor, compute_figures, count_authors, dated_badge_filename,
    group_by_taxon, render_badge, render_report, report_date, unedited_qids, write_author_counts,
    write_matched_cells, write_report, write_taxon_groups, write_unedited,
};
use cellstats_shared::{CellStatsError, Qid, ReportFigures, Result, StatsConfig};

/// Fixed artifact filenames within the output directory.
const MATCHED_CELLS_FILE: &str = "matched_cells.csv";
const TAXON_GROUPS_FILE: &str = "cells_by_taxon.csv";
const EDITORS_FILE: &str = "cells_editors.csv";
const AUTHORS_JSON_FILE: &str = "cells_authors.json";
const AUTHORS_CSV_FILE: &str = "cells_authors.csv";
const REPORT_FILE: &str = "author_stats.txt";

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called for each working-set key during an incremental merge.
    fn key_progress(&self, current: usize, total: usize);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn key_progress(&self, _current: usize, _total: usize) {}
}

// ---------------------------------------------------------------------------
// Bibliography pipeline
// ---------------------------------------------------------------------------

/// Result of the bibliography pipeline.
#[derive(Debug)]
pub struct BibStatsResult {
    /// Unique noted articles in the local graph.
    pub total_articles: usize,
    /// Distinct noted articles referenced by cell-type statements.
    pub matched_articles: usize,
    /// Distinct cell-type classes supported by those references.
    pub matched_cells: usize,
    /// Path of the rendered badge.
    pub badge_path: std::path::PathBuf,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Run the bibliography pipeline.
///
/// 1. Load the noted-article set from the local graph
/// 2. Query (cell, article) provenance pairs
/// 3. Cross-reference and persist the matched rows
/// 4. Render the SVG badge to a dated filename
#[instrument(skip_all)]
pub async fn run_bib_stats(
    config: &StatsConfig,
    remote: &dyn RemoteSource,
    progress: &dyn ProgressReporter,
) -> Result<BibStatsResult> {
    let start = Instant::now();

    progress.phase("Loading local graph");
    let noted = load_noted_articles(&config.local_graph_path, &config.notes_predicate)?;
    info!(total_articles = noted.len(), "unique noted articles");

    progress.phase("Querying cell provenance");
    let rows = remote.query_rows(CELL_ARTICLE_QUERY).await?;
    let pairs = rows_to_cell_articles(&rows);

    progress.phase("Cross-referencing");
    let crossref = cross_reference(&pairs, &noted);
    write_matched_cells(&config.output_dir.join(MATCHED_CELLS_FILE), &crossref.matched)?;

    progress.phase("Rendering badge");
    let template = std::fs::read_to_string(&config.svg_template_path)
        .map_err(|e| CellStatsError::io(&config.svg_template_path, e))?;
    let badge = render_badge(
        &template,
        &BadgeFigures {
            total_articles: noted.len(),
            filtered_articles: crossref.distinct_articles,
            total_classes: crossref.distinct_cells,
        },
    );
    let badge_path = config
        .output_dir
        .join(dated_badge_filename(Utc::now().date_naive()));
    std::fs::write(&badge_path, badge).map_err(|e| CellStatsError::io(&badge_path, e))?;

    let result = BibStatsResult {
        total_articles: noted.len(),
        matched_articles: crossref.distinct_articles,
        matched_cells: crossref.distinct_cells,
        badge_path,
        elapsed: start.elapsed(),
    };

    info!(
        total_articles = result.total_articles,
        matched_articles = result.matched_articles,
        matched_cells = result.matched_cells,
        elapsed_ms = result.elapsed.as_millis(),
        "bibliography pipeline complete"
    );

    Ok(result)
}

// ---------------------------------------------------------------------------
// Contributor pipeline
// ---------------------------------------------------------------------------

/// Result of the contributor pipeline.
#[derive(Debug)]
pub struct AuthorStatsResult {
    /// Derived report figures (totals, curator counts).
    pub figures: ReportFigures,
    /// Editor fetches performed this run (entities not yet cached).
    pub editors_fetched: usize,
    /// Author fetches performed this run.
    pub authors_fetched: usize,
    /// Top 10 editors by total edit count.
    pub top_by_edits: Vec<RankedEditor>,
    /// Top 10 editors by distinct entities edited.
    pub top_by_entities: Vec<RankedEditor>,
    /// The rendered narrative report.
    pub report: String,
    /// Entities never edited by the curator.
    pub unedited: usize,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Run the contributor pipeline.
///
/// 1. Query cell types with their optional taxon label
/// 2. Group by taxon and persist the grouping
/// 3. Incrementally merge per-entity editor records (CSV cache)
/// 4. Incrementally merge per-entity author records (JSON cache)
/// 5. Aggregate, render the narrative report, list unedited entities
#[instrument(skip_all)]
pub async fn run_author_stats(
    config: &StatsConfig,
    remote: &dyn RemoteSource,
    progress: &dyn ProgressReporter,
) -> Result<AuthorStatsResult> {
    let start = Instant::now();

    progress.phase("Querying cell types");
    let rows = remote.query_rows(CELL_TAXON_QUERY).await?;
    let taxa = rows_to_taxon_rows(&rows);

    // Distinct working set, first-seen order.
    let mut seen = std::collections::HashSet::new();
    let working_set: Vec<Qid> = taxa
        .iter()
        .map(|row| row.qid.clone())
        .filter(|qid| seen.insert(qid.clone()))
        .collect();
    info!(total = working_set.len(), "cell types on the knowledge base");

    progress.phase("Grouping by taxon");
    let groups = group_by_taxon(&taxa);
    write_taxon_groups(&config.output_dir.join(TAXON_GROUPS_FILE), &groups)?;

    progress.phase("Merging editor records");
    let mut editors = EditorTable::open(&config.output_dir.join(EDITORS_FILE))?;
    let editors_fetched = merge_missing(
        &mut editors,
        &working_set,
        |qid| async move { remote.fetch_editors(&qid).await },
        |current, total| progress.key_progress(current, total),
    )
    .await?;
    editors.flush()?;

    let matrix = EditorMatrix::build(editors.all_records());
    matrix.log_top_rankings();

    progress.phase("Merging author records");
    let mut authors = AuthorStore::open(&config.output_dir.join(AUTHORS_JSON_FILE))?;
    let authors_fetched = merge_missing(
        &mut authors,
        &working_set,
        |qid| async move { remote.fetch_author(&qid).await },
        |current, total| progress.key_progress(current, total),
    )
    .await?;
    authors.flush()?;

    let author_counts = count_authors(authors.map());
    write_author_counts(&config.output_dir.join(AUTHORS_CSV_FILE), &author_counts)?;

    progress.phase("Rendering report");
    let figures = compute_figures(
        &taxa,
        editors.all_records(),
        authors.map(),
        &config.curator_username,
        &config.species,
    );
    let report = render_report(&figures, &config.curator_username, &report_date(Utc::now()));
    write_report(&config.output_dir.join(REPORT_FILE), &report)?;

    let unedited = unedited_qids(&taxa, editors.all_records(), &config.curator_username);
    let unedited_file = format!("unedited_by_{}.txt", config.curator_username);
    write_unedited(&config.output_dir.join(unedited_file), &unedited)?;

    let result = AuthorStatsResult {
        figures,
        editors_fetched,
        authors_fetched,
        top_by_edits: matrix.top_by_total_edits(10),
        top_by_entities: matrix.top_by_entity_count(10),
        report,
        unedited: unedited.len(),
        elapsed: start.elapsed(),
    };

    info!(
        total = result.figures.total,
        edited = result.figures.edited,
        created = result.figures.created,
        editors_fetched = result.editors_fetched,
        authors_fetched = result.authors_fetched,
        elapsed_ms = result.elapsed.as_millis(),
        "contributor pipeline complete"
    );

    Ok(result)
}
