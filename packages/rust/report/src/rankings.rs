//! Top-editor rankings over the accumulated editor table.
//!
//! The table is reshaped into an (entity × username) count matrix with
//! missing entries treated as zero, then ranked two ways: by total edit
//! count and by number of distinct entities touched. The rankings are
//! logged and returned for display; they are intentionally not persisted.

use std::collections::BTreeMap;

use tracing::info;

use cellstats_shared::{EditorRecord, Qid};

/// One ranked username with its metric value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEditor {
    /// Editor username.
    pub username: String,
    /// Metric value (total edits, or distinct entities).
    pub value: u64,
}

/// (entity × username) edit-count matrix.
///
/// Stored sparsely per username; absent cells count as zero.
#[derive(Debug, Default)]
pub struct EditorMatrix {
    cells: BTreeMap<String, BTreeMap<Qid, u64>>,
}

impl EditorMatrix {
    /// Build the matrix from accumulated editor records.
    ///
    /// Duplicate (username, entity) pairs accumulate, matching how repeated
    /// rows would pivot after dedup upstream.
    pub fn build<'a>(records: impl Iterator<Item = &'a EditorRecord>) -> Self {
        let mut cells: BTreeMap<String, BTreeMap<Qid, u64>> = BTreeMap::new();
        for record in records {
            *cells
                .entry(record.username.clone())
                .or_default()
                .entry(record.qid.clone())
                .or_default() += record.count;
        }
        Self { cells }
    }

    /// Top `n` usernames by total edit count, descending (ties by username).
    pub fn top_by_total_edits(&self, n: usize) -> Vec<RankedEditor> {
        let mut ranked: Vec<RankedEditor> = self
            .cells
            .iter()
            .map(|(username, per_entity)| RankedEditor {
                username: username.clone(),
                value: per_entity.values().sum(),
            })
            .collect();
        ranked.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.username.cmp(&b.username)));
        ranked.truncate(n);
        ranked
    }

    /// Top `n` usernames by distinct entities edited, descending (ties by
    /// username).
    pub fn top_by_entity_count(&self, n: usize) -> Vec<RankedEditor> {
        let mut ranked: Vec<RankedEditor> = self
            .cells
            .iter()
            .map(|(username, per_entity)| RankedEditor {
                username: username.clone(),
                value: per_entity.len() as u64,
            })
            .collect();
        ranked.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.username.cmp(&b.username)));
        ranked.truncate(n);
        ranked
    }

    /// Log both top-10 rankings at info level.
    pub fn log_top_rankings(&self) {
        for editor in self.top_by_total_edits(10) {
            info!(
                username = %editor.username,
                total_edits = editor.value,
                "top editor by total edits"
            );
        }
        for editor in self.top_by_entity_count(10) {
            info!(
                username = %editor.username,
                entities = editor.value,
                "top editor by distinct entities"
            );
        }
    }
}
