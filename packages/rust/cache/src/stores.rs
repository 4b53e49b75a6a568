//! File-backed implementations of the store abstraction.
//!
//! [`EditorTable`] persists editor-count records as CSV
//! (`username,count,qid`); [`AuthorStore`] persists the entity → creator
//! mapping as a JSON object. A missing backing file means "start empty" for
//! both; any other read failure is fatal.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use cellstats_shared::{AuthorMap, CellStatsError, EditorRecord, Qid, Result, csv};

use crate::KeyValueStore;

/// CSV header for the editor table.
const EDITOR_HEADER: [&str; 3] = ["username", "count", "qid"];

// ---------------------------------------------------------------------------
// EditorTable
// ---------------------------------------------------------------------------

/// Accumulated editor-count records, grouped by entity.
///
/// Rows are persisted grouped by entity in identifier order, so repeated
/// runs over the same data produce byte-identical files. Exact-duplicate
/// rows are removed on flush.
pub struct EditorTable {
    path: PathBuf,
    records: BTreeMap<Qid, Vec<EditorRecord>>,
}

impl EditorTable {
    /// Open the table at `path`, loading existing records if the file exists.
    pub fn open(path: &Path) -> Result<Self> {
        let mut table = Self {
            path: path.to_path_buf(),
            records: BTreeMap::new(),
        };

        if !path.exists() {
            debug!(path = %path.display(), "no editor table on disk, starting empty");
            return Ok(table);
        }

        let content = std::fs::read_to_string(path).map_err(|e| CellStatsError::io(path, e))?;
        let Some((header, rows)) = csv::decode(&content) else {
            return Ok(table);
        };

        let col = |name: &str| {
            header.iter().position(|h| h == name).ok_or_else(|| {
                CellStatsError::Cache(format!(
                    "editor table {} is missing column '{name}'",
                    path.display()
                ))
            })
        };
        let (u, c, q) = (col("username")?, col("count")?, col("qid")?);

        for row in rows {
            if row.len() <= u.max(c).max(q) {
                return Err(CellStatsError::Cache(format!(
                    "editor table {} has a short row",
                    path.display()
                )));
            }
            let count: u64 = row[c].parse().map_err(|_| {
                CellStatsError::Cache(format!(
                    "editor table {} has non-numeric count '{}'",
                    path.display(),
                    row[c]
                ))
            })?;
            let record = EditorRecord {
                username: row[u].clone(),
                count,
                qid: Qid::from(row[q].as_str()),
            };
            table.records.entry(record.qid.clone()).or_default().push(record);
        }

        debug!(
            entities = table.records.len(),
            path = %path.display(),
            "loaded editor table"
        );
        Ok(table)
    }

    /// All accumulated records, grouped by entity in identifier order.
    pub fn all_records(&self) -> impl Iterator<Item = &EditorRecord> {
        self.records.values().flatten()
    }

    /// The set of entities present in the table.
    pub fn known_qids(&self) -> HashSet<Qid> {
        self.records.keys().cloned().collect()
    }
}

impl KeyValueStore<Vec<EditorRecord>> for EditorTable {
    fn get(&self, key: &Qid) -> Option<&Vec<EditorRecord>> {
        self.records.get(key)
    }

    fn put(&mut self, key: Qid, value: Vec<EditorRecord>) {
        self.records.entry(key).or_default().extend(value);
    }

    fn flush(&mut self) -> Result<()> {
        // Exact-row dedup, keeping first-occurrence order within each entity.
        let mut seen: HashSet<EditorRecord> = HashSet::new();
        for per_entity in self.records.values_mut() {
            per_entity.retain(|r| seen.insert(r.clone()));
        }

        let rows: Vec<Vec<String>> = self
            .records
            .values()
            .flatten()
            .map(|record| {
                vec![
                    record.username.clone(),
                    record.count.to_string(),
                    record.qid.to_string(),
                ]
            })
            .collect();

        let content = csv::encode(&EDITOR_HEADER, &rows);
        std::fs::write(&self.path, content).map_err(|e| CellStatsError::io(&self.path, e))?;
        debug!(rows = rows.len(), path = %self.path.display(), "flushed editor table");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AuthorStore
// ---------------------------------------------------------------------------

/// Entity → page-creator mapping, persisted as a JSON object.
///
/// The map is append-only: once an entity has an author recorded, later
/// `put` calls for the same key are ignored, so a value is never refetched
/// or overwritten.
pub struct AuthorStore {
    path: PathBuf,
    map: AuthorMap,
}

impl AuthorStore {
    /// Open the store at `path`, loading the existing map if the file exists.
    pub fn open(path: &Path) -> Result<Self> {
        let map = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| CellStatsError::io(path, e))?;
            serde_json::from_str(&content).map_err(|e| {
                CellStatsError::Cache(format!("author map {} is not valid JSON: {e}", path.display()))
            })?
        } else {
            debug!(path = %path.display(), "no author map on disk, starting empty");
            AuthorMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            map,
        })
    }

    /// The accumulated entity → author mapping.
    pub fn map(&self) -> &AuthorMap {
        &self.map
    }
}

impl KeyValueStore<String> for AuthorStore {
    fn get(&self, key: &Qid) -> Option<&String> {
        self.map.get(key)
    }

    fn put(&mut self, key: Qid, value: String) {
        self.map.entry(key).or_insert(value);
    }

    fn flush(&mut self) -> Result<()> {
        let content = serde_json::to_string(&self.map)
            .map_err(|e| CellStatsError::Cache(format!("author map serialization: {e}")))?;
        std::fs::write(&self.path, content).map_err(|e| CellStatsError::io(&self.path, e))?;
        debug!(entries = self.map.len(), path = %self.path.display(), "flushed author map");
        Ok(())
    }
}
