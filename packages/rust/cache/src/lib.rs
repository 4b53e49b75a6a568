//! Incremental flat-file caches for per-entity remote lookups.
//!
//! Fetching editor and author data costs one HTTP round trip per entity, so
//! both pipelines persist what they have fetched and only hit the network
//! for entities not yet present. The [`KeyValueStore`] trait is the explicit
//! store abstraction (`get`/`put`/`flush`); [`EditorTable`] and
//! [`AuthorStore`] back it with the CSV and JSON files the artifacts are
//! published as.
//!
//! [`merge_missing`] drives the accumulate step: one sequential fetch per
//! unknown key, merged into the store, with the full store rewritten to disk
//! only by an explicit `flush` once the merge completes. A failed fetch
//! therefore loses in-memory progress but never corrupts the persisted file.

mod stores;

use std::future::Future;

use tracing::{debug, info};

use cellstats_shared::{Qid, Result};

pub use stores::{AuthorStore, EditorTable};

// ---------------------------------------------------------------------------
// KeyValueStore
// ---------------------------------------------------------------------------

/// Explicit store abstraction over the flat-file caches.
///
/// Implementations hold the accumulated state in memory; `flush` rewrites
/// the whole backing file (no appends, no partial writes).
pub trait KeyValueStore<V> {
    /// Look up the value accumulated for `key`, if any.
    fn get(&self, key: &Qid) -> Option<&V>;

    /// Merge `value` into the store under `key`.
    fn put(&mut self, key: Qid, value: V);

    /// Rewrite the backing file from the full in-memory state.
    fn flush(&mut self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Incremental merge
// ---------------------------------------------------------------------------

/// Fetch and merge values for every working-set key not already in `store`.
///
/// Keys are visited in working-set order and fetched one at a time; a key
/// already present (from a prior run, or earlier in this one) is never
/// refetched. `on_key` observes progress as `(position, total)` over the
/// working set. Returns the number of fetches performed.
///
/// The caller flushes afterwards; a fetch or shape error propagates out
/// before any write happens.
pub async fn merge_missing<V, S, F, Fut>(
    store: &mut S,
    working_set: &[Qid],
    fetch: F,
    mut on_key: impl FnMut(usize, usize),
) -> Result<usize>
where
    S: KeyValueStore<V>,
    F: Fn(Qid) -> Fut,
    Fut: Future<Output = Result<V>>,
{
    let total = working_set.len();
    let mut fetched = 0usize;

    for (i, qid) in working_set.iter().enumerate() {
        on_key(i + 1, total);

        if store.get(qid).is_some() {
            debug!(%qid, "already cached, skipping fetch");
            continue;
        }

        let value = fetch(qid.clone()).await?;
        store.put(qid.clone(), value);
        fetched += 1;
    }

    info!(total, fetched, "incremental merge complete");
    Ok(fetched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellstats_shared::EditorRecord;
    use std::cell::Cell;

    fn record(username: &str, count: u64, qid: &str) -> EditorRecord {
        EditorRecord {
            username: username.into(),
            count,
            qid: Qid::from(qid),
        }
    }

    #[tokio::test]
    async fn fetches_only_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editors.csv");
        let mut table = EditorTable::open(&path).unwrap();
        table.put(Qid::from("Q1"), vec![record("alice", 2, "Q1")]);

        let calls = Cell::new(0usize);
        let working = vec![Qid::from("Q1"), Qid::from("Q2")];

        let fetched = merge_missing(
            &mut table,
            &working,
            |qid| {
                calls.set(calls.get() + 1);
                async move { Ok(vec![record("bob", 1, qid.as_str())]) }
            },
            |_, _| {},
        )
        .await
        .unwrap();

        assert_eq!(fetched, 1);
        assert_eq!(calls.get(), 1);
        assert!(table.get(&Qid::from("Q2")).is_some());
    }

    #[tokio::test]
    async fn second_run_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editors.csv");
        let working = vec![Qid::from("Q1"), Qid::from("Q2")];

        {
            let mut table = EditorTable::open(&path).unwrap();
            merge_missing(
                &mut table,
                &working,
                |qid| async move { Ok(vec![record("alice", 3, qid.as_str())]) },
                |_, _| {},
            )
            .await
            .unwrap();
            table.flush().unwrap();
        }
        let first = std::fs::read_to_string(&path).unwrap();

        // Reload and merge again: nothing new to fetch, identical file.
        {
            let mut table = EditorTable::open(&path).unwrap();
            let calls = Cell::new(0usize);
            let fetched = merge_missing(
                &mut table,
                &working,
                |qid| {
                    calls.set(calls.get() + 1);
                    async move { Ok(vec![record("alice", 3, qid.as_str())]) }
                },
                |_, _| {},
            )
            .await
            .unwrap();
            assert_eq!(fetched, 0);
            assert_eq!(calls.get(), 0);
            table.flush().unwrap();
        }
        let second = std::fs::read_to_string(&path).unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn fetch_error_aborts_without_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editors.csv");
        let mut table = EditorTable::open(&path).unwrap();

        let working = vec![Qid::from("Q1")];
        let result = merge_missing(
            &mut table,
            &working,
            |_qid| async move {
                Err::<Vec<EditorRecord>, _>(cellstats_shared::CellStatsError::Network(
                    "boom".into(),
                ))
            },
            |_, _| {},
        )
        .await;

        assert!(result.is_err());
        // The persisted file was never written.
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn progress_observes_every_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = EditorTable::open(&dir.path().join("editors.csv")).unwrap();
        let working = vec![Qid::from("Q1"), Qid::from("Q2"), Qid::from("Q3")];

        let mut seen = Vec::new();
        merge_missing(
            &mut table,
            &working,
            |qid| async move { Ok(vec![record("x", 1, qid.as_str())]) },
            |pos, total| seen.push((pos, total)),
        )
        .await
        .unwrap();

        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }
}
