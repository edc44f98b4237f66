//! Dataset persistence with bounded retention.
//!
//! [`DatasetStore`] owns every stored [`Dataset`]. Inserting a dataset and trimming the store
//! back to [`RetentionPolicy::keep`] happen under one write lock, so no reader ever observes more
//! than `keep` datasets or a dataset that is only partially recorded.
//!
//! ```rust
//! use equipment_datasets::processing::compute_summary;
//! use equipment_datasets::storage::DatasetStore;
//! use equipment_datasets::types::EquipmentRow;
//!
//! # fn main() -> Result<(), equipment_datasets::DatasetError> {
//! let store = DatasetStore::in_memory();
//! for i in 0..7 {
//!     let rows = vec![EquipmentRow::new("Pump-1", "Pump", 10.0, 5.0, 100.0)];
//!     let summary = compute_summary(&rows);
//!     store.insert(format!("upload-{i}.csv"), rows, summary)?;
//! }
//!
//! let recent = store.list_recent(10);
//! assert_eq!(recent.len(), 5);
//! assert_eq!(recent[0].filename, "upload-6.csv");
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod json_dir;

use std::cmp::Ordering;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockWriteGuard};

use chrono::Utc;

use crate::error::{DatasetError, DatasetResult};
use crate::types::{Dataset, DatasetId, DatasetListing, EquipmentRow, Summary};

pub use backend::{DatasetBackend, MemoryBackend};
pub use json_dir::JsonDirBackend;

/// Number of datasets kept by default.
pub const DEFAULT_RETENTION: usize = 5;

/// How many of the most recent datasets a store keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    keep: usize,
}

impl RetentionPolicy {
    /// Keep the newest `n` datasets. A store always keeps at least the dataset just inserted,
    /// so `n` is raised to 1 if smaller.
    pub fn keep_latest(n: usize) -> Self {
        Self { keep: n.max(1) }
    }

    /// Number of datasets kept; always at least 1.
    pub fn keep(&self) -> usize {
        self.keep
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            keep: DEFAULT_RETENTION,
        }
    }
}

/// Outcome of [`DatasetStore::insert_tracked`].
#[derive(Debug, Clone)]
pub struct Inserted {
    /// The stored dataset.
    pub dataset: Dataset,
    /// Datasets removed by the retention policy as part of this insert.
    pub evicted: Vec<DatasetId>,
}

#[derive(Debug)]
struct StoreState {
    /// Newest first.
    datasets: Vec<Dataset>,
    next_id: u64,
}

/// Thread-safe, retention-capped collection of datasets, newest first.
///
/// Share it between request handlers with an `Arc<DatasetStore>`.
pub struct DatasetStore {
    state: RwLock<StoreState>,
    backend: Box<dyn DatasetBackend>,
    policy: RetentionPolicy,
}

impl fmt::Debug for DatasetStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetStore")
            .field("len", &self.len())
            .field("policy", &self.policy)
            .finish()
    }
}

impl DatasetStore {
    /// Create an empty process-local store.
    ///
    /// Stores over a durable backend are built with [`Self::open`], which resumes ids after
    /// whatever the backend already holds.
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            state: RwLock::new(StoreState {
                datasets: Vec::new(),
                next_id: 1,
            }),
            backend: Box::new(MemoryBackend),
            policy,
        }
    }

    /// Process-local store with the default retention of five datasets.
    pub fn in_memory() -> Self {
        Self::new(RetentionPolicy::default())
    }

    /// Open a store over `backend`, loading every dataset it already holds.
    ///
    /// Loaded datasets are ordered, the id counter resumes after the largest stored id, and the
    /// retention policy is applied immediately. New ids never collide with persisted ones.
    pub fn open(backend: impl DatasetBackend + 'static, policy: RetentionPolicy) -> DatasetResult<Self> {
        let mut datasets = backend.load_all()?;
        datasets.sort_by(newest_first);
        let next_id = datasets.iter().map(|d| d.id.0).max().unwrap_or(0) + 1;

        let store = Self {
            state: RwLock::new(StoreState { datasets, next_id }),
            backend: Box::new(backend),
            policy,
        };
        {
            let mut state = store.write_state()?;
            let evicted = store.evict_locked(&mut state, policy.keep());
            tracing::debug!(
                loaded = state.datasets.len() + evicted.len(),
                evicted = evicted.len(),
                "dataset store opened"
            );
        }
        Ok(store)
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// Store a new dataset and evict everything beyond the retention policy.
    ///
    /// The id and upload timestamp are assigned here. If the backend fails to persist the
    /// dataset, [`DatasetError::Persistence`] is returned and the store is left unchanged.
    pub fn insert(
        &self,
        filename: impl Into<String>,
        rows: Vec<EquipmentRow>,
        summary: Summary,
    ) -> DatasetResult<Dataset> {
        self.insert_tracked(filename, rows, summary)
            .map(|inserted| inserted.dataset)
    }

    /// Like [`Self::insert`], also reporting which datasets were evicted.
    pub fn insert_tracked(
        &self,
        filename: impl Into<String>,
        rows: Vec<EquipmentRow>,
        summary: Summary,
    ) -> DatasetResult<Inserted> {
        let mut state = self.write_state()?;

        // Timestamps never go backwards within a store, even if the wall clock does.
        let now = Utc::now();
        let uploaded_at = match state.datasets.first() {
            Some(newest) if newest.uploaded_at > now => newest.uploaded_at,
            _ => now,
        };

        let dataset = Dataset {
            id: DatasetId(state.next_id),
            filename: filename.into(),
            uploaded_at,
            rows,
            summary,
        };

        self.backend.persist(&dataset)?;

        state.next_id += 1;
        state.datasets.push(dataset.clone());
        let evicted = self.evict_locked(&mut state, self.policy.keep());

        tracing::debug!(
            id = dataset.id.0,
            file = %dataset.filename,
            rows = dataset.rows.len(),
            evicted = evicted.len(),
            "dataset inserted"
        );

        Ok(Inserted { dataset, evicted })
    }

    /// Delete every dataset ranked beyond `keep` (newest first, ties by id), returning the
    /// evicted ids.
    pub fn evict_excess(&self, keep: usize) -> DatasetResult<Vec<DatasetId>> {
        let mut state = self.write_state()?;
        Ok(self.evict_locked(&mut state, keep))
    }

    /// Up to `n` datasets without their rows, newest first.
    pub fn list_recent(&self, n: usize) -> Vec<DatasetListing> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.datasets.iter().take(n).map(Dataset::listing).collect()
    }

    /// Fetch one dataset, with rows.
    pub fn get(&self, id: DatasetId) -> Option<Dataset> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.datasets.iter().find(|d| d.id == id).cloned()
    }

    /// Fetch only the summary of one dataset.
    pub fn summary(&self, id: DatasetId) -> Option<Summary> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .datasets
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.summary.clone())
    }

    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .datasets
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write_state(&self) -> DatasetResult<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|_| DatasetError::persistence("dataset store lock poisoned"))
    }

    fn evict_locked(&self, state: &mut StoreState, keep: usize) -> Vec<DatasetId> {
        state.datasets.sort_by(newest_first);
        if state.datasets.len() <= keep {
            return Vec::new();
        }

        let evicted: Vec<DatasetId> = state.datasets.split_off(keep).iter().map(|d| d.id).collect();
        for &id in &evicted {
            // The dataset is already gone from the store; a stale file is dropped on next open.
            if let Err(e) = self.backend.remove(id) {
                tracing::warn!(id = id.0, error = %e, "failed to remove evicted dataset");
            } else {
                tracing::debug!(id = id.0, "dataset evicted");
            }
        }
        evicted
    }
}

fn newest_first(a: &Dataset, b: &Dataset) -> Ordering {
    b.uploaded_at
        .cmp(&a.uploaded_at)
        .then_with(|| b.id.cmp(&a.id))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;

    use chrono::{TimeZone, Utc};

    use super::{DatasetBackend, DatasetStore, RetentionPolicy};
    use crate::error::{DatasetError, DatasetResult, ErrorKind};
    use crate::processing::compute_summary;
    use crate::types::{Dataset, DatasetId, EquipmentRow};

    fn rows() -> Vec<EquipmentRow> {
        vec![
            EquipmentRow::new("Pump-1", "Pump", 120.0, 5.2, 110.0),
            EquipmentRow::new("Valve-1", "Valve", 60.0, 4.1, 105.0),
        ]
    }

    fn insert_named(store: &DatasetStore, name: &str) -> Dataset {
        let rows = rows();
        let summary = compute_summary(&rows);
        store.insert(name, rows, summary).unwrap()
    }

    /// Backend whose writes can be switched to fail; records removals.
    #[derive(Default)]
    struct FlakyBackend {
        fail_persist: AtomicBool,
        removed: Mutex<Vec<DatasetId>>,
        preloaded: Vec<Dataset>,
    }

    impl DatasetBackend for Arc<FlakyBackend> {
        fn persist(&self, _dataset: &Dataset) -> DatasetResult<()> {
            if self.fail_persist.load(Ordering::SeqCst) {
                return Err(DatasetError::Persistence {
                    message: "storage unavailable".to_string(),
                });
            }
            Ok(())
        }

        fn remove(&self, id: DatasetId) -> DatasetResult<()> {
            self.removed.lock().unwrap().push(id);
            Ok(())
        }

        fn load_all(&self) -> DatasetResult<Vec<Dataset>> {
            Ok(self.preloaded.clone())
        }
    }

    #[test]
    fn keeps_only_five_newest_after_seven_inserts() {
        let store = DatasetStore::in_memory();
        for i in 1..=7 {
            insert_named(&store, &format!("upload-{i}.csv"));
        }

        assert_eq!(store.len(), 5);
        let recent = store.list_recent(5);
        let names: Vec<&str> = recent.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(
            names,
            vec!["upload-7.csv", "upload-6.csv", "upload-5.csv", "upload-4.csv", "upload-3.csv"]
        );
        for pair in recent.windows(2) {
            assert!(
                (pair[0].uploaded_at, pair[0].id) > (pair[1].uploaded_at, pair[1].id),
                "listing must be strictly newest first"
            );
        }
    }

    #[test]
    fn evicted_datasets_are_gone_and_removed_from_backend() {
        let backend = Arc::new(FlakyBackend::default());
        let store = DatasetStore::open(Arc::clone(&backend), RetentionPolicy::default()).unwrap();
        let first = insert_named(&store, "first.csv");
        for i in 0..5 {
            insert_named(&store, &format!("later-{i}.csv"));
        }

        assert!(store.get(first.id).is_none());
        assert!(store.summary(first.id).is_none());
        assert_eq!(*backend.removed.lock().unwrap(), vec![first.id]);
    }

    #[test]
    fn list_recent_returns_what_exists() {
        let store = DatasetStore::in_memory();
        assert!(store.list_recent(5).is_empty());
        insert_named(&store, "a.csv");
        insert_named(&store, "b.csv");
        assert_eq!(store.list_recent(5).len(), 2);
        assert_eq!(store.list_recent(1)[0].filename, "b.csv");
        assert!(store.list_recent(0).is_empty());
    }

    #[test]
    fn get_returns_rows_and_summary() {
        let store = DatasetStore::in_memory();
        let ds = insert_named(&store, "a.csv");
        let fetched = store.get(ds.id).unwrap();
        assert_eq!(fetched, ds);
        assert_eq!(fetched.rows.len(), 2);
        assert_eq!(store.summary(ds.id), Some(ds.summary));
        assert!(store.get(DatasetId(999)).is_none());
    }

    #[test]
    fn ids_increase_and_timestamps_never_decrease() {
        let store = DatasetStore::in_memory();
        let a = insert_named(&store, "a.csv");
        let b = insert_named(&store, "b.csv");
        assert!(b.id > a.id);
        assert!(b.uploaded_at >= a.uploaded_at);
    }

    #[test]
    fn failed_persist_leaves_store_unchanged() {
        let backend = Arc::new(FlakyBackend::default());
        let store = DatasetStore::open(Arc::clone(&backend), RetentionPolicy::default()).unwrap();
        for i in 0..5 {
            insert_named(&store, &format!("ok-{i}.csv"));
        }
        let before = store.list_recent(5);

        backend.fail_persist.store(true, Ordering::SeqCst);
        let rows = rows();
        let summary = compute_summary(&rows);
        let err = store.insert("broken.csv", rows, summary).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Persistence);

        assert_eq!(store.list_recent(5), before);
        assert!(backend.removed.lock().unwrap().is_empty());

        // The failed attempt does not consume an id.
        backend.fail_persist.store(false, Ordering::SeqCst);
        let next = insert_named(&store, "ok-5.csv");
        assert_eq!(next.id, DatasetId(before[0].id.0 + 1));
    }

    #[test]
    fn identical_timestamps_break_ties_by_id() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let preloaded = (1..=7)
            .map(|i| Dataset {
                id: DatasetId(i),
                filename: format!("same-{i}.csv"),
                uploaded_at: ts,
                rows: Vec::new(),
                summary: compute_summary(&[]),
            })
            .collect();
        let backend = Arc::new(FlakyBackend {
            preloaded,
            ..Default::default()
        });

        let store = DatasetStore::open(Arc::clone(&backend), RetentionPolicy::default()).unwrap();
        let ids: Vec<u64> = store.list_recent(5).iter().map(|d| d.id.0).collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3]);

        let mut removed = backend.removed.lock().unwrap().clone();
        removed.sort();
        assert_eq!(removed, vec![DatasetId(1), DatasetId(2)]);

        // New inserts continue after the largest loaded id.
        let next = insert_named(&store, "next.csv");
        assert_eq!(next.id, DatasetId(8));
        assert_eq!(store.list_recent(1)[0].id, DatasetId(8));
    }

    #[test]
    fn explicit_eviction_trims_to_requested_size() {
        let store = DatasetStore::in_memory();
        for i in 0..4 {
            insert_named(&store, &format!("{i}.csv"));
        }
        let evicted = store.evict_excess(2).unwrap();
        assert_eq!(evicted.len(), 2);
        assert_eq!(store.len(), 2);
        assert!(store.evict_excess(2).unwrap().is_empty());
    }

    #[test]
    fn keep_latest_never_drops_below_one() {
        assert_eq!(RetentionPolicy::keep_latest(0).keep(), 1);
        assert_eq!(RetentionPolicy::keep_latest(3).keep(), 3);
        assert_eq!(RetentionPolicy::default().keep(), 5);
    }

    #[test]
    fn smallest_retention_still_keeps_the_inserted_dataset() {
        let store = DatasetStore::new(RetentionPolicy::keep_latest(0));
        let first = insert_named(&store, "first.csv");
        assert_eq!(store.get(first.id), Some(first.clone()));
        assert_eq!(store.len(), 1);

        let second = insert_named(&store, "second.csv");
        assert!(store.get(first.id).is_none());
        assert_eq!(store.get(second.id), Some(second));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn concurrent_inserts_never_exceed_retention() {
        let store = Arc::new(DatasetStore::in_memory());
        let done = Arc::new(AtomicBool::new(false));

        let reader = {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut max_seen = 0;
                while !done.load(Ordering::SeqCst) {
                    max_seen = max_seen.max(store.list_recent(usize::MAX).len());
                }
                max_seen
            })
        };

        let writers: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..10 {
                        insert_named(&store, &format!("t{t}-{i}.csv"));
                    }
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }
        done.store(true, Ordering::SeqCst);
        let max_seen = reader.join().unwrap();

        assert!(max_seen <= 5);
        let ids: Vec<u64> = store.list_recent(5).iter().map(|d| d.id.0).collect();
        assert_eq!(ids, vec![80, 79, 78, 77, 76]);
    }
}
