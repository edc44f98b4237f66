use crate::error::DatasetResult;
use crate::types::{Dataset, DatasetId};

/// Durable storage behind a [`super::DatasetStore`].
///
/// The store calls these methods while holding its write lock, so implementations never see two
/// writes at once from the same store.
pub trait DatasetBackend: Send + Sync {
    /// Durably record a newly created dataset. On error the store discards the dataset.
    fn persist(&self, dataset: &Dataset) -> DatasetResult<()>;

    /// Delete an evicted dataset, including its rows. Removing an unknown id is not an error.
    fn remove(&self, id: DatasetId) -> DatasetResult<()>;

    /// Load every dataset previously persisted, in any order.
    fn load_all(&self) -> DatasetResult<Vec<Dataset>>;
}

/// Backend for process-local stores; the [`super::DatasetStore`] holds the only copy.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryBackend;

impl DatasetBackend for MemoryBackend {
    fn persist(&self, _dataset: &Dataset) -> DatasetResult<()> {
        Ok(())
    }

    fn remove(&self, _id: DatasetId) -> DatasetResult<()> {
        Ok(())
    }

    fn load_all(&self) -> DatasetResult<Vec<Dataset>> {
        Ok(Vec::new())
    }
}
