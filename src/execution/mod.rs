//! Batch uploads with parallel preparation.
//!
//! Parsing and summarizing are pure, so a batch prepares every input on a rayon pool. Inserting
//! stays sequential and follows input order, which keeps ids, timestamps and retention identical
//! to uploading the inputs one by one.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use crate::error::DatasetResult;
use crate::pipeline::{prepare_upload, store_prepared, UploadOptions};
use crate::storage::DatasetStore;
use crate::types::Dataset;

/// Configuration for the [`BatchUploader`].
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Number of worker threads.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
}

/// One file of a batch.
#[derive(Debug, Clone)]
pub struct BatchInput {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl BatchInput {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Uploads many files, preparing them in parallel.
pub struct BatchUploader {
    pool: ThreadPool,
}

impl BatchUploader {
    pub fn new(opts: BatchOptions) -> Result<Self, ThreadPoolBuildError> {
        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1);

        let pool = ThreadPoolBuilder::new().num_threads(n_threads).build()?;
        Ok(Self { pool })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Upload every input; results are in input order.
    ///
    /// Each input succeeds or fails on its own. With the default retention, only the newest five
    /// successes of a large batch remain in the store afterwards.
    pub fn upload_all(
        &self,
        store: &DatasetStore,
        inputs: &[BatchInput],
        options: &UploadOptions,
    ) -> Vec<DatasetResult<Dataset>> {
        let prepared: Vec<_> = self.pool.install(|| {
            inputs
                .par_iter()
                .map(|input| prepare_upload(&input.filename, &input.bytes, options))
                .collect()
        });

        inputs
            .iter()
            .zip(prepared)
            .map(|(input, result)| store_prepared(store, &input.filename, result, options))
            .collect()
    }
}
