//! Filesystem backend storing one JSON document per dataset.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{DatasetError, DatasetResult};
use crate::types::{Dataset, DatasetId};

use super::backend::DatasetBackend;

const FILE_PREFIX: &str = "dataset-";
const FILE_SUFFIX: &str = ".json";
const TMP_SUFFIX: &str = ".json.tmp";

/// Stores datasets as `dataset-<id>.json` files under a root directory.
///
/// Writes go to a temporary file first and are renamed into place, so a crashed write never
/// leaves a truncated dataset behind. Temporary files left by a crash are deleted by
/// [`DatasetBackend::load_all`]; one store owns a directory at a time.
#[derive(Debug, Clone)]
pub struct JsonDirBackend {
    root: PathBuf,
}

impl JsonDirBackend {
    /// Create a backend rooted at `root`. The directory is created on first write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dataset_path(&self, id: DatasetId) -> PathBuf {
        self.root.join(format!("{FILE_PREFIX}{:010}{FILE_SUFFIX}", id.0))
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        let tmp = path.with_extension("json.tmp");
        let written = fs::File::create(&tmp)
            .and_then(|mut f| f.write_all(bytes).and_then(|()| f.sync_all()))
            .and_then(|()| fs::rename(&tmp, path));
        if written.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        written
    }
}

impl DatasetBackend for JsonDirBackend {
    fn persist(&self, dataset: &Dataset) -> DatasetResult<()> {
        let bytes = serde_json::to_vec_pretty(dataset).map_err(|e| {
            DatasetError::persistence(format!("failed to encode dataset {}: {e}", dataset.id))
        })?;
        let path = self.dataset_path(dataset.id);
        self.write_atomic(&path, &bytes).map_err(|e| {
            DatasetError::persistence(format!("failed to write {}: {e}", path.display()))
        })
    }

    fn remove(&self, id: DatasetId) -> DatasetResult<()> {
        let path = self.dataset_path(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DatasetError::persistence(format!(
                "failed to remove {}: {e}",
                path.display()
            ))),
        }
    }

    fn load_all(&self) -> DatasetResult<Vec<Dataset>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(DatasetError::persistence(format!(
                    "failed to list {}: {e}",
                    self.root.display()
                )));
            }
        };

        let mut out = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                DatasetError::persistence(format!("failed to list {}: {e}", self.root.display()))
            })?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name.starts_with(FILE_PREFIX) && name.ends_with(TMP_SUFFIX) {
                match fs::remove_file(entry.path()) {
                    Ok(()) => tracing::debug!(file = name, "removed unfinished dataset write"),
                    Err(e) => tracing::warn!(file = name, error = %e, "failed to remove unfinished dataset write"),
                }
                continue;
            }
            if !(name.starts_with(FILE_PREFIX) && name.ends_with(FILE_SUFFIX)) {
                continue;
            }

            let path = entry.path();
            let bytes = fs::read(&path).map_err(|e| {
                DatasetError::persistence(format!("failed to read {}: {e}", path.display()))
            })?;
            let dataset: Dataset = serde_json::from_slice(&bytes).map_err(|e| {
                DatasetError::persistence(format!("failed to decode {}: {e}", path.display()))
            })?;
            out.push(dataset);
        }
        Ok(out)
    }
}
