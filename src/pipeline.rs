//! Upload pipeline: validate → parse → summarize → store.
//!
//! Most callers should use [`upload_bytes`] (or [`upload_from_path`]), which runs every pure
//! stage first and touches the [`DatasetStore`] only once the upload is known to be valid.
//!
//! If an [`UploadObserver`] is configured in [`UploadOptions`], success/failure/alerts are
//! reported to it.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::{DatasetError, DatasetResult};
use crate::ingestion::csv::parse_and_validate;
use crate::ingestion::observability::{UploadContext, UploadObserver, UploadSeverity, UploadStats};
use crate::processing::compute_summary;
use crate::storage::DatasetStore;
use crate::types::{Dataset, EquipmentRow, REQUIRED_COLUMNS, Summary};

/// Options controlling upload behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct UploadOptions {
    /// Headers for name, type, flowrate, pressure and temperature, in that order.
    pub required_columns: [String; 5],
    /// Reject file names that do not end in `.csv` (case-insensitive).
    pub require_csv_extension: bool,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn UploadObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: UploadSeverity,
}

impl fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadOptions")
            .field("required_columns", &self.required_columns)
            .field("require_csv_extension", &self.require_csv_extension)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            required_columns: REQUIRED_COLUMNS.map(String::from),
            require_csv_extension: true,
            observer: None,
            alert_at_or_above: UploadSeverity::Critical,
        }
    }
}

/// A validated, summarized upload that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedUpload {
    pub filename: String,
    pub rows: Vec<EquipmentRow>,
    pub summary: Summary,
}

/// Run every side-effect-free stage of an upload.
pub fn prepare_upload(
    filename: &str,
    bytes: &[u8],
    options: &UploadOptions,
) -> DatasetResult<PreparedUpload> {
    if options.require_csv_extension && !has_csv_extension(filename) {
        return Err(DatasetError::UnsupportedFormat {
            filename: filename.to_owned(),
        });
    }

    let columns: [&str; 5] = std::array::from_fn(|i| options.required_columns[i].as_str());
    let rows = parse_and_validate(bytes, &columns)?;
    let summary = compute_summary(&rows);

    Ok(PreparedUpload {
        filename: filename.to_owned(),
        rows,
        summary,
    })
}

/// Validate, summarize, and store an upload.
///
/// On success the stored [`Dataset`] is returned and older datasets beyond the store's
/// retention policy have been evicted. On failure nothing was stored.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with row/eviction stats
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// ```rust
/// use equipment_datasets::pipeline::{upload_bytes, UploadOptions};
/// use equipment_datasets::storage::DatasetStore;
///
/// # fn main() -> Result<(), equipment_datasets::DatasetError> {
/// let store = DatasetStore::in_memory();
/// let csv = "Equipment Name,Type,Flowrate,Pressure,Temperature\n\
///            Pump-1,Pump,10,5,100\n\
///            Valve-1,Valve,30,7,120\n";
///
/// let ds = upload_bytes(&store, "plant.csv", csv.as_bytes(), &UploadOptions::default())?;
/// assert_eq!(ds.summary.total_count, 2);
/// assert_eq!(ds.summary.avg_flowrate, 20.0);
/// assert_eq!(store.list_recent(5)[0].id, ds.id);
/// # Ok(())
/// # }
/// ```
pub fn upload_bytes(
    store: &DatasetStore,
    filename: &str,
    bytes: &[u8],
    options: &UploadOptions,
) -> DatasetResult<Dataset> {
    let result = prepare_upload(filename, bytes, options);
    store_prepared(store, filename, result, options)
}

/// Read `path` and upload it under its file name.
pub fn upload_from_path(
    store: &DatasetStore,
    path: impl AsRef<Path>,
    options: &UploadOptions,
) -> DatasetResult<Dataset> {
    let path = path.as_ref();
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let result = fs::read(path)
        .map_err(DatasetError::from)
        .and_then(|bytes| prepare_upload(&filename, &bytes, options));
    store_prepared(store, &filename, result, options)
}

/// Insert a prepared upload (or pass its error through) and report the outcome.
pub(crate) fn store_prepared(
    store: &DatasetStore,
    filename: &str,
    prepared: DatasetResult<PreparedUpload>,
    options: &UploadOptions,
) -> DatasetResult<Dataset> {
    let result = prepared.and_then(|p| store.insert_tracked(p.filename, p.rows, p.summary));

    let ctx = UploadContext {
        filename: filename.to_owned(),
    };
    match result {
        Ok(inserted) => {
            if let Some(obs) = options.observer.as_ref() {
                obs.on_success(
                    &ctx,
                    UploadStats {
                        dataset_id: inserted.dataset.id,
                        rows: inserted.dataset.rows.len(),
                        evicted: inserted.evicted.len(),
                    },
                );
            }
            Ok(inserted.dataset)
        }
        Err(e) => {
            if let Some(obs) = options.observer.as_ref() {
                let sev = severity_for_error(&e);
                obs.on_failure(&ctx, sev, &e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, &e);
                }
            }
            Err(e)
        }
    }
}

fn severity_for_error(e: &DatasetError) -> UploadSeverity {
    match e {
        DatasetError::Io(_) | DatasetError::Persistence { .. } => UploadSeverity::Critical,
        DatasetError::UnsupportedFormat { .. }
        | DatasetError::MissingColumns { .. }
        | DatasetError::MalformedFile { .. }
        | DatasetError::TypeConversion { .. } => UploadSeverity::Error,
    }
}

fn has_csv_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// An owned upload, e.g. for handing work to a job queue.
#[derive(Clone)]
pub struct UploadRequest {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub options: UploadOptions,
}

impl fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("filename", &self.filename)
            .field("bytes_len", &self.bytes.len())
            .field("options", &self.options)
            .finish()
    }
}

impl UploadRequest {
    /// Execute the request by calling [`upload_bytes`].
    pub fn run(&self, store: &DatasetStore) -> DatasetResult<Dataset> {
        upload_bytes(store, &self.filename, &self.bytes, &self.options)
    }
}
