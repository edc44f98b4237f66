//! Hooks for reporting upload outcomes.
//!
//! The pipeline calls one [`UploadObserver`] per upload. [`TracingObserver`] forwards to
//! `tracing`, [`FileObserver`] keeps an append-only log, and [`CompositeObserver`] fans out to
//! several observers.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{SecondsFormat, Utc};

use crate::error::DatasetError;
use crate::types::DatasetId;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UploadSeverity {
    /// Reserved for informational reports from custom callers.
    Info,
    /// Non-fatal problem.
    Warning,
    /// The upload was rejected.
    Error,
    /// Infrastructure failure (I/O, persistence).
    Critical,
}

/// Context about an upload attempt.
#[derive(Debug, Clone)]
pub struct UploadContext {
    /// Original file name supplied by the caller.
    pub filename: String,
}

/// Stats reported on a successful upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadStats {
    pub dataset_id: DatasetId,
    pub rows: usize,
    /// Number of older datasets removed by the retention policy.
    pub evicted: usize,
}

/// Receives the outcome of every upload routed through [`crate::pipeline`].
pub trait UploadObserver: Send + Sync {
    /// Called when an upload has been stored.
    fn on_success(&self, _ctx: &UploadContext, _stats: UploadStats) {}

    /// Called when an upload is rejected or cannot be stored.
    fn on_failure(&self, _ctx: &UploadContext, _severity: UploadSeverity, _error: &DatasetError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &UploadContext, severity: UploadSeverity, error: &DatasetError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Fans out callbacks to a list of observers, in insertion order.
#[derive(Default, Clone)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn UploadObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn UploadObserver>>) -> Self {
        Self { observers }
    }

    /// Add another observer to the end of the list.
    pub fn push(&mut self, observer: Arc<dyn UploadObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("len", &self.observers.len())
            .finish()
    }
}

impl UploadObserver for CompositeObserver {
    fn on_success(&self, ctx: &UploadContext, stats: UploadStats) {
        self.observers.iter().for_each(|o| o.on_success(ctx, stats));
    }

    fn on_failure(&self, ctx: &UploadContext, severity: UploadSeverity, error: &DatasetError) {
        self.observers
            .iter()
            .for_each(|o| o.on_failure(ctx, severity, error));
    }

    fn on_alert(&self, ctx: &UploadContext, severity: UploadSeverity, error: &DatasetError) {
        self.observers
            .iter()
            .for_each(|o| o.on_alert(ctx, severity, error));
    }
}

/// Forwards upload events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl UploadObserver for TracingObserver {
    fn on_success(&self, ctx: &UploadContext, stats: UploadStats) {
        tracing::info!(
            file = %ctx.filename,
            id = stats.dataset_id.0,
            rows = stats.rows,
            evicted = stats.evicted,
            "upload stored"
        );
    }

    fn on_failure(&self, ctx: &UploadContext, severity: UploadSeverity, error: &DatasetError) {
        match severity {
            UploadSeverity::Info => tracing::info!(file = %ctx.filename, kind = error.kind().as_str(), %error, "upload failed"),
            UploadSeverity::Warning => tracing::warn!(file = %ctx.filename, kind = error.kind().as_str(), %error, "upload failed"),
            UploadSeverity::Error | UploadSeverity::Critical => {
                tracing::error!(file = %ctx.filename, kind = error.kind().as_str(), ?severity, %error, "upload failed")
            }
        }
    }

    fn on_alert(&self, ctx: &UploadContext, severity: UploadSeverity, error: &DatasetError) {
        tracing::error!(
            alert = true,
            file = %ctx.filename,
            kind = error.kind().as_str(),
            ?severity,
            %error,
            "upload alert"
        );
    }
}

/// One reported outcome, as written to an upload log.
#[derive(Debug, Clone, Copy)]
enum UploadEvent<'a> {
    Stored(UploadStats),
    Failed(UploadSeverity, &'a DatasetError),
    Alert(UploadSeverity, &'a DatasetError),
}

impl UploadEvent<'_> {
    fn label(&self) -> &'static str {
        match self {
            UploadEvent::Stored(_) => "ok",
            UploadEvent::Failed(..) => "fail",
            UploadEvent::Alert(..) => "ALERT",
        }
    }
}

impl fmt::Display for UploadEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadEvent::Stored(stats) => write!(
                f,
                "id={} rows={} evicted={}",
                stats.dataset_id, stats.rows, stats.evicted
            ),
            UploadEvent::Failed(severity, error) | UploadEvent::Alert(severity, error) => write!(
                f,
                "severity={severity:?} kind={} err={error}",
                error.kind().as_str()
            ),
        }
    }
}

/// Appends one line per upload event to a log file:
/// `<RFC 3339 UTC timestamp> <ok|fail|ALERT> file=<name> <details>`.
///
/// The file is opened on the first event and kept open. Logging is best-effort: an I/O error is
/// reported through `tracing::warn!` and the handle is reopened on the next event.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl FileObserver {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(&self, ctx: &UploadContext, event: UploadEvent<'_>) {
        let line = format!(
            "{} {} file={} {event}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            event.label(),
            ctx.filename,
        );

        let mut slot = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = Self::append(&mut slot, &self.path, &line) {
            *slot = None;
            tracing::warn!(path = %self.path.display(), error = %e, "failed to write upload log");
        }
    }

    fn append(slot: &mut Option<File>, path: &Path, line: &str) -> io::Result<()> {
        let file = match slot.take() {
            Some(file) => file,
            None => OpenOptions::new().create(true).append(true).open(path)?,
        };
        writeln!(slot.insert(file), "{line}")
    }
}

impl UploadObserver for FileObserver {
    fn on_success(&self, ctx: &UploadContext, stats: UploadStats) {
        self.record(ctx, UploadEvent::Stored(stats));
    }

    fn on_failure(&self, ctx: &UploadContext, severity: UploadSeverity, error: &DatasetError) {
        self.record(ctx, UploadEvent::Failed(severity, error));
    }

    fn on_alert(&self, ctx: &UploadContext, severity: UploadSeverity, error: &DatasetError) {
        self.record(ctx, UploadEvent::Alert(severity, error));
    }
}
