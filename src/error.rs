use thiserror::Error;

/// Convenience result type for upload and storage operations.
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Error type returned by parsing, the upload pipeline, and the dataset store.
///
/// Every failure rejects the whole upload; nothing is ever stored partially.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Underlying I/O error while reading an upload from disk.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The upload's file name does not carry a `.csv` extension.
    #[error("unsupported file '{filename}': file must be a CSV")]
    UnsupportedFormat { filename: String },

    /// The header is missing one or more required columns.
    #[error("missing columns: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// The bytes could not be read as comma-separated text.
    #[error("malformed csv: {message}")]
    MalformedFile { message: String },

    /// A required value was empty, non-numeric, or not finite.
    #[error("failed to convert value at row {row} column '{column}': {message} (raw='{raw}')")]
    TypeConversion {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// The store could not durably record (or load) datasets.
    #[error("persistence failed: {message}")]
    Persistence { message: String },
}

/// Stable, machine-distinguishable classification of a [`DatasetError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Io,
    UnsupportedFormat,
    MissingColumns,
    MalformedFile,
    TypeConversion,
    Persistence,
}

impl ErrorKind {
    /// Short identifier suitable for API responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Io => "io",
            Self::UnsupportedFormat => "unsupported_format",
            Self::MissingColumns => "missing_columns",
            Self::MalformedFile => "malformed_file",
            Self::TypeConversion => "type_conversion",
            Self::Persistence => "persistence",
        }
    }
}

impl DatasetError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::MissingColumns { .. } => ErrorKind::MissingColumns,
            Self::MalformedFile { .. } => ErrorKind::MalformedFile,
            Self::TypeConversion { .. } => ErrorKind::TypeConversion,
            Self::Persistence { .. } => ErrorKind::Persistence,
        }
    }

    pub(crate) fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }
}

impl From<csv::Error> for DatasetError {
    fn from(err: csv::Error) -> Self {
        Self::MalformedFile {
            message: err.to_string(),
        }
    }
}
