//! Upload parsing and upload observability.
//!
//! - [`csv`](self::csv): header validation and row conversion ([`parse_and_validate`])
//! - [`observability`]: [`UploadObserver`] hooks for logging and alerting

pub mod csv;
pub mod observability;

pub use self::csv::{parse_and_validate, parse_from_reader};
pub use observability::{
    CompositeObserver, FileObserver, TracingObserver, UploadContext, UploadObserver,
    UploadSeverity, UploadStats,
};
