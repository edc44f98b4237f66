//! `equipment-datasets` validates chemical-equipment CSV uploads, computes summary statistics,
//! and keeps the most recent uploads in a bounded, thread-safe store.
//!
//! The primary entrypoint is [`pipeline::upload_bytes`] (or [`pipeline::upload_from_path`]),
//! which runs the whole pipeline:
//!
//! 1. check the file name carries a `.csv` extension
//! 2. parse the CSV and validate the required columns ([`ingestion::csv::parse_and_validate`])
//! 3. compute the [`types::Summary`] ([`processing::compute_summary`])
//! 4. insert the [`types::Dataset`] into a [`storage::DatasetStore`], evicting everything beyond
//!    the newest five
//!
//! Every failure rejects the whole upload and leaves the store untouched.
//!
//! ## What an upload must look like
//!
//! The header must contain `Equipment Name`, `Type`, `Flowrate`, `Pressure` and `Temperature`
//! (exact, case-sensitive; order does not matter). Other columns are kept on each row as raw
//! strings. Measurements must be finite numbers.
//!
//! ```rust
//! use equipment_datasets::pipeline::{upload_bytes, UploadOptions};
//! use equipment_datasets::storage::DatasetStore;
//! use equipment_datasets::ErrorKind;
//!
//! let store = DatasetStore::in_memory();
//! let opts = UploadOptions::default();
//!
//! let csv = "Equipment Name,Type,Flowrate,Pressure,Temperature\n\
//!            Pump-1,Pump,120,5.2,110\n\
//!            Compressor-1,Compressor,95,8.4,95\n";
//! let ds = upload_bytes(&store, "plant.csv", csv.as_bytes(), &opts).unwrap();
//! assert_eq!(ds.summary.total_count, 2);
//! assert_eq!(ds.summary.type_distribution["Pump"], 1);
//!
//! let missing = "Equipment Name,Type,Flowrate,Temperature\nPump-1,Pump,120,110\n";
//! let err = upload_bytes(&store, "bad.csv", missing.as_bytes(), &opts).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::MissingColumns);
//! assert_eq!(err.to_string(), "missing columns: Pressure");
//! assert_eq!(store.len(), 1);
//! ```
//!
//! ## Reading stored datasets
//!
//! - [`storage::DatasetStore::list_recent`]: newest first, without rows
//! - [`storage::DatasetStore::get`]: one dataset with rows
//! - [`storage::DatasetStore::summary`]: one dataset's summary
//! - [`report::EquipmentReport`]: report contents for a dataset
//!
//! ## Modules
//!
//! - [`pipeline`]: upload entrypoints and [`pipeline::UploadOptions`]
//! - [`ingestion`]: CSV parsing and upload observers
//! - [`processing`]: summary statistics
//! - [`storage`]: the retention-capped store and its backends
//! - [`execution`]: batch uploads with parallel preparation
//! - [`report`]: report contents
//! - [`types`]: data model
//! - [`error`]: error types

pub mod error;
pub mod execution;
pub mod ingestion;
pub mod pipeline;
pub mod processing;
pub mod report;
pub mod storage;
pub mod types;

pub use error::{DatasetError, DatasetResult, ErrorKind};
