//! Aggregation over parsed uploads.
//!
//! The processing layer operates on the [`crate::types::EquipmentRow`]s produced by
//! [`crate::ingestion::csv::parse_and_validate`]. It is purely in-memory and side-effect free.
//!
//! ## Example
//!
//! ```rust
//! use equipment_datasets::processing::compute_summary;
//! use equipment_datasets::types::EquipmentRow;
//!
//! let rows = vec![
//!     EquipmentRow::new("Pump-1", "Pump", 10.0, 5.0, 100.0),
//!     EquipmentRow::new("Pump-2", "Pump", 20.0, 6.0, 110.0),
//!     EquipmentRow::new("Valve-1", "Valve", 30.0, 7.0, 120.0),
//! ];
//!
//! let summary = compute_summary(&rows);
//! assert_eq!(summary.avg_flowrate, 20.0);
//! assert_eq!(summary.type_distribution["Pump"], 2);
//! ```

pub mod summary;

pub use summary::compute_summary;
