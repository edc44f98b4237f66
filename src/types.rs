//! Core data model types.
//!
//! Uploads are parsed into [`EquipmentRow`]s, aggregated into a [`Summary`], and persisted as an
//! immutable [`Dataset`] by [`crate::storage::DatasetStore`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Header names every upload must declare, in the order they are checked.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "Equipment Name",
    "Type",
    "Flowrate",
    "Pressure",
    "Temperature",
];

/// One of the three measured parameters of an [`EquipmentRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Measurement {
    Flowrate,
    Pressure,
    Temperature,
}

impl Measurement {
    /// All measurements in column order.
    pub const ALL: [Measurement; 3] = [Self::Flowrate, Self::Pressure, Self::Temperature];

    /// The CSV header name holding this measurement.
    pub fn column(self) -> &'static str {
        match self {
            Self::Flowrate => "Flowrate",
            Self::Pressure => "Pressure",
            Self::Temperature => "Temperature",
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// One validated data line of an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRow {
    /// Value of the `Equipment Name` column.
    pub name: String,
    /// Value of the `Type` column.
    pub equipment_type: String,
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
    /// Columns beyond the required five, as `(header, raw value)` in header order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<(String, String)>,
}

impl EquipmentRow {
    /// Create a row without extra columns.
    pub fn new(
        name: impl Into<String>,
        equipment_type: impl Into<String>,
        flowrate: f64,
        pressure: f64,
        temperature: f64,
    ) -> Self {
        Self {
            name: name.into(),
            equipment_type: equipment_type.into(),
            flowrate,
            pressure,
            temperature,
            extra: Vec::new(),
        }
    }

    /// Read one measured parameter.
    pub fn measurement(&self, m: Measurement) -> f64 {
        match m {
            Measurement::Flowrate => self.flowrate,
            Measurement::Pressure => self.pressure,
            Measurement::Temperature => self.temperature,
        }
    }

    /// Look up an extra (non-required) column by header name.
    pub fn extra_value(&self, column: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}

/// Aggregate statistics over the rows of one upload.
///
/// With zero rows every average, minimum and maximum is `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_count: usize,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
    pub min_flowrate: f64,
    pub max_flowrate: f64,
    pub min_pressure: f64,
    pub max_pressure: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    /// Row count per equipment type.
    pub type_distribution: BTreeMap<String, usize>,
}

impl Summary {
    /// Summary of an upload with no data rows.
    pub fn empty() -> Self {
        Self {
            total_count: 0,
            avg_flowrate: 0.0,
            avg_pressure: 0.0,
            avg_temperature: 0.0,
            min_flowrate: 0.0,
            max_flowrate: 0.0,
            min_pressure: 0.0,
            max_pressure: 0.0,
            min_temperature: 0.0,
            max_temperature: 0.0,
            type_distribution: BTreeMap::new(),
        }
    }

    pub fn average(&self, m: Measurement) -> f64 {
        match m {
            Measurement::Flowrate => self.avg_flowrate,
            Measurement::Pressure => self.avg_pressure,
            Measurement::Temperature => self.avg_temperature,
        }
    }

    pub fn min(&self, m: Measurement) -> f64 {
        match m {
            Measurement::Flowrate => self.min_flowrate,
            Measurement::Pressure => self.min_pressure,
            Measurement::Temperature => self.min_temperature,
        }
    }

    pub fn max(&self, m: Measurement) -> f64 {
        match m {
            Measurement::Flowrate => self.max_flowrate,
            Measurement::Pressure => self.max_pressure,
            Measurement::Temperature => self.max_temperature,
        }
    }
}

/// Store-assigned dataset identifier. Larger ids were inserted later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetId(pub u64);

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted upload: its rows plus the summary computed at upload time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: DatasetId,
    pub filename: String,
    /// Assigned by the store when the dataset is persisted.
    pub uploaded_at: DateTime<Utc>,
    /// Rows in original file order.
    pub rows: Vec<EquipmentRow>,
    pub summary: Summary,
}

impl Dataset {
    /// Lightweight projection without rows.
    pub fn listing(&self) -> DatasetListing {
        DatasetListing {
            id: self.id,
            filename: self.filename.clone(),
            uploaded_at: self.uploaded_at,
            summary: self.summary.clone(),
        }
    }

    /// First `n` rows (fewer if the dataset is smaller).
    pub fn preview(&self, n: usize) -> &[EquipmentRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// A [`Dataset`] without its rows, used for history listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetListing {
    pub id: DatasetId,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub summary: Summary,
}
