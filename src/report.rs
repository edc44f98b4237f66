//! Report contents for a stored dataset.
//!
//! [`EquipmentReport`] holds what a rendered report shows (title, headline statistics, the type
//! distribution, and the first rows) without committing to a layout. Renderers (PDF, HTML)
//! consume its fields; [`fmt::Display`] gives a plain-text rendering.

use std::fmt;

use crate::types::{Dataset, Measurement};

/// Number of data rows included in a report.
pub const REPORT_PREVIEW_ROWS: usize = 10;

/// Headers of [`EquipmentReport::rows`].
pub const REPORT_ROW_HEADERS: [&str; 5] = ["Name", "Type", "Flowrate", "Pressure", "Temp"];

/// Presentation-ready contents of a dataset report. Numbers are pre-formatted to two decimals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipmentReport {
    pub title: String,
    pub filename: String,
    /// `(label, value)` pairs, e.g. `("Average Flowrate", "20.00")`.
    pub statistics: Vec<(String, String)>,
    /// `(type, count)` pairs sorted by type name.
    pub type_distribution: Vec<(String, usize)>,
    /// Up to [`REPORT_PREVIEW_ROWS`] rows, columns as in [`REPORT_ROW_HEADERS`].
    pub rows: Vec<[String; 5]>,
}

impl EquipmentReport {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let summary = &dataset.summary;

        let mut statistics = vec![("Total Equipment".to_string(), summary.total_count.to_string())];
        for m in Measurement::ALL {
            statistics.push((format!("Average {m}"), format!("{:.2}", summary.average(m))));
        }

        let type_distribution = summary
            .type_distribution
            .iter()
            .map(|(t, &n)| (t.clone(), n))
            .collect();

        let rows = dataset
            .preview(REPORT_PREVIEW_ROWS)
            .iter()
            .map(|r| {
                [
                    r.name.clone(),
                    r.equipment_type.clone(),
                    format!("{:.2}", r.flowrate),
                    format!("{:.2}", r.pressure),
                    format!("{:.2}", r.temperature),
                ]
            })
            .collect();

        Self {
            title: "Chemical Equipment Report".to_string(),
            filename: dataset.filename.clone(),
            statistics,
            type_distribution,
            rows,
        }
    }

    /// Suggested download name, e.g. `plant.csv_report.pdf`.
    pub fn file_name(&self) -> String {
        format!("{}_report.pdf", self.filename)
    }
}

impl fmt::Display for EquipmentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", self.filename)?;
        writeln!(f)?;

        writeln!(f, "Summary Statistics")?;
        for (label, value) in &self.statistics {
            writeln!(f, "  {label}: {value}")?;
        }
        writeln!(f)?;

        writeln!(f, "Equipment Type Distribution")?;
        writeln!(f, "  {:<20} {:>6}", "Type", "Count")?;
        for (t, n) in &self.type_distribution {
            writeln!(f, "  {t:<20} {n:>6}")?;
        }
        writeln!(f)?;

        writeln!(f, "Equipment Data (First {REPORT_PREVIEW_ROWS} Rows)")?;
        let h = REPORT_ROW_HEADERS;
        writeln!(f, "  {:<20} {:<16} {:>10} {:>10} {:>10}", h[0], h[1], h[2], h[3], h[4])?;
        for r in &self.rows {
            writeln!(f, "  {:<20} {:<16} {:>10} {:>10} {:>10}", r[0], r[1], r[2], r[3], r[4])?;
        }
        Ok(())
    }
}
