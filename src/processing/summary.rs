//! Summary statistics for a parsed upload.

use std::collections::BTreeMap;

use crate::types::{EquipmentRow, Measurement, Summary};

/// Running min/max/sum for one measured column over `count` rows.
#[derive(Debug, Clone, Copy)]
struct ColumnStats {
    count: f64,
    sum: f64,
    /// Sum of `v / count`, used when `sum` overflows.
    scaled_sum: f64,
    min: f64,
    max: f64,
}

impl ColumnStats {
    /// `count` must be > 0.
    fn new(count: usize) -> Self {
        Self {
            count: count as f64,
            sum: 0.0,
            scaled_sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn push(&mut self, v: f64) {
        self.sum += v;
        self.scaled_sum += v / self.count;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    /// `(avg, min, max)`.
    fn finish(self) -> (f64, f64, f64) {
        // Finite inputs whose running sum leaves the f64 range still have a finite mean.
        let avg = if self.sum.is_finite() {
            self.sum / self.count
        } else {
            self.scaled_sum
        };
        // Floating-point rounding can push the mean a hair outside [min, max].
        (avg.clamp(self.min, self.max), self.min, self.max)
    }
}

/// Compute the [`Summary`] of `rows` in a single pass.
///
/// - Means are computed left to right in `f64`, so repeated calls are bit-identical.
/// - If a column's running sum overflows, its mean is taken from the sum of `value / count`.
/// - With no rows, all averages and min/max values are `0.0` and the type distribution is empty.
pub fn compute_summary(rows: &[EquipmentRow]) -> Summary {
    if rows.is_empty() {
        return Summary::empty();
    }

    let count = rows.len();
    let mut stats = [ColumnStats::new(count); 3];
    let mut type_distribution: BTreeMap<String, usize> = BTreeMap::new();

    for row in rows {
        for (acc, m) in stats.iter_mut().zip(Measurement::ALL) {
            acc.push(row.measurement(m));
        }
        *type_distribution.entry(row.equipment_type.clone()).or_insert(0) += 1;
    }

    let (avg_flowrate, min_flowrate, max_flowrate) = stats[0].finish();
    let (avg_pressure, min_pressure, max_pressure) = stats[1].finish();
    let (avg_temperature, min_temperature, max_temperature) = stats[2].finish();

    Summary {
        total_count: count,
        avg_flowrate,
        avg_pressure,
        avg_temperature,
        min_flowrate,
        max_flowrate,
        min_pressure,
        max_pressure,
        min_temperature,
        max_temperature,
        type_distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::compute_summary;
    use crate::types::{EquipmentRow, Measurement};

    fn rows_with_flowrates(values: &[f64]) -> Vec<EquipmentRow> {
        values
            .iter()
            .enumerate()
            .map(|(i, &f)| EquipmentRow::new(format!("Pump-{i}"), "Pump", f, 5.0, 110.0))
            .collect()
    }

    fn mixed_rows() -> Vec<EquipmentRow> {
        vec![
            EquipmentRow::new("Pump-1", "Pump", 120.0, 5.2, 110.0),
            EquipmentRow::new("Compressor-1", "Compressor", 95.0, 8.4, 95.0),
            EquipmentRow::new("Valve-1", "Valve", 60.0, 4.1, 105.0),
            EquipmentRow::new("Pump-2", "Pump", 132.5, 5.6, 118.0),
            EquipmentRow::new("HeatExchanger-1", "HeatExchanger", 150.0, 6.3, 130.0),
        ]
    }

    #[test]
    fn mean_min_max_for_simple_column() {
        let s = compute_summary(&rows_with_flowrates(&[10.0, 20.0, 30.0]));
        assert_eq!(s.total_count, 3);
        assert_eq!(s.avg_flowrate, 20.0);
        assert_eq!(s.min_flowrate, 10.0);
        assert_eq!(s.max_flowrate, 30.0);
        assert_eq!(s.avg_pressure, 5.0);
        assert_eq!(s.avg_temperature, 110.0);
    }

    #[test]
    fn empty_rows_use_zero_defaults() {
        let s = compute_summary(&[]);
        assert_eq!(s.total_count, 0);
        for m in Measurement::ALL {
            assert_eq!(s.average(m), 0.0);
            assert_eq!(s.min(m), 0.0);
            assert_eq!(s.max(m), 0.0);
        }
        assert!(s.type_distribution.is_empty());
    }

    #[test]
    fn type_distribution_counts_sum_to_total() {
        let s = compute_summary(&mixed_rows());
        assert_eq!(s.type_distribution.get("Pump"), Some(&2));
        assert_eq!(s.type_distribution.get("Compressor"), Some(&1));
        assert_eq!(s.type_distribution.values().sum::<usize>(), s.total_count);
    }

    #[test]
    fn averages_lie_between_min_and_max() {
        let s = compute_summary(&mixed_rows());
        for m in Measurement::ALL {
            assert!(s.min(m) <= s.average(m), "{m}");
            assert!(s.average(m) <= s.max(m), "{m}");
        }
        assert_eq!(s.min_pressure, 4.1);
        assert_eq!(s.max_temperature, 130.0);
    }

    #[test]
    fn repeated_computation_is_bit_identical() {
        let rows = mixed_rows();
        let a = compute_summary(&rows);
        let b = compute_summary(&rows);
        for m in Measurement::ALL {
            assert_eq!(a.average(m).to_bits(), b.average(m).to_bits());
            assert_eq!(a.min(m).to_bits(), b.min(m).to_bits());
            assert_eq!(a.max(m).to_bits(), b.max(m).to_bits());
        }
        assert_eq!(a, b);
    }

    #[test]
    fn negative_and_zero_values_are_legitimate() {
        let s = compute_summary(&rows_with_flowrates(&[0.0, -4.0, 4.0]));
        assert_eq!(s.avg_flowrate, 0.0);
        assert_eq!(s.min_flowrate, -4.0);
        assert_eq!(s.max_flowrate, 4.0);
    }

    #[test]
    fn overflowing_sum_still_yields_the_true_mean() {
        let s = compute_summary(&rows_with_flowrates(&[1e308, 1e308, -1e308]));
        let expected = 1e308 / 3.0;
        assert!(s.avg_flowrate.is_finite());
        assert!(
            ((s.avg_flowrate - expected) / expected).abs() < 1e-12,
            "avg {} != {expected}",
            s.avg_flowrate
        );
        assert_eq!(s.max_flowrate, 1e308);
        assert_eq!(s.min_flowrate, -1e308);
    }
}
