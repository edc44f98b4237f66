//! CSV parsing and validation.

use crate::error::{DatasetError, DatasetResult};
use crate::types::EquipmentRow;

/// Parse an uploaded CSV into [`EquipmentRow`]s.
///
/// Rules:
///
/// - The first row is the header; the separator is a comma.
/// - Headers must contain every entry of `required_columns` (exact, case-sensitive). All missing
///   columns are reported at once, before any data row is read.
/// - `required_columns` lists, in order, the name, type, flowrate, pressure and temperature
///   headers. Every other header is kept as a raw extra field on each row.
/// - Every data row must have as many fields as the header.
/// - Measurements must be finite numbers; name and type must be non-empty.
pub fn parse_and_validate(bytes: &[u8], required_columns: &[&str; 5]) -> DatasetResult<Vec<EquipmentRow>> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(DatasetError::MalformedFile {
            message: "file is empty".to_string(),
        });
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);
    parse_from_reader(&mut rdr, required_columns)
}

/// Parse rows from an existing CSV reader (which must be configured with headers).
pub fn parse_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
    required_columns: &[&str; 5],
) -> DatasetResult<Vec<EquipmentRow>> {
    let headers = rdr.headers()?.clone();

    let missing: Vec<String> = required_columns
        .iter()
        .filter(|&&col| !headers.iter().any(|h| h == col))
        .map(|&col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DatasetError::MissingColumns { columns: missing });
    }

    // Header index of each required column; duplicates resolve to the first occurrence.
    let mut idxs = [0usize; 5];
    for (slot, col) in idxs.iter_mut().zip(required_columns.iter()) {
        *slot = headers.iter().position(|h| h == *col).unwrap_or_default();
    }
    let extra_idxs: Vec<usize> = (0..headers.len()).filter(|i| !idxs.contains(i)).collect();

    let mut rows = Vec::new();
    for (row_idx0, result) in rdr.records().enumerate() {
        // 1-based for users, and the header occupies row 1.
        let user_row = row_idx0 + 2;
        let record = result?;
        let cell = |i: usize| record.get(idxs[i]).unwrap_or("");

        let name = parse_text(user_row, required_columns[0], cell(0))?;
        let equipment_type = parse_text(user_row, required_columns[1], cell(1))?;
        let flowrate = parse_measurement(user_row, required_columns[2], cell(2))?;
        let pressure = parse_measurement(user_row, required_columns[3], cell(3))?;
        let temperature = parse_measurement(user_row, required_columns[4], cell(4))?;

        let extra = extra_idxs
            .iter()
            .map(|&i| {
                (
                    headers.get(i).unwrap_or("").to_owned(),
                    record.get(i).unwrap_or("").to_owned(),
                )
            })
            .collect();

        rows.push(EquipmentRow {
            name,
            equipment_type,
            flowrate,
            pressure,
            temperature,
            extra,
        });
    }

    Ok(rows)
}

fn parse_text(row: usize, column: &str, raw: &str) -> DatasetResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(conversion_error(row, column, raw, "value is empty"));
    }
    Ok(trimmed.to_owned())
}

fn parse_measurement(row: usize, column: &str, raw: &str) -> DatasetResult<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(conversion_error(row, column, raw, "value is empty"));
    }
    let value = trimmed
        .parse::<f64>()
        .map_err(|e| conversion_error(row, column, raw, &e.to_string()))?;
    if !value.is_finite() {
        return Err(conversion_error(row, column, raw, "value must be finite"));
    }
    Ok(value)
}

fn conversion_error(row: usize, column: &str, raw: &str, message: &str) -> DatasetError {
    DatasetError::TypeConversion {
        row,
        column: column.to_owned(),
        raw: raw.to_owned(),
        message: message.to_owned(),
    }
}
