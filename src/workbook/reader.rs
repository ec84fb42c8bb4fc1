// Input workbook reader.

use std::path::Path;

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use tracing::{debug, warn};

use super::models::OccupationRecord;

/// Read occupation records from `sheet` of the workbook at `path`.
///
/// The first row is a header and is skipped; the first four columns are
/// taken positionally regardless of their header text.
pub fn read_occupations(path: &Path, sheet: &str) -> Result<Vec<OccupationRecord>> {
    if !path.exists() {
        anyhow::bail!("Input workbook not found: {}", path.display());
    }

    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook {}", path.display()))?;

    let sheet_names = workbook.sheet_names();
    if !sheet_names.iter().any(|name| name == sheet) {
        anyhow::bail!(
            "Sheet {:?} not found in {}. Available sheets: {}",
            sheet,
            path.display(),
            sheet_names.join(", ")
        );
    }

    let range = workbook
        .worksheet_range(sheet)
        .with_context(|| format!("Failed to read sheet {sheet:?}"))?;

    let records = records_from_rows(range.rows().skip(1));

    debug!(
        sheet,
        rows = records.len(),
        "Read occupation records"
    );

    Ok(records)
}

/// Convert data rows (header already skipped) into records.
///
/// Rows whose profession cell is blank are dropped. Missing or non-numeric
/// counts become 0.0.
pub fn records_from_rows<'a>(rows: impl Iterator<Item = &'a [Data]>) -> Vec<OccupationRecord> {
    let mut records = Vec::new();
    let mut non_numeric = 0usize;

    for (i, row) in rows.enumerate() {
        let profession = row.first().map(cell_text).unwrap_or_default();
        if profession.trim().is_empty() {
            continue;
        }

        let code = row.get(1).map(cell_text).unwrap_or_default();
        let planned_hires = row.get(2).and_then(cell_number);
        let hard_to_fill = row.get(3).and_then(cell_number);

        if planned_hires.is_none() || hard_to_fill.is_none() {
            non_numeric += 1;
            debug!(row = i + 2, profession = %profession, "Missing or non-numeric count");
        }

        records.push(OccupationRecord {
            profession,
            code,
            planned_hires: planned_hires.unwrap_or(0.0),
            hard_to_fill: hard_to_fill.unwrap_or(0.0),
        });
    }

    if non_numeric > 0 {
        warn!(
            rows = non_numeric,
            "Some rows had missing or non-numeric counts, treated as 0"
        );
    }

    records
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{f:.0}"),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(n) => Some(*n as f64),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
