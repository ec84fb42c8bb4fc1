// Results workbook writer.
//
// One sheet per table, header row in bold. Keyword lists are written as a
// single comma-separated cell.

use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::info;

use super::models::{
    OccupationRecord, COL_CODE, COL_HARD_TO_FILL, COL_KEYWORDS, COL_LEVEL, COL_PLANNED_HIRES,
    COL_PROFESSION, INPUT_COLUMNS,
};
use crate::analysis::{AnalyzedOccupation, Analysis};

pub const SHEET_TOP_PLANNED: &str = "Top 10 Entrate";
pub const SHEET_TOP_HARD_TO_FILL: &str = "Top 10 Difficili";
pub const SHEET_MANAGERIAL: &str = "Professioni Gestionali";
pub const SHEET_OPERATIONAL: &str = "Professioni Operative";
pub const SHEET_MANAGERIAL_KEYWORDS: &str = "Correlazione Gestionali-Keyword";
pub const SHEET_OPERATIONAL_KEYWORDS: &str = "Correlazione Operative-Keyword";

/// Columns of the per-level sheets.
const ANALYZED_COLUMNS: [&str; 6] = [
    COL_PROFESSION,
    COL_CODE,
    COL_PLANNED_HIRES,
    COL_HARD_TO_FILL,
    COL_LEVEL,
    COL_KEYWORDS,
];

/// Write every table of `analysis` to a new workbook at `path`.
pub fn write_results(path: &Path, analysis: &Analysis) -> Result<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    write_records(
        workbook.add_worksheet(),
        SHEET_TOP_PLANNED,
        &analysis.top_planned_hires,
        &header,
    )?;
    write_records(
        workbook.add_worksheet(),
        SHEET_TOP_HARD_TO_FILL,
        &analysis.top_hard_to_fill,
        &header,
    )?;

    let managerial: Vec<&AnalyzedOccupation> = analysis.managerial.iter().collect();
    let operational: Vec<&AnalyzedOccupation> = analysis.operational.iter().collect();

    write_analyzed(workbook.add_worksheet(), SHEET_MANAGERIAL, &managerial, &header)?;
    write_analyzed(workbook.add_worksheet(), SHEET_OPERATIONAL, &operational, &header)?;
    write_analyzed(
        workbook.add_worksheet(),
        SHEET_MANAGERIAL_KEYWORDS,
        &analysis.managerial_with_keywords(),
        &header,
    )?;
    write_analyzed(
        workbook.add_worksheet(),
        SHEET_OPERATIONAL_KEYWORDS,
        &analysis.operational_with_keywords(),
        &header,
    )?;

    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook {}", path.display()))?;

    info!(path = %path.display(), "Wrote results workbook");
    Ok(())
}

fn write_header(sheet: &mut Worksheet, columns: &[&str], header: &Format) -> Result<()> {
    for (col, name) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, header)?;
    }
    sheet.set_column_width(0, 60)?;
    Ok(())
}

fn write_record_cells(sheet: &mut Worksheet, row: u32, record: &OccupationRecord) -> Result<()> {
    sheet.write_string(row, 0, &record.profession)?;
    sheet.write_string(row, 1, &record.code)?;
    sheet.write_number(row, 2, record.planned_hires)?;
    sheet.write_number(row, 3, record.hard_to_fill)?;
    Ok(())
}

fn write_records(
    sheet: &mut Worksheet,
    name: &str,
    records: &[OccupationRecord],
    header: &Format,
) -> Result<()> {
    sheet.set_name(name)?;
    write_header(sheet, &INPUT_COLUMNS, header)?;
    for (i, record) in records.iter().enumerate() {
        write_record_cells(sheet, i as u32 + 1, record)?;
    }
    Ok(())
}

fn write_analyzed(
    sheet: &mut Worksheet,
    name: &str,
    occupations: &[&AnalyzedOccupation],
    header: &Format,
) -> Result<()> {
    sheet.set_name(name)?;
    write_header(sheet, &ANALYZED_COLUMNS, header)?;
    for (i, occupation) in occupations.iter().enumerate() {
        let row = i as u32 + 1;
        write_record_cells(sheet, row, &occupation.record)?;
        sheet.write_string(row, 4, occupation.level.label())?;
        sheet.write_string(row, 5, occupation.keywords().join(", "))?;
    }
    Ok(())
}
