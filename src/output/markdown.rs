// Markdown report generation.
//
// Written next to the results workbook so a run can be reviewed without a
// spreadsheet application. File names carry a timestamp so successive runs
// never overwrite each other.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use crate::analysis::{Analysis, AnalyzedOccupation, RankBy};
use crate::correlation::FALLBACK_THRESHOLD;
use crate::workbook::models::OccupationRecord;

/// Run metadata printed at the top of the report.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub generated_at: DateTime<Local>,
    pub input: String,
    pub sheet: String,
    pub threshold: f64,
    pub embedder: String,
}

/// Report file name for a run started at `at`.
pub fn report_file_name(at: &DateTime<Local>) -> String {
    format!("analisi_{}.md", at.format("%Y%m%d_%H%M%S"))
}

/// Render the report and write it into `dir`, creating the directory if
/// needed. Returns the path written.
pub fn generate_report(
    analysis: &Analysis,
    catalog: &[String],
    meta: &ReportMeta,
    dir: &Path,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let path = dir.join(report_file_name(&meta.generated_at));
    let content = render_report(analysis, catalog, meta);
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write report {}", path.display()))?;

    Ok(path)
}

/// Render the full report as Markdown.
pub fn render_report(analysis: &Analysis, catalog: &[String], meta: &ReportMeta) -> String {
    let mut md = String::new();

    let _ = writeln!(md, "# Analisi fabbisogni professionali\n");
    let _ = writeln!(
        md,
        "- Generato: {}",
        meta.generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(md, "- Input: `{}` (foglio `{}`)", meta.input, meta.sheet.trim());
    let _ = writeln!(
        md,
        "- Soglia di similarità: {:.2} (fallback {:.2})",
        meta.threshold, FALLBACK_THRESHOLD
    );
    let _ = writeln!(md, "- Modello di embedding: {}", meta.embedder);
    let _ = writeln!(md, "- Professioni analizzate: {}", analysis.total());
    let _ = writeln!(
        md,
        "- Gestionali: {} / Operative: {}",
        analysis.managerial.len(),
        analysis.operational.len()
    );
    let failed = analysis.failed_count();
    if failed > 0 {
        let _ = writeln!(md, "- Correlazioni non riuscite: {failed}");
    }
    md.push('\n');

    push_top_table(
        &mut md,
        "Top 10 professioni per entrate programmate",
        &analysis.top_planned_hires,
        RankBy::PlannedHires,
    );
    push_top_table(
        &mut md,
        "Top 10 professioni per difficoltà di reperimento",
        &analysis.top_hard_to_fill,
        RankBy::HardToFill,
    );

    push_correlation_table(
        &mut md,
        "Correlazione: professioni gestionali e keyword",
        &analysis.managerial_with_keywords(),
    );
    push_correlation_table(
        &mut md,
        "Correlazione: professioni operative e keyword",
        &analysis.operational_with_keywords(),
    );

    let frequency = analysis.keyword_frequency(catalog);
    let _ = writeln!(md, "## Frequenza delle keyword\n");
    if frequency.is_empty() {
        let _ = writeln!(md, "Nessuna keyword correlata.\n");
    } else {
        let _ = writeln!(md, "| Keyword | Professioni |");
        let _ = writeln!(md, "|---|---:|");
        for (keyword, count) in &frequency {
            let _ = writeln!(md, "| {} | {} |", escape_cell(keyword), count);
        }
        md.push('\n');
    }

    md
}

fn push_top_table(md: &mut String, title: &str, records: &[OccupationRecord], by: RankBy) {
    let _ = writeln!(md, "## {title}\n");
    if records.is_empty() {
        let _ = writeln!(md, "Nessuna professione.\n");
        return;
    }

    let column = match by {
        RankBy::PlannedHires => "Entrate programmate",
        RankBy::HardToFill => "Di difficile reperimento",
    };
    let _ = writeln!(md, "| # | Professione | {column} |");
    let _ = writeln!(md, "|---:|---|---:|");
    for (i, record) in records.iter().enumerate() {
        let _ = writeln!(
            md,
            "| {} | {} | {:.0} |",
            i + 1,
            escape_cell(&record.profession),
            by.value(record)
        );
    }
    md.push('\n');
}

fn push_correlation_table(md: &mut String, title: &str, occupations: &[&AnalyzedOccupation]) {
    let _ = writeln!(md, "## {title}\n");
    if occupations.is_empty() {
        let _ = writeln!(md, "Nessuna professione con keyword correlate.\n");
        return;
    }

    let _ = writeln!(md, "| Professione | Entrate | Difficili | Keyword |");
    let _ = writeln!(md, "|---|---:|---:|---|");
    for occupation in occupations {
        let _ = writeln!(
            md,
            "| {} | {:.0} | {:.0} | {} |",
            escape_cell(&occupation.record.profession),
            occupation.record.planned_hires,
            occupation.record.hard_to_fill,
            escape_cell(&occupation.keywords().join(", "))
        );
    }
    md.push('\n');
}

/// Pipes would split a table cell and line breaks would end the row.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}
