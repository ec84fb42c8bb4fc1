// Colored terminal output for ranking tables and correlation results.

use colored::Colorize;

use super::truncate_chars;
use crate::analysis::{Analysis, RankBy};
use crate::correlation::{MatchPass, MatchSet, FALLBACK_THRESHOLD};
use crate::workbook::models::OccupationRecord;

/// Display a ranked table of occupations.
pub fn display_top_table(title: &str, records: &[OccupationRecord], by: RankBy) {
    println!("\n{}", title.bold());

    if records.is_empty() {
        println!("  {}", "No occupations.".dimmed());
        return;
    }

    let value_header = match by {
        RankBy::PlannedHires => "Entrate",
        RankBy::HardToFill => "Difficili",
    };

    println!(
        "  {:>4}  {:<60} {:>10}",
        "#".dimmed(),
        "Professione".dimmed(),
        value_header.dimmed()
    );
    println!("  {}", "-".repeat(78).dimmed());

    for (i, record) in records.iter().enumerate() {
        println!(
            "  {:>4}. {:<60} {:>10.0}",
            i + 1,
            truncate_chars(&record.profession, 57),
            by.value(record),
        );
    }
}

/// Display the per-level summary after a full run.
pub fn display_summary(analysis: &Analysis) {
    let managerial_kw = analysis.managerial_with_keywords().len();
    let operational_kw = analysis.operational_with_keywords().len();

    println!("\n{}", "=== Classification & correlation ===".bold());
    println!("  Occupations analyzed: {}", analysis.total());
    println!(
        "  {}: {} ({} with keywords)",
        "Gestionali".cyan(),
        analysis.managerial.len(),
        managerial_kw
    );
    println!(
        "  {}: {} ({} with keywords)",
        "Operative".cyan(),
        analysis.operational.len(),
        operational_kw
    );

    let failed = analysis.failed_count();
    if failed > 0 {
        println!(
            "  {} {} occupations could not be correlated (see log)",
            "!".yellow().bold(),
            failed
        );
    }
}

/// Display a single label's match set with per-keyword scores.
pub fn display_correlation(
    label: &str,
    threshold: f64,
    matches: &MatchSet,
    keywords: &[String],
    scores: &[f64],
) {
    println!("\n{}", format!("=== Keywords for \"{label}\" ===").bold());
    println!("  Threshold: {threshold:.2}  |  Pass: {}", colorize_pass(matches.pass));

    if matches.is_empty() {
        println!("  {}", "No keyword cleared either threshold.".dimmed());
    } else {
        println!("  Matched: {}", matches.keywords.join(", ").green());
    }

    let mut ranked: Vec<(&String, f64)> = keywords.iter().zip(scores.iter().copied()).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    println!("\n  {}", "Top similarities:".dimmed());
    for (keyword, score) in ranked.iter().take(10) {
        let line = format!("    {score:>6.3}  {keyword}");
        if matches.keywords.contains(*keyword) {
            println!("{}", line.green());
        } else {
            println!("{}", line.dimmed());
        }
    }
}

fn colorize_pass(pass: MatchPass) -> colored::ColoredString {
    match pass {
        MatchPass::Primary => "primary".green(),
        MatchPass::Fallback => format!("fallback ({FALLBACK_THRESHOLD:.2})").as_str().yellow(),
        MatchPass::Unmatched => "none".dimmed(),
    }
}
