// Analysis pipeline: workbook in, workbook and report out.
//
// Steps: read and clean occupation titles, correlate every title with the
// keyword catalog (fanned out, order preserved), classify, build the ranked
// tables, then write the results workbook and the Markdown report.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::analysis::{Analysis, AnalyzedOccupation};
use crate::classify::{clean_profession_name, ProfessionClassifier};
use crate::correlation::{CorrelationError, KeywordCorrelator, MatchSet};
use crate::output::markdown::{self, ReportMeta};
use crate::workbook::models::OccupationRecord;
use crate::workbook::{reader, writer};

/// Per-run settings for [`run`].
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub input: PathBuf,
    pub sheet: String,
    pub output: PathBuf,
    pub output_dir: PathBuf,
    pub threshold: f64,
    pub concurrency: usize,
    /// Abort on the first failed correlation instead of skipping it.
    pub strict: bool,
}

/// What a completed run produced.
pub struct RunOutcome {
    pub analysis: Analysis,
    pub workbook: PathBuf,
    pub report: PathBuf,
}

/// Run the full analysis.
pub async fn run(
    correlator: &KeywordCorrelator,
    classifier: &ProfessionClassifier,
    options: &AnalyzeOptions,
) -> Result<RunOutcome> {
    let started_at = Local::now();

    let mut records = reader::read_occupations(&options.input, &options.sheet)?;
    for record in &mut records {
        record.profession = clean_profession_name(&record.profession);
    }
    info!(count = records.len(), "Loaded occupations");

    println!(
        "Correlating {} occupations with {} keywords ({} concurrent)...",
        records.len(),
        correlator.keywords().len(),
        options.concurrency.max(1),
    );

    let labels: Vec<String> = records.iter().map(|r| r.profession.clone()).collect();
    let results: Vec<Result<MatchSet, CorrelationError>> = if options.strict {
        correlate_all_or_fail(correlator, &labels, options.threshold, options.concurrency)
            .await?
            .into_iter()
            .map(Ok)
            .collect()
    } else {
        correlate_all(correlator, &labels, options.threshold, options.concurrency).await
    };

    let occupations = attach_results(records, results, classifier, options.strict)?;
    let analysis = Analysis::new(occupations);

    writer::write_results(&options.output, &analysis)?;

    let meta = ReportMeta {
        generated_at: started_at,
        input: options.input.display().to_string(),
        sheet: options.sheet.clone(),
        threshold: options.threshold,
        embedder: correlator.embedder_name().to_string(),
    };
    let report =
        markdown::generate_report(&analysis, correlator.keywords(), &meta, &options.output_dir)?;

    info!(
        managerial = analysis.managerial.len(),
        operational = analysis.operational.len(),
        failed = analysis.failed_count(),
        "Analysis complete"
    );

    Ok(RunOutcome {
        analysis,
        workbook: options.output.clone(),
        report,
    })
}

/// Correlate every label, at most `concurrency` at a time.
///
/// Results come back in label order. Failures are returned, not swallowed;
/// the caller decides what to do with them.
pub async fn correlate_all(
    correlator: &KeywordCorrelator,
    labels: &[String],
    threshold: f64,
    concurrency: usize,
) -> Vec<Result<MatchSet, CorrelationError>> {
    let pb = progress_bar(labels.len());
    let pb_ref = &pb;
    let results: Vec<_> = stream::iter(labels.iter().map(|label| async move {
        let result = correlator.correlate(label, threshold).await;
        pb_ref.inc(1);
        result
    }))
    .buffered(concurrency.max(1))
    .collect()
    .await;

    pb.finish_and_clear();
    results
}

/// Like [`correlate_all`], but stops at the first failure.
///
/// No further labels are started once one fails; calls already in flight
/// are dropped.
pub async fn correlate_all_or_fail(
    correlator: &KeywordCorrelator,
    labels: &[String],
    threshold: f64,
    concurrency: usize,
) -> Result<Vec<MatchSet>> {
    let pb = progress_bar(labels.len());
    let pb_ref = &pb;
    let results: Result<Vec<MatchSet>> = stream::iter(labels.iter().map(|label| async move {
        let result = correlator.correlate(label, threshold).await;
        pb_ref.inc(1);
        result.map_err(|e| anyhow::Error::new(e).context(format!("Failed to correlate {label:?}")))
    }))
    .buffered(concurrency.max(1))
    .try_collect()
    .await;

    pb.finish_and_clear();
    results
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("  Correlating [{bar:30}] {pos}/{len} ({eta})")
    {
        pb.set_style(style);
    }
    pb
}

/// Classify each record and pair it with its correlation result.
///
/// A failed correlation is logged and leaves the occupation without
/// keywords, unless `strict` is set, in which case the first failure aborts.
pub fn attach_results(
    records: Vec<OccupationRecord>,
    results: Vec<Result<MatchSet, CorrelationError>>,
    classifier: &ProfessionClassifier,
    strict: bool,
) -> Result<Vec<AnalyzedOccupation>> {
    if records.len() != results.len() {
        anyhow::bail!(
            "Got {} correlation results for {} occupations",
            results.len(),
            records.len()
        );
    }

    let mut occupations = Vec::with_capacity(records.len());
    for (record, result) in records.into_iter().zip(results) {
        let matches = match result {
            Ok(matches) => Some(matches),
            Err(e) if strict => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Failed to correlate {:?}", record.profession)));
            }
            Err(e) => {
                warn!(
                    profession = %record.profession,
                    error = %e,
                    "Correlation failed, skipping keywords"
                );
                None
            }
        };

        occupations.push(AnalyzedOccupation {
            level: classifier.classify(&record.profession),
            record,
            matches,
        });
    }

    Ok(occupations)
}
