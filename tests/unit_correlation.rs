// Unit tests for the keyword correlator.
//
// Uses in-memory embedders with hand-built vectors so cosine scores are known
// exactly: the label is the unit vector e0, and a keyword meant to score `c`
// is [c, sqrt(1 - c^2), 0, ...] on its own orthogonal axis.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use fabbisogni::correlation::{
    select_matches, CorrelationError, KeywordCorrelator, MatchPass, FALLBACK_THRESHOLD,
};
use fabbisogni::embedding::traits::TextEmbedder;

const LABEL: &str = "Ingegneri elettronici";

/// Looks texts up in a fixed table; unknown text is an embedding failure.
struct TableEmbedder {
    vectors: HashMap<String, Vec<f64>>,
    batch_calls: AtomicUsize,
    single_calls: AtomicUsize,
}

impl TableEmbedder {
    fn new(vectors: HashMap<String, Vec<f64>>) -> Self {
        Self {
            vectors,
            batch_calls: AtomicUsize::new(0),
            single_calls: AtomicUsize::new(0),
        }
    }

    fn lookup(&self, text: &str) -> Result<Vec<f64>> {
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no vector for {text:?}"))
    }
}

#[async_trait]
impl TextEmbedder for TableEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        texts.iter().map(|t| self.lookup(t)).collect()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        self.lookup(text)
    }

    fn name(&self) -> &str {
        "table"
    }
}

/// Build a table where LABEL scores `scores[i]` against `keywords[i]`.
fn scored_table(keywords: &[&str], scores: &[f64]) -> HashMap<String, Vec<f64>> {
    let dim = keywords.len() + 1;
    let mut table = HashMap::new();

    let mut label = vec![0.0; dim];
    label[0] = 1.0;
    table.insert(LABEL.to_string(), label);

    for (i, (keyword, &score)) in keywords.iter().zip(scores).enumerate() {
        let mut v = vec![0.0; dim];
        v[0] = score;
        v[i + 1] = (1.0 - score * score).sqrt();
        table.insert(keyword.to_string(), v);
    }

    table
}

async fn correlator_for(keywords: &[&str], scores: &[f64]) -> KeywordCorrelator {
    let embedder = Arc::new(TableEmbedder::new(scored_table(keywords, scores)));
    KeywordCorrelator::build(embedder, keywords.iter().map(|k| k.to_string()).collect())
        .await
        .unwrap()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ============================================================
// Leadership / Testing scenario
// ============================================================

#[tokio::test]
async fn primary_threshold_matches_leadership() {
    let correlator = correlator_for(&["Leadership", "Testing"], &[0.65, 0.3]).await;
    let result = correlator.correlate(LABEL, 0.6).await.unwrap();
    assert_eq!(result.keywords, strings(&["Leadership"]));
    assert_eq!(result.pass, MatchPass::Primary);
}

#[tokio::test]
async fn empty_primary_falls_back_to_fixed_threshold() {
    let correlator = correlator_for(&["Leadership", "Testing"], &[0.65, 0.3]).await;
    let result = correlator.correlate(LABEL, 0.7).await.unwrap();
    assert_eq!(result.keywords, strings(&["Leadership"]));
    assert_eq!(result.pass, MatchPass::Fallback);
}

#[tokio::test]
async fn nothing_above_either_threshold_is_empty_not_error() {
    let correlator = correlator_for(&["Leadership", "Testing"], &[0.35, 0.3]).await;
    let result = correlator.correlate(LABEL, 0.9).await.unwrap();
    assert!(result.is_empty());
    assert_eq!(result.pass, MatchPass::Unmatched);
}

#[tokio::test]
async fn catalog_order_wins_over_score_order() {
    let correlator = correlator_for(&["Leadership", "Testing"], &[0.5, 0.65]).await;
    let result = correlator.correlate(LABEL, 0.4).await.unwrap();
    assert_eq!(result.keywords, strings(&["Leadership", "Testing"]));
}

#[tokio::test]
async fn results_are_strictly_in_catalog_order() {
    let catalog = ["A", "B", "C", "D", "E"];
    let correlator = correlator_for(&catalog, &[0.9, 0.1, 0.8, 0.95, 0.7]).await;
    let result = correlator.correlate(LABEL, 0.5).await.unwrap();

    let positions: Vec<usize> = result
        .keywords
        .iter()
        .map(|k| catalog.iter().position(|c| *c == k.as_str()).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(result.keywords, strings(&["A", "C", "D", "E"]));
}

#[tokio::test]
async fn fallback_runs_even_when_primary_is_below_it() {
    // Primary 0.3 is more permissive than the fallback; every score is
    // below 0.3 so both passes come back empty.
    let correlator = correlator_for(&["Leadership", "Testing"], &[0.29, 0.2]).await;
    let result = correlator.correlate(LABEL, 0.3).await.unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn repeated_calls_are_identical() {
    let correlator = correlator_for(&["Leadership", "Testing", "Python"], &[0.7, 0.1, 0.62]).await;
    let first = correlator.correlate(LABEL, 0.6).await.unwrap();
    for _ in 0..5 {
        assert_eq!(correlator.correlate(LABEL, 0.6).await.unwrap(), first);
    }
}

// ============================================================
// Threshold boundaries (pure selection)
// ============================================================

#[test]
fn score_equal_to_threshold_is_excluded() {
    let keywords = strings(&["A"]);
    let result = select_matches(&keywords, &[0.3], 0.3).unwrap();
    assert!(result.is_empty());
}

#[test]
fn score_just_above_threshold_is_included() {
    let keywords = strings(&["A"]);
    let just_above = f64::from_bits(0.3_f64.to_bits() + 1);
    assert!(just_above > 0.3);
    let result = select_matches(&keywords, &[just_above], 0.3).unwrap();
    assert_eq!(result.keywords, keywords);
    assert_eq!(result.pass, MatchPass::Primary);
}

#[test]
fn score_equal_to_fallback_is_excluded() {
    let keywords = strings(&["A"]);
    let result = select_matches(&keywords, &[FALLBACK_THRESHOLD], 0.9).unwrap();
    assert!(result.is_empty());
    assert_eq!(result.pass, MatchPass::Unmatched);
}

#[test]
fn fallback_uses_exactly_point_four() {
    let keywords = strings(&["A", "B"]);
    let result = select_matches(&keywords, &[0.41, 0.39], 0.95).unwrap();
    assert_eq!(result.keywords, strings(&["A"]));
    assert_eq!(result.pass, MatchPass::Fallback);
}

// ============================================================
// Catalog embedding and failure modes
// ============================================================

#[tokio::test]
async fn catalog_is_embedded_once() {
    let keywords = ["Leadership", "Testing"];
    let embedder = Arc::new(TableEmbedder::new(scored_table(&keywords, &[0.65, 0.3])));
    let correlator = KeywordCorrelator::build(embedder.clone(), strings(&keywords))
        .await
        .unwrap();

    for _ in 0..3 {
        correlator.correlate(LABEL, 0.6).await.unwrap();
    }

    assert_eq!(embedder.batch_calls.load(Ordering::SeqCst), 1);
    assert_eq!(embedder.single_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn embedding_failure_propagates() {
    let correlator = correlator_for(&["Leadership"], &[0.65]).await;
    let err = correlator.correlate("Unknown title", 0.6).await.unwrap_err();
    match err {
        CorrelationError::Embedding { text, .. } => assert_eq!(text, "Unknown title"),
        other => panic!("expected embedding failure, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_label_is_embedded_like_any_other() {
    let mut table = scored_table(&["Leadership"], &[0.65]);
    table.insert(String::new(), vec![1.0, 0.0]);
    let correlator = KeywordCorrelator::build(
        Arc::new(TableEmbedder::new(table)),
        strings(&["Leadership"]),
    )
    .await
    .unwrap();

    let result = correlator.correlate("", 0.6).await.unwrap();
    assert_eq!(result.keywords, strings(&["Leadership"]));
}

#[tokio::test]
async fn mismatched_parts_fail_fast() {
    let embedder = Arc::new(TableEmbedder::new(HashMap::new()));
    let err = KeywordCorrelator::from_parts(embedder, strings(&["A", "B"]), vec![vec![1.0]])
        .err()
        .expect("construction should fail");
    assert!(matches!(
        err,
        CorrelationError::CatalogMismatch {
            keywords: 2,
            embeddings: 1
        }
    ));
}

#[tokio::test]
async fn label_dimension_mismatch_is_error() {
    let mut table = scored_table(&["Leadership"], &[0.65]);
    table.insert("short".to_string(), vec![1.0]);
    let correlator = KeywordCorrelator::build(
        Arc::new(TableEmbedder::new(table)),
        strings(&["Leadership"]),
    )
    .await
    .unwrap();

    let err = correlator.correlate("short", 0.6).await.unwrap_err();
    assert!(matches!(
        err,
        CorrelationError::DimensionMismatch {
            expected: 2,
            actual: 1
        }
    ));
}

/// Answers the catalog batch immediately but stalls on single labels.
struct SlowLabelEmbedder;

#[async_trait]
impl TextEmbedder for SlowLabelEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f64>> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(vec![1.0, 0.0])
    }

    fn name(&self) -> &str {
        "slow"
    }
}

#[tokio::test]
async fn timeout_bounds_label_embedding() {
    let correlator = KeywordCorrelator::build(Arc::new(SlowLabelEmbedder), strings(&["A"]))
        .await
        .unwrap()
        .with_timeout(Some(Duration::from_millis(20)));

    let err = correlator.correlate("anything", 0.6).await.unwrap_err();
    assert!(matches!(err, CorrelationError::Timeout { .. }));
}

#[tokio::test]
async fn no_timeout_waits_for_embedder() {
    let correlator = KeywordCorrelator::build(Arc::new(SlowLabelEmbedder), strings(&["A"]))
        .await
        .unwrap();

    let result = correlator.correlate("anything", 0.6).await.unwrap();
    assert_eq!(result.keywords, strings(&["A"]));
}
