// Keyword correlator: threshold matching with a fixed fallback pass.
//
// The keyword catalog is embedded once when the correlator is built and held
// immutably afterwards, so one correlator can be shared by reference across
// concurrent lookups. Each lookup embeds the occupation label, scores it
// against every keyword by cosine similarity, and keeps the keywords whose
// score is strictly above the caller's threshold. If nothing clears it, a
// second pass runs at FALLBACK_THRESHOLD regardless of how the caller's
// threshold compares to it.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::error::CorrelationError;
use crate::embedding::similarity::cosine_similarity;
use crate::embedding::traits::TextEmbedder;

/// Threshold used for the second pass when the primary pass finds nothing.
pub const FALLBACK_THRESHOLD: f64 = 0.4;

/// Which pass produced a match set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPass {
    /// At least one keyword cleared the caller's threshold.
    Primary,
    /// The primary pass was empty; keywords cleared FALLBACK_THRESHOLD.
    Fallback,
    /// Neither pass matched anything.
    Unmatched,
}

/// Keywords matched for one label, in catalog order without duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSet {
    pub keywords: Vec<String>,
    pub pass: MatchPass,
}

impl MatchSet {
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }
}

/// Holds the keyword catalog and its precomputed embeddings.
pub struct KeywordCorrelator {
    keywords: Vec<String>,
    keyword_embeddings: Vec<Vec<f64>>,
    embedder: Arc<dyn TextEmbedder>,
    timeout: Option<Duration>,
}

impl KeywordCorrelator {
    /// Embed the whole catalog in one batch and build the correlator.
    pub async fn build(
        embedder: Arc<dyn TextEmbedder>,
        keywords: Vec<String>,
    ) -> Result<Self, CorrelationError> {
        let keyword_embeddings = embedder
            .embed_batch(&keywords)
            .await
            .map_err(|e| CorrelationError::embedding("<keyword catalog>", e))?;

        debug!(
            keywords = keywords.len(),
            backend = embedder.name(),
            "Embedded keyword catalog"
        );

        Self::from_parts(embedder, keywords, keyword_embeddings)
    }

    /// Build from precomputed embeddings, index-aligned with `keywords`.
    pub fn from_parts(
        embedder: Arc<dyn TextEmbedder>,
        keywords: Vec<String>,
        keyword_embeddings: Vec<Vec<f64>>,
    ) -> Result<Self, CorrelationError> {
        check_alignment(&keywords, &keyword_embeddings)?;

        // All catalog vectors must share one dimensionality
        if let Some(first) = keyword_embeddings.first() {
            let expected = first.len();
            if let Some(bad) = keyword_embeddings.iter().find(|v| v.len() != expected) {
                return Err(CorrelationError::DimensionMismatch {
                    expected,
                    actual: bad.len(),
                });
            }
        }

        Ok(Self {
            keywords,
            keyword_embeddings,
            embedder,
            timeout: None,
        })
    }

    /// Bound each label embedding call by `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn embedder_name(&self) -> &str {
        self.embedder.name()
    }

    /// Map an occupation label to the keywords it semantically matches.
    ///
    /// Embedding failures and timeouts propagate; an empty result is `Ok`.
    pub async fn correlate(
        &self,
        label: &str,
        primary_threshold: f64,
    ) -> Result<MatchSet, CorrelationError> {
        let scores = self.scores(label).await?;
        let matches = select_matches(&self.keywords, &scores, primary_threshold)?;

        debug!(
            label,
            threshold = primary_threshold,
            pass = ?matches.pass,
            matched = matches.len(),
            "Correlated label"
        );

        Ok(matches)
    }

    /// Similarity of `label` to every keyword, in catalog order.
    pub async fn scores(&self, label: &str) -> Result<Vec<f64>, CorrelationError> {
        check_alignment(&self.keywords, &self.keyword_embeddings)?;

        let label_embedding = self.embed_label(label).await?;

        if let Some(first) = self.keyword_embeddings.first() {
            if first.len() != label_embedding.len() {
                return Err(CorrelationError::DimensionMismatch {
                    expected: first.len(),
                    actual: label_embedding.len(),
                });
            }
        }

        Ok(self
            .keyword_embeddings
            .iter()
            .map(|k| cosine_similarity(&label_embedding, k))
            .collect())
    }

    async fn embed_label(&self, label: &str) -> Result<Vec<f64>, CorrelationError> {
        let call = self.embedder.embed(label);
        let result = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, call).await.map_err(|_| {
                CorrelationError::Timeout {
                    text: label.to_string(),
                    timeout,
                }
            })?,
            None => call.await,
        };
        result.map_err(|e| CorrelationError::embedding(label, e))
    }
}

/// Apply the primary threshold, then the fixed fallback if nothing matched.
///
/// `scores` must be index-aligned with `keywords`.
pub fn select_matches(
    keywords: &[String],
    scores: &[f64],
    primary_threshold: f64,
) -> Result<MatchSet, CorrelationError> {
    if keywords.len() != scores.len() {
        return Err(CorrelationError::CatalogMismatch {
            keywords: keywords.len(),
            embeddings: scores.len(),
        });
    }

    let primary = keywords_above(keywords, scores, primary_threshold);
    if !primary.is_empty() {
        return Ok(MatchSet {
            keywords: primary,
            pass: MatchPass::Primary,
        });
    }

    let fallback = keywords_above(keywords, scores, FALLBACK_THRESHOLD);
    let pass = if fallback.is_empty() {
        MatchPass::Unmatched
    } else {
        MatchPass::Fallback
    };

    Ok(MatchSet {
        keywords: fallback,
        pass,
    })
}

/// Keywords scoring strictly above `threshold`, in catalog order, first
/// occurrence only.
fn keywords_above(keywords: &[String], scores: &[f64], threshold: f64) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut matches = Vec::new();
    for (keyword, &score) in keywords.iter().zip(scores) {
        if score > threshold && seen.insert(keyword.as_str()) {
            matches.push(keyword.clone());
        }
    }
    matches
}

fn check_alignment(keywords: &[String], embeddings: &[Vec<f64>]) -> Result<(), CorrelationError> {
    if keywords.len() != embeddings.len() {
        return Err(CorrelationError::CatalogMismatch {
            keywords: keywords.len(),
            embeddings: embeddings.len(),
        });
    }
    Ok(())
}
