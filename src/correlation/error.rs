use std::time::Duration;

use thiserror::Error;

/// Errors from building or querying a [`KeywordCorrelator`](super::KeywordCorrelator).
///
/// An empty match set is not an error; it comes back as `Ok`.
#[derive(Debug, Error)]
pub enum CorrelationError {
    /// The embedder could not produce a vector for the given text.
    #[error("failed to embed {text:?}")]
    Embedding {
        text: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The embedder did not answer within the configured per-call timeout.
    #[error("embedding {text:?} timed out after {timeout:?}")]
    Timeout { text: String, timeout: Duration },

    /// Keywords and their embeddings are no longer index-aligned.
    #[error("keyword catalog is inconsistent: {keywords} keywords but {embeddings} embeddings")]
    CatalogMismatch { keywords: usize, embeddings: usize },

    /// A vector's dimensionality differs from the catalog's.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl CorrelationError {
    pub(crate) fn embedding(text: &str, source: anyhow::Error) -> Self {
        Self::Embedding {
            text: text.to_string(),
            source: source.into(),
        }
    }
}
