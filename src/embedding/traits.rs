// Text embedder trait: the seam between the correlator and embedding backends.
//
// The default implementation runs a multilingual sentence-transformer locally
// through ONNX. An OpenAI-compatible HTTP endpoint is available as an
// alternative for machines without the model files.

use anyhow::Result;
use async_trait::async_trait;

/// Trait for turning text into dense vectors. Implementations must be
/// deterministic for identical input and must return one vector per input
/// text, in input order.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed a batch of texts, returning vectors in the same order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>>;

    /// Embed a single text.
    ///
    /// Default implementation wraps `embed_batch`. Backends can override
    /// if they have a cheaper single-item path.
    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        if vectors.len() != 1 {
            anyhow::bail!(
                "Embedder returned {} vectors for a single input",
                vectors.len()
            );
        }
        Ok(vectors.remove(0))
    }

    /// Short human-readable backend name, used in logs and reports.
    fn name(&self) -> &str;
}
