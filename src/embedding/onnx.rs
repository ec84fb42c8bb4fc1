// Local sentence embeddings with paraphrase-multilingual-MiniLM-L12-v2.
//
// The occupation titles and the skill catalog mix Italian and English, so the
// model has to be multilingual: "Ingegnere elettronico" and "SW Engineering"
// should land near each other. Output is 384-dimensional, mean-pooled over
// the real (unpadded) tokens.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::debug;

use super::download::{MODEL_FILE, TOKENIZER_FILE};
use super::traits::TextEmbedder;

/// Embedding dimension for paraphrase-multilingual-MiniLM-L12-v2.
pub const EMBEDDING_DIM: usize = 384;

/// XLM-R pad id, used when the tokenizer has no `<pad>` token.
const DEFAULT_PAD_ID: i64 = 1;

/// Sentence embedder backed by a local ONNX model.
///
/// Inference runs on spawn_blocking and `Session::run` takes `&mut self`,
/// so the session sits behind Arc<Mutex<_>>.
pub struct SentenceEmbedder {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    pad_id: i64,
}

impl SentenceEmbedder {
    /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join(MODEL_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);

        for path in [&model_path, &tokenizer_path] {
            if !path.exists() {
                anyhow::bail!(
                    "Missing embedding model file: {}\nRun `fabbisogni download-model` to fetch it.",
                    path.display()
                );
            }
        }

        let session = Session::builder()
            .context("Could not create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Could not load ONNX model {}", model_path.display()))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            anyhow::anyhow!("Could not load tokenizer {}: {}", tokenizer_path.display(), e)
        })?;

        let pad_id = tokenizer
            .token_to_id("<pad>")
            .map(i64::from)
            .unwrap_or(DEFAULT_PAD_ID);

        debug!(model_dir = %model_dir.display(), pad_id, "Sentence embedder ready");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            pad_id,
        })
    }
}

#[async_trait]
impl TextEmbedder for SentenceEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let pad_id = self.pad_id;
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || -> Result<Vec<Vec<f64>>> {
            let rows = tokenize(&tokenizer, &texts)?;
            let batch = PaddedBatch::new(rows, pad_id);
            if batch.seq_len == 0 {
                return Ok(vec![vec![0.0; EMBEDDING_DIM]; batch.size]);
            }
            let hidden = run_model(&session, &batch)?;
            Ok(mean_pool(&hidden, &batch.attention_mask, batch.seq_len))
        })
        .await
        .context("Embedding task panicked")?
    }

    fn name(&self) -> &str {
        "onnx:paraphrase-multilingual-MiniLM-L12-v2"
    }
}

/// Token ids and attention mask for each text, special tokens included.
fn tokenize(tokenizer: &Tokenizer, texts: &[String]) -> Result<Vec<(Vec<i64>, Vec<i64>)>> {
    texts
        .iter()
        .map(|text| {
            let encoding = tokenizer
                .encode(text.as_str(), true)
                .map_err(|e| anyhow::anyhow!("Could not tokenize {:?}: {}", text, e))?;
            let ids = encoding.get_ids().iter().map(|&id| i64::from(id)).collect();
            let mask = encoding
                .get_attention_mask()
                .iter()
                .map(|&m| i64::from(m))
                .collect();
            Ok((ids, mask))
        })
        .collect()
}

/// Row-major `[size, seq_len]` model inputs, right-padded to the longest text.
#[derive(Debug)]
struct PaddedBatch {
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
    size: usize,
    seq_len: usize,
}

impl PaddedBatch {
    fn new(rows: Vec<(Vec<i64>, Vec<i64>)>, pad_id: i64) -> Self {
        let size = rows.len();
        let seq_len = rows.iter().map(|(ids, _)| ids.len()).max().unwrap_or(0);

        let mut input_ids = Vec::with_capacity(size * seq_len);
        let mut attention_mask = Vec::with_capacity(size * seq_len);
        for (mut ids, mut mask) in rows {
            ids.resize(seq_len, pad_id);
            mask.resize(seq_len, 0);
            input_ids.extend(ids);
            attention_mask.extend(mask);
        }

        Self {
            input_ids,
            attention_mask,
            size,
            seq_len,
        }
    }

    fn shape(&self) -> [i64; 2] {
        [self.size as i64, self.seq_len as i64]
    }
}

/// One forward pass; returns `last_hidden_state` flattened as
/// `[size, seq_len, EMBEDDING_DIM]`.
fn run_model(session: &Mutex<Session>, batch: &PaddedBatch) -> Result<Vec<f32>> {
    let shape = batch.shape();
    let input_ids = Tensor::from_array((shape, batch.input_ids.clone()))
        .context("Could not build input_ids tensor")?;
    let attention_mask = Tensor::from_array((shape, batch.attention_mask.clone()))
        .context("Could not build attention_mask tensor")?;
    // Single-sentence input: every token belongs to segment 0
    let token_type_ids = Tensor::from_array((shape, vec![0_i64; batch.input_ids.len()]))
        .context("Could not build token_type_ids tensor")?;

    let mut session = session
        .lock()
        .map_err(|e| anyhow::anyhow!("ONNX session mutex poisoned: {}", e))?;
    let outputs = session
        .run(ort::inputs! {
            "input_ids" => input_ids,
            "attention_mask" => attention_mask,
            "token_type_ids" => token_type_ids
        })
        .context("ONNX inference failed")?;
    let (_, hidden) = outputs[0]
        .try_extract_tensor::<f32>()
        .context("Could not read last_hidden_state")?;

    let expected = batch.size * batch.seq_len * EMBEDDING_DIM;
    if hidden.len() != expected {
        anyhow::bail!(
            "Model returned {} values, expected {} ({} x {} x {})",
            hidden.len(),
            expected,
            batch.size,
            batch.seq_len,
            EMBEDDING_DIM
        );
    }

    debug!(texts = batch.size, seq_len = batch.seq_len, "Ran sentence model");
    Ok(hidden.to_vec())
}

/// Average each text's token vectors over the positions its mask marks real.
/// A text with no real tokens pools to the zero vector.
fn mean_pool(hidden: &[f32], attention_mask: &[i64], seq_len: usize) -> Vec<Vec<f64>> {
    hidden
        .chunks_exact(seq_len * EMBEDDING_DIM)
        .zip(attention_mask.chunks_exact(seq_len))
        .map(|(tokens, mask)| {
            let mut pooled = vec![0.0_f64; EMBEDDING_DIM];
            let mut weight = 0.0_f64;
            for (token, &m) in tokens.chunks_exact(EMBEDDING_DIM).zip(mask) {
                if m == 0 {
                    continue;
                }
                weight += m as f64;
                for (acc, &v) in pooled.iter_mut().zip(token) {
                    *acc += f64::from(v) * m as f64;
                }
            }
            if weight > 0.0 {
                pooled.iter_mut().for_each(|v| *v /= weight);
            }
            pooled
        })
        .collect()
}
