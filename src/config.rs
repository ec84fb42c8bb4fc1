use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tracing::warn;

use crate::embedding::download;

/// Primary similarity threshold used when none is configured.
pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// Default number of occupations correlated concurrently.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Which embedding backend to use.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbedderBackend {
    /// Local ONNX model (default). No API key, no network after download
    Onnx,
    /// OpenAI-compatible `/embeddings` endpoint
    Http,
}

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded at startup via dotenvy. CLI flags override
/// individual fields per run.
#[derive(Debug, Clone)]
pub struct Config {
    pub embedder_backend: EmbedderBackend,
    /// Base directory containing the ONNX model files
    pub model_dir: PathBuf,
    pub input_path: PathBuf,
    /// Input sheet name. The default has a leading space, as in the source
    /// workbooks.
    pub sheet: String,
    pub output_path: PathBuf,
    /// Directory for the Markdown report
    pub output_dir: PathBuf,
    pub threshold: f64,
    pub concurrency: usize,
    /// Per-call timeout for label embeddings
    pub embed_timeout: Option<Duration>,
    pub embedding_api_url: String,
    pub embedding_api_key: String,
    pub embedding_model: String,
    pub embedding_rps: f64,
}

impl Config {
    /// Load configuration from environment variables, with defaults.
    pub fn load() -> Result<Self> {
        let embedder_backend = match env::var("FABBISOGNI_EMBEDDER").as_deref() {
            Ok("http") => EmbedderBackend::Http,
            // "onnx" or unset both default to ONNX
            _ => EmbedderBackend::Onnx,
        };

        let model_dir = env::var("FABBISOGNI_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| download::default_model_dir());

        let threshold = parse_threshold(env::var("FABBISOGNI_THRESHOLD").ok().as_deref());

        let concurrency = env::var("FABBISOGNI_CONCURRENCY")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_CONCURRENCY);

        let embed_timeout = env::var("FABBISOGNI_EMBED_TIMEOUT_SECS")
            .ok()
            .and_then(|v| parse_timeout_secs(&v));

        let embedding_rps = env::var("EMBEDDING_RPS")
            .ok()
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(5.0);

        Ok(Self {
            embedder_backend,
            model_dir,
            input_path: env_path("FABBISOGNI_INPUT", "FABBISOGNI_all.xlsx"),
            sheet: env::var("FABBISOGNI_SHEET")
                .unwrap_or_else(|_| " PROFESSIONE LVL4 CP2011".to_string()),
            output_path: env_path("FABBISOGNI_OUTPUT", "Results.xlsx"),
            output_dir: env_path("FABBISOGNI_OUTPUT_DIR", "GRAPH"),
            threshold,
            concurrency,
            embed_timeout,
            embedding_api_url: env::var("EMBEDDING_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            embedding_api_key: env::var("EMBEDDING_API_KEY").unwrap_or_default(),
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            embedding_rps,
        })
    }

    /// Validate that the chosen embedder backend has what it needs.
    /// For ONNX: model files must exist (or the user should run download-model).
    /// For HTTP: an API key must be set.
    pub fn require_embedder(&self) -> Result<()> {
        match self.embedder_backend {
            EmbedderBackend::Onnx => {
                if !download::embedding_files_present(&self.model_dir) {
                    anyhow::bail!(
                        "Embedding model files not found in {}\n\
                         Run `fabbisogni download-model` to download them.\n\
                         Or set FABBISOGNI_EMBEDDER=http to use a remote embeddings endpoint.",
                        download::embedding_model_dir(&self.model_dir).display()
                    );
                }
                Ok(())
            }
            EmbedderBackend::Http => {
                if self.embedding_api_key.is_empty() {
                    anyhow::bail!(
                        "EMBEDDING_API_KEY not set. Add it to your .env file,\n\
                         or unset FABBISOGNI_EMBEDDER to use the local ONNX model."
                    );
                }
                Ok(())
            }
        }
    }
}

/// Parse a primary threshold, falling back to the default on bad input.
///
/// Empty or missing input silently uses the default; anything unparseable or
/// non-finite logs a warning first.
pub fn parse_threshold(raw: Option<&str>) -> f64 {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return DEFAULT_THRESHOLD;
    };
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            warn!(
                value = raw,
                default = DEFAULT_THRESHOLD,
                "Invalid similarity threshold, using default"
            );
            DEFAULT_THRESHOLD
        }
    }
}

/// Parse a timeout in (possibly fractional) seconds. Empty or zero means no
/// timeout; anything else that isn't a usable timeout warns and means none.
pub fn parse_timeout_secs(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(secs) => timeout_from_secs(secs),
        Err(_) => {
            warn!(value = raw, "Invalid embedding timeout, running without one");
            None
        }
    }
}

/// Convert seconds to a timeout. Zero disables it; negative, non-finite or
/// out-of-range values warn and disable it.
pub fn timeout_from_secs(secs: f64) -> Option<Duration> {
    if secs == 0.0 {
        return None;
    }
    match Duration::try_from_secs_f64(secs) {
        Ok(timeout) => Some(timeout),
        Err(_) => {
            warn!(value = secs, "Unusable embedding timeout, running without one");
            None
        }
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}
