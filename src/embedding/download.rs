// Fetches the sentence embedding model from HuggingFace.
//
// Files land in the platform data directory
// (~/.local/share/fabbisogni/models/ on Linux) so one download serves every
// run. Each file streams to a `.part` sibling and is renamed into place only
// once complete, so an interrupted download never looks present.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

const HF_REPO_URL: &str =
    "https://huggingface.co/sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2/resolve/main";

/// Directory under the base model dir holding this model's files.
const MODEL_SUBDIR: &str = "paraphrase-multilingual-MiniLM-L12-v2";

pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// A file to fetch: path inside the HF repo, local name, and whether it is
/// big enough to deserve a progress bar.
struct RemoteFile {
    remote: &'static str,
    local: &'static str,
    large: bool,
}

const FILES: [RemoteFile; 2] = [
    RemoteFile {
        remote: "tokenizer.json",
        local: TOKENIZER_FILE,
        large: false,
    },
    RemoteFile {
        remote: "onnx/model.onnx",
        local: MODEL_FILE,
        large: true,
    },
];

/// Base directory for model files when FABBISOGNI_MODEL_DIR is unset.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fabbisogni")
        .join("models")
}

pub fn embedding_model_dir(base: &Path) -> PathBuf {
    base.join(MODEL_SUBDIR)
}

/// True when every model file is already on disk under `base`.
pub fn embedding_files_present(base: &Path) -> bool {
    let dir = embedding_model_dir(base);
    FILES.iter().all(|f| dir.join(f.local).exists())
}

/// Download whatever model files are missing under `base`.
pub async fn download_model(base: &Path) -> Result<()> {
    let dir = embedding_model_dir(base);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Could not create {}", dir.display()))?;

    println!("\nSentence embedding model ({MODEL_SUBDIR}):");

    let client = reqwest::Client::new();
    for file in &FILES {
        let dest = dir.join(file.local);
        if dest.exists() {
            info!(file = file.local, "Already downloaded, skipping");
            println!("  {} (already present)", file.local);
            continue;
        }

        println!("  Downloading {}...", file.local);
        let url = format!("{HF_REPO_URL}/{}", file.remote);
        fetch_to(&client, &url, &dest, file.large).await?;
    }

    Ok(())
}

async fn fetch_to(client: &reqwest::Client, url: &str, dest: &Path, progress: bool) -> Result<()> {
    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request to {url} failed"))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("GET {url} returned {status}");
    }

    let bar = progress.then(|| progress_bar(response.content_length()));

    let partial = dest.with_extension("part");
    let mut out = std::fs::File::create(&partial)
        .with_context(|| format!("Could not create {}", partial.display()))?;

    let mut written = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .with_context(|| format!("Download of {url} interrupted"))?
    {
        out.write_all(&chunk)
            .with_context(|| format!("Could not write {}", partial.display()))?;
        written += chunk.len() as u64;
        if let Some(bar) = &bar {
            bar.set_position(written);
        }
    }
    out.flush()?;
    drop(out);

    std::fs::rename(&partial, dest)
        .with_context(|| format!("Could not move {} into place", dest.display()))?;

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    info!(url, dest = %dest.display(), bytes = written, "Downloaded model file");
    Ok(())
}

fn progress_bar(total: Option<u64>) -> ProgressBar {
    let (bar, template) = match total {
        Some(len) => (
            ProgressBar::new(len),
            "    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        ),
        None => (ProgressBar::new_spinner(), "    {spinner} {bytes}"),
    };
    if let Ok(style) = ProgressStyle::default_bar().template(template) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}
