use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use fabbisogni::analysis::RankBy;
use fabbisogni::classify::{clean_profession_name, ProfessionClassifier};
use fabbisogni::config::{timeout_from_secs, Config, EmbedderBackend};
use fabbisogni::correlation::catalog::default_keywords;
use fabbisogni::correlation::{select_matches, KeywordCorrelator};
use fabbisogni::embedding::traits::TextEmbedder;
use fabbisogni::output::terminal;
use fabbisogni::pipeline::{self, AnalyzeOptions};

/// Fabbisogni: occupational demand analysis.
///
/// Ranks occupations by planned and hard-to-fill hires, classifies them as
/// managerial or operational, and correlates each one with a catalog of
/// skill keywords by semantic similarity.
#[derive(Parser)]
#[command(name = "fabbisogni", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis on the demand workbook
    Analyze {
        /// Input workbook (default: FABBISOGNI_INPUT or FABBISOGNI_all.xlsx)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Sheet to read (default: FABBISOGNI_SHEET or " PROFESSIONE LVL4 CP2011")
        #[arg(long)]
        sheet: Option<String>,

        /// Results workbook (default: FABBISOGNI_OUTPUT or Results.xlsx)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Directory for the Markdown report (default: FABBISOGNI_OUTPUT_DIR or GRAPH)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Primary similarity threshold (default: FABBISOGNI_THRESHOLD or 0.6)
        #[arg(long)]
        threshold: Option<f64>,

        /// Number of occupations correlated in parallel (default: 4)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Per-call embedding timeout in seconds, 0 for none
        #[arg(long)]
        embed_timeout_secs: Option<f64>,

        /// Abort on the first failed correlation instead of skipping it
        #[arg(long)]
        strict: bool,
    },

    /// Correlate a single occupation title and show the similarity scores
    Correlate {
        /// The occupation title, e.g. "Ingegneri elettronici"
        label: String,

        /// Primary similarity threshold (default: FABBISOGNI_THRESHOLD or 0.6)
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// List the skill keyword catalog
    Keywords,

    /// Download the multilingual sentence embedding model (~470 MB)
    DownloadModel,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fabbisogni=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            sheet,
            output,
            output_dir,
            threshold,
            concurrency,
            embed_timeout_secs,
            strict,
        } => {
            let mut config = Config::load()?;
            if let Some(secs) = embed_timeout_secs {
                config.embed_timeout = timeout_from_secs(secs);
            }
            config.require_embedder()?;

            let options = AnalyzeOptions {
                input: input.unwrap_or_else(|| config.input_path.clone()),
                sheet: sheet.unwrap_or_else(|| config.sheet.clone()),
                output: output.unwrap_or_else(|| config.output_path.clone()),
                output_dir: output_dir.unwrap_or_else(|| config.output_dir.clone()),
                threshold: threshold.unwrap_or(config.threshold),
                concurrency: concurrency.unwrap_or(config.concurrency),
                strict,
            };

            println!("Loading embedding model for semantic analysis...");
            let correlator = build_correlator(&config).await?;
            println!("  {} ({})", "Model loaded.".green(), correlator.embedder_name());

            println!("Reading {}...", options.input.display());
            let classifier = ProfessionClassifier::new();
            let outcome = pipeline::run(&correlator, &classifier, &options).await?;

            terminal::display_top_table(
                "Top 10 Professioni per Entrate Programmate",
                &outcome.analysis.top_planned_hires,
                RankBy::PlannedHires,
            );
            terminal::display_top_table(
                "Top 10 Professioni per Difficoltà di Reperimento",
                &outcome.analysis.top_hard_to_fill,
                RankBy::HardToFill,
            );
            terminal::display_summary(&outcome.analysis);

            println!("\n{}", "Analysis complete.".bold());
            println!("  Workbook: {}", outcome.workbook.display());
            println!("  Report:   {}", outcome.report.display());
        }

        Commands::Correlate { label, threshold } => {
            let config = Config::load()?;
            config.require_embedder()?;
            let threshold = threshold.unwrap_or(config.threshold);

            let correlator = build_correlator(&config).await?;
            let label = clean_profession_name(&label);

            let scores = correlator.scores(&label).await?;
            let matches = select_matches(correlator.keywords(), &scores, threshold)?;

            let classifier = ProfessionClassifier::new();
            println!("Level: {}", classifier.classify(&label).label().cyan());
            terminal::display_correlation(
                &label,
                threshold,
                &matches,
                correlator.keywords(),
                &scores,
            );
        }

        Commands::Keywords => {
            let keywords = default_keywords();
            println!("{}", format!("=== Keyword catalog ({}) ===", keywords.len()).bold());
            for (i, keyword) in keywords.iter().enumerate() {
                println!("  {:>3}. {}", i + 1, keyword);
            }
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            let model_dir = &config.model_dir;

            println!("Downloading ONNX embedding model...");
            println!("  Destination: {}", model_dir.display());

            fabbisogni::embedding::download::download_model(model_dir).await?;

            println!("\n{}", "Model downloaded successfully.".bold());
            println!("You can now run `fabbisogni analyze`.");
        }
    }

    Ok(())
}

/// Create the configured embedder and embed the keyword catalog once.
async fn build_correlator(config: &Config) -> Result<KeywordCorrelator> {
    let embedder = create_embedder(config)?;
    let correlator = KeywordCorrelator::build(embedder, default_keywords())
        .await?
        .with_timeout(config.embed_timeout);
    info!(
        keywords = correlator.keywords().len(),
        "Keyword catalog embedded"
    );
    Ok(correlator)
}

/// Create a text embedder based on the configured backend.
fn create_embedder(config: &Config) -> Result<Arc<dyn TextEmbedder>> {
    match config.embedder_backend {
        EmbedderBackend::Onnx => {
            info!("Using local ONNX sentence embedder");
            let dir = fabbisogni::embedding::download::embedding_model_dir(&config.model_dir);
            let embedder = fabbisogni::embedding::onnx::SentenceEmbedder::load(&dir)?;
            Ok(Arc::new(embedder))
        }
        EmbedderBackend::Http => {
            info!(url = %config.embedding_api_url, "Using HTTP embeddings endpoint");
            let embedder = fabbisogni::embedding::http::HttpEmbedder::new(
                &config.embedding_api_url,
                config.embedding_api_key.clone(),
                config.embedding_model.clone(),
                config.embedding_rps,
            );
            Ok(Arc::new(embedder))
        }
    }
}
