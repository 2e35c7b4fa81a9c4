use chrono::Utc;
use clap::{Parser, Subcommand};
use legal_search_core::{
    load_corpus, CorpusHandle, PipelineOptions, QueryPipeline,
};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "legal-search", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory of JSON document records forming the corpus.
    #[arg(long, env = "LEGAL_CORPUS_DIR", default_value = "./legal_corpus")]
    corpus_dir: String,

    /// Number of ranked candidates to retain.
    #[arg(long, env = "LEGAL_TOP_K", default_value = "5")]
    top_k: usize,

    /// Maximum excerpt window length in characters.
    #[arg(long, env = "LEGAL_EXCERPT_WINDOW", default_value = "250")]
    excerpt_window: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Load the corpus and report what was indexed.
    Load,
    /// Answer a query against the corpus with citations.
    Query {
        /// The legal question to answer.
        #[arg(long)]
        text: String,
        /// Emit the full result as JSON instead of formatted text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "legal-search boot"
    );

    let options = PipelineOptions {
        top_k: cli.top_k,
        excerpt_window_chars: cli.excerpt_window,
        ..Default::default()
    };

    match cli.command {
        Command::Load => {
            let report = load_corpus(Path::new(&cli.corpus_dir))?;

            if !report.skipped.is_empty() {
                warn!(
                    "skipped_records={} for corpus_dir={}",
                    report.skipped.len(),
                    cli.corpus_dir
                );
                for skipped in &report.skipped {
                    warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped record");
                }
            }

            println!(
                "{} documents indexed from {} at {}",
                report.snapshot.len(),
                cli.corpus_dir,
                Utc::now().to_rfc3339()
            );
            for document in report.snapshot.documents() {
                println!("[{}] {}", document.document_id, document.title);
            }
        }
        Command::Query { text, json } => {
            let report = load_corpus(Path::new(&cli.corpus_dir))?;

            for skipped in &report.skipped {
                warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped record");
            }

            let corpus = CorpusHandle::with_snapshot(report.snapshot);
            let pipeline = QueryPipeline::extractive(corpus, options);

            let result = pipeline
                .answer(&text)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            println!("query_id: {}", result.query_id);
            println!("confidence: {:.3}", result.confidence);
            println!();
            println!("{}", result.answer);

            if !result.citations.is_empty() {
                println!();
                println!("citations:");
                for citation in &result.citations {
                    println!(
                        "[{}] {} (chars {}..{})",
                        citation.document_id,
                        citation.title,
                        citation.offset_start,
                        citation.offset_end
                    );
                    println!("  {}", citation.excerpt);
                }
            }
        }
    }

    Ok(())
}
