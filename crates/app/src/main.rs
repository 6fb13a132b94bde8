use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use pdf_qa_core::{
    format_context, ingest_paths_best_effort, ChatCompletionGenerator, ChunkStrategy,
    ChunkingConfig, EngineOptions, GenerationConfig, IngestMode, QaCoordinator, QaError,
    SearchOptions, StoreError, VectorizerConfig, DEFAULT_LLM_ENDPOINT, DEFAULT_LLM_MODEL,
};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-qa", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding the persisted chunk list
    #[arg(long, env = "PDF_QA_INDEX_DIR", default_value = "index")]
    index_dir: PathBuf,

    /// Maximum characters per chunk
    #[arg(long, default_value = "2000")]
    chunk_size: usize,

    /// Characters shared by adjacent sliding-window chunks
    #[arg(long, default_value = "300")]
    chunk_overlap: usize,

    /// Chunks shorter than this are discarded
    #[arg(long, default_value = "100")]
    min_chunk_chars: usize,

    /// How documents are cut into chunks
    #[arg(long, value_enum, default_value_t = StrategyArg::Paragraph)]
    chunk_strategy: StrategyArg,

    /// Upper bound on the vocabulary size
    #[arg(long, default_value = "10000")]
    max_features: usize,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "LLM_ENDPOINT", default_value = DEFAULT_LLM_ENDPOINT)]
    llm_endpoint: String,

    /// Model used to generate answers
    #[arg(long, env = "LLM_MODEL", default_value = DEFAULT_LLM_MODEL)]
    llm_model: String,

    /// API key for the generation endpoint
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    llm_api_key: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Paragraph,
    SlidingWindow,
}

impl From<StrategyArg> for ChunkStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Paragraph => ChunkStrategy::Paragraph,
            StrategyArg::SlidingWindow => ChunkStrategy::SlidingWindow,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Chunk PDF and text documents and rebuild the index from them.
    Ingest {
        /// Document file or folder searched recursively; repeatable.
        #[arg(long = "path", required = true)]
        paths: Vec<PathBuf>,
        /// Keep the chunks already indexed and add the new ones.
        #[arg(long, default_value_t = false)]
        append: bool,
    },
    /// Index pasted text, read from --text or standard input.
    Paste {
        #[arg(long)]
        text: Option<String>,
        #[arg(long, default_value_t = false)]
        append: bool,
    },
    /// Print the chunks most relevant to a query.
    Search {
        #[arg(long)]
        query: String,
        #[arg(long, default_value = "5")]
        top_k: usize,
        #[arg(long, default_value = "0.05")]
        min_similarity: f64,
        #[arg(long, default_value = "1000")]
        max_chunk_chars: usize,
    },
    /// Answer a question from the retrieved chunks.
    Ask {
        #[arg(long)]
        question: String,
        #[arg(long, default_value = "5")]
        top_k: usize,
        /// Print the retrieved context without calling the generation endpoint.
        #[arg(long, default_value_t = false)]
        context_only: bool,
    },
}

impl Cli {
    fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            chunking: ChunkingConfig {
                max_chars: self.chunk_size,
                overlap_chars: self.chunk_overlap,
                min_chars: self.min_chunk_chars,
                strategy: self.chunk_strategy.into(),
            },
            vectorizer: VectorizerConfig {
                max_features: self.max_features,
                ..VectorizerConfig::default()
            },
            search: SearchOptions::default(),
        }
    }

    fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            endpoint: self.llm_endpoint.clone(),
            model: self.llm_model.clone(),
            api_key: self.llm_api_key.clone(),
            ..GenerationConfig::default()
        }
    }
}

fn ingest_mode(append: bool) -> IngestMode {
    if append {
        IngestMode::Append
    } else {
        IngestMode::Replace
    }
}

async fn restore_for_append(
    coordinator: &QaCoordinator<ChatCompletionGenerator>,
    index_dir: &Path,
) -> anyhow::Result<()> {
    match coordinator.restore(index_dir).await {
        Ok(_) => Ok(()),
        Err(QaError::Store(StoreError::NotFound(path))) => {
            warn!(path = %path.display(), "no saved index to append to, starting fresh");
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut options = cli.engine_options();
    if let Command::Search {
        top_k,
        min_similarity,
        max_chunk_chars,
        ..
    } = &cli.command
    {
        options.search = SearchOptions {
            top_k: *top_k,
            min_similarity: *min_similarity,
            max_chunk_chars: *max_chunk_chars,
        };
    }
    if let Command::Ask { top_k, .. } = &cli.command {
        options.search.top_k = *top_k;
    }

    let generator = ChatCompletionGenerator::new(cli.generation_config())?;
    let coordinator = QaCoordinator::new(generator, options.clone())?.with_index_dir(cli.index_dir.clone());
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        index_dir = %cli.index_dir.display(),
        "pdf-qa boot"
    );

    match cli.command {
        Command::Ingest { paths, append } => {
            let mode = ingest_mode(append);
            if mode == IngestMode::Append {
                restore_for_append(&coordinator, &cli.index_dir).await?;
            }

            let report = ingest_paths_best_effort(&paths, options.chunking)?;
            for skipped in &report.skipped_files {
                warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped document");
            }

            let chunk_count = coordinator.rebuild(report.chunks.clone(), mode).await?;
            for document in &report.documents {
                println!(
                    "{} chunks={} checksum={}",
                    document.title, document.chunk_count, document.checksum
                );
            }
            println!(
                "{} chunks indexed ({} new, {} skipped files, avg {:.0} chars) at {}",
                chunk_count,
                report.chunks.len(),
                report.skipped_files.len(),
                report.average_chunk_chars(),
                Utc::now().to_rfc3339()
            );
        }
        Command::Paste { text, append } => {
            let mode = ingest_mode(append);
            if mode == IngestMode::Append {
                restore_for_append(&coordinator, &cli.index_dir).await?;
            }

            let text = match text {
                Some(text) => text,
                None => {
                    let mut buffer = String::new();
                    tokio::io::stdin().read_to_string(&mut buffer).await?;
                    buffer
                }
            };

            let report = coordinator.ingest_pasted_text(&text, mode).await?;
            println!("{} chunks indexed from pasted text", report.chunks.len());
        }
        Command::Search { query, .. } => {
            coordinator.restore(&cli.index_dir).await?;
            let hits = coordinator.search(&query).await?;

            println!("query: {query}");
            for hit in hits {
                println!("[{}] similarity={:.4}", hit.corpus_index, hit.similarity);
                println!("{}\n", hit.text);
            }
        }
        Command::Ask {
            question,
            context_only,
            ..
        } => {
            coordinator.restore(&cli.index_dir).await?;

            if context_only || cli.llm_api_key.is_none() {
                if !context_only {
                    warn!("LLM_API_KEY is not set, printing retrieved context only");
                }
                let context: Vec<String> = coordinator
                    .search(&question)
                    .await?
                    .into_iter()
                    .map(|hit| hit.text)
                    .collect();
                println!("{}", format_context(&context));
                return Ok(());
            }

            let answer = coordinator.ask(&question).await?;
            println!("{}", answer.answer);
        }
    }

    Ok(())
}
