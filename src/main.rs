use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;

use arag_agent::RagPipeline;
use arag_cli::{
    ChatSession, display_banner, handle_input_with_history, print_error, print_help, print_response,
    print_sources,
};
use arag_core::{ChatModel, Embedder, Settings, VectorIndex};
use arag_groq::{GroqClient, GroqConfig};
use arag_rag::{
    DocumentIndexer, DocumentStore, HashEmbedder, IndexingResult, LocalVectorIndex, MarkdownLoader,
    QdrantVectorIndex,
};
use arag_voyage::{VoyageConfig, VoyageEmbedder};

mod logging;

/// Index name used by `--local` when INDEX_NAME is unset
const LOCAL_INDEX_NAME: &str = "arag-local";

#[derive(Parser)]
#[command(name = "arag")]
#[command(about = "Retrieval-augmented assistant for marketing content", long_about = None)]
struct Cli {
    /// Use the offline hash embedder and an in-memory index built from the data directory
    #[arg(long, global = true)]
    local: bool,

    /// Directory of processed markdown documents (overrides DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log pipeline stages to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Chat,
    /// Answer one request and exit
    Ask { query: String },
    /// Load, split and index the markdown corpus
    Index {
        /// Only index this subdirectory of the data directory
        #[arg(long)]
        campaign: Option<String>,
        /// Delete every vector before indexing
        #[arg(long)]
        reset: bool,
    },
    /// Create the vector index if it does not exist
    InitIndex,
}

impl Commands {
    fn runs_pipeline(&self) -> bool {
        matches!(self, Commands::Chat | Commands::Ask { .. })
    }
}

/// The in-memory index dies with the process, so `--local` only serves
/// commands that answer requests.
fn check_local_command(local: bool, command: &Commands) -> Result<()> {
    if local && !command.runs_pipeline() {
        anyhow::bail!("--local only applies to `chat` and `ask`; the in-memory index is not persisted");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut settings = load_settings(cli.local)?;
    if let Some(dir) = cli.data_dir {
        settings.ingestion.data_dir = dir;
    }
    let command = cli.command.unwrap_or(Commands::Chat);
    check_local_command(cli.local, &command)?;
    tracing::info!(index = %settings.index.name, local = cli.local, "Settings loaded");

    if cli.local {
        let store = Arc::new(DocumentStore::new(
            Arc::new(HashEmbedder::default()),
            Arc::new(LocalVectorIndex::new(settings.index.name.as_str())),
        ));
        let result = index_corpus(&store, &settings, None)
            .await
            .context("Failed to build the in-memory index")?;
        print_indexing_result(&result, &settings);
        dispatch(command, store, &settings).await
    } else {
        let voyage = VoyageConfig::from_env()?.with_timeout(settings.request_timeout);
        let embedder = VoyageEmbedder::new(voyage)?;
        let index = QdrantVectorIndex::new(
            &settings.index.qdrant_url,
            settings.index.qdrant_api_key.clone(),
            &settings.index.name,
        )?;
        if command.runs_pipeline() {
            index.ensure_exists().await?;
        }
        let store = Arc::new(DocumentStore::new(Arc::new(embedder), Arc::new(index)));
        dispatch(command, store, &settings).await
    }
}

fn load_settings(local: bool) -> Result<Settings> {
    let settings = if local {
        Settings::from_lookup(|key| {
            std::env::var(key)
                .ok()
                .or_else(|| (key == "INDEX_NAME").then(|| LOCAL_INDEX_NAME.to_string()))
        })?
    } else {
        Settings::from_env()?
    };
    Ok(settings)
}

async fn dispatch<E: Embedder, I: VectorIndex>(
    command: Commands,
    store: Arc<DocumentStore<E, I>>,
    settings: &Settings,
) -> Result<()> {
    match command {
        Commands::InitIndex => {
            let created = store.create_index_if_absent().await?;
            if created {
                println!("{} Created index '{}'", "✅".green(), store.index().name());
            } else {
                println!("{} Index '{}' already exists", "ℹ️".blue(), store.index().name());
            }
        }
        Commands::Index { campaign, reset } => {
            if reset {
                store.create_index_if_absent().await?;
                store.clear().await?;
                println!("{} Cleared index '{}'", "🧹".yellow(), store.index().name());
            }
            let result = index_corpus(&store, settings, campaign.as_deref()).await?;
            print_indexing_result(&result, settings);
        }
        Commands::Ask { query } => {
            let pipeline = RagPipeline::new(chat_model(settings)?, store, settings);
            let response = pipeline.run(&query, &[]).await?;
            print_response(&response);
            print_sources(&response.source_documents);
        }
        Commands::Chat => {
            let pipeline = RagPipeline::new(chat_model(settings)?, store, settings);
            chat_loop(&pipeline).await?;
        }
    }
    Ok(())
}

fn chat_model(settings: &Settings) -> Result<Arc<GroqClient>> {
    let config = GroqConfig::from_env()?.with_timeout(settings.request_timeout);
    Ok(Arc::new(GroqClient::new(config)?))
}

async fn index_corpus<E: Embedder, I: VectorIndex>(
    store: &Arc<DocumentStore<E, I>>,
    settings: &Settings,
    campaign: Option<&str>,
) -> Result<IndexingResult> {
    let loader = MarkdownLoader::new(&settings.ingestion.data_dir);
    let indexer = DocumentIndexer::with_settings(store.clone(), &settings.ingestion);
    Ok(indexer.index_directory(&loader, campaign).await?)
}

fn print_indexing_result(result: &IndexingResult, settings: &Settings) {
    if result.documents_loaded == 0 {
        println!(
            "{} No documents found in {}",
            "⚠️".yellow(),
            settings.ingestion.data_dir.display()
        );
    } else {
        println!(
            "{} Indexed {} chunks from {} documents",
            "✅".green(),
            result.chunks_indexed,
            result.documents_loaded
        );
    }
}

async fn chat_loop<M: ChatModel, E: Embedder, I: VectorIndex>(
    pipeline: &RagPipeline<M, E, I>,
) -> Result<()> {
    display_banner();

    let mut session = ChatSession::new();
    let mut input_history = Vec::new();

    while let Some(input) = handle_input_with_history(&mut input_history)? {
        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "exit" | "quit" | "sair" => break,
            "help" => {
                print_help();
                continue;
            }
            "sources" => {
                print_sources(session.current_sources());
                continue;
            }
            "clear" => {
                session.clear();
                println!("{}", "Nova conversa iniciada.".dimmed());
                continue;
            }
            _ => {}
        }

        println!("{} Buscando referências...", "🔎".blue());
        match pipeline.run(&input, session.history()).await {
            Ok(response) => {
                print_response(&response);
                session.record(&input, &response);
            }
            Err(e) => print_error(&e),
        }
    }

    println!("{}", "👋 Até logo!".green());
    Ok(())
}
