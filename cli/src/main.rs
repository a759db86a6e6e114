//! CLI entrypoint for fincounsel
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use fincounsel_application::{
    ConversationLogger, EmbeddingService, HandleTurnUseCase, KnowledgeChain, NoConversationLogger,
    NoProgress, NoSessionStore, PipelineConfig, RetrievalEngine, SessionManager, SessionStore,
    SynthesisParams, SynthesisStage, TurnProgress, VectorStore,
};
use fincounsel_domain::{DrafterKind, PatternGuardrail, SessionId};
use fincounsel_infrastructure::config::{FileEmbeddingConfig, FileLlmConfig, FileVectorStoreConfig};
use fincounsel_infrastructure::{
    ConfigLoader, EmbeddingProvider, FileConfig, FinancialCalculators, HashingEmbedder,
    InMemoryVectorStore, JsonSessionStore, JsonlConversationLogger, VectorStoreProvider,
};
use fincounsel_presentation::{
    ChatRepl, Cli, ConsoleFormatter, OutputConfig, OutputFormatter, ProgressReporter, ReplConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };
    config.validate().context("Invalid configuration")?;

    let _log_guard = init_logging(cli.verbose, &config);

    info!("Starting fincounsel");

    let output = OutputConfig {
        format: cli
            .output
            .map(Into::into)
            .or(config.output.format)
            .unwrap_or_default(),
        color: config.output.color,
        show_trace: cli.trace || config.output.show_trace,
    };
    output.apply_color();

    let mut pipeline = config.to_pipeline_config();
    if let Some(drafter) = cli.drafter {
        pipeline.synthesis.drafter = drafter;
    }

    // === Dependency Injection ===
    let manager = Arc::new(build_session_manager(&cli, &config, &pipeline).await?);

    let session = cli
        .session
        .as_deref()
        .map(SessionId::new)
        .unwrap_or_else(SessionId::generate);

    if cli.reset {
        manager.reset(&session).await?;
    }

    // Chat mode
    if cli.chat {
        spawn_idle_eviction(manager.clone(), pipeline.session.idle_timeout);

        let repl_config = ReplConfig {
            show_progress: !cli.quiet && config.repl.show_progress,
            history_file: config.repl.history_file.as_ref().map(PathBuf::from),
        };
        let mut repl = ChatRepl::new(manager, session)
            .with_output(output)
            .with_repl_config(repl_config);
        repl.run().await?;
        return Ok(());
    }

    // Single question mode - question is required
    let question = match cli.question {
        Some(q) => q,
        None if cli.reset => {
            println!("Session {} reset.", session);
            return Ok(());
        }
        None => bail!("Question is required. Use --chat for interactive mode."),
    };

    let cancellation = CancellationToken::new();
    let watcher = {
        let token = cancellation.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        })
    };

    let progress: Box<dyn TurnProgress> = if cli.quiet {
        Box::new(NoProgress)
    } else {
        Box::new(ProgressReporter::new())
    };
    let result = manager
        .handle_turn(&session, &question, &cancellation, progress.as_ref())
        .await;
    drop(progress);
    watcher.abort();

    let reply = match result {
        Ok(reply) => reply,
        Err(e) if e.is_cancelled() => {
            eprintln!("{}", ConsoleFormatter::format_error(&e));
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let formatter = ConsoleFormatter::new().with_trace(output.show_trace);
    println!("{}", formatter.render(&reply, output.format));

    if cli.session.is_none() && !cli.quiet {
        eprintln!("(continue with --session {})", reply.session_id);
    }

    Ok(())
}

/// Install the console subscriber and, when configured, a daily log file.
fn init_logging(verbose: u8, config: &FileConfig) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file, guard) = match &config.logging.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "fincounsel.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();

    guard
}

async fn build_session_manager(
    cli: &Cli,
    config: &FileConfig,
    pipeline: &PipelineConfig,
) -> Result<SessionManager> {
    let embedder = build_embedder(&config.embedding)?;
    let store = build_vector_store(&config.vector_store, cli.corpus.clone(), embedder.as_ref()).await?;
    let engine = RetrievalEngine::new(embedder, store, pipeline.retrieval.clone())
        .context("Embedding and vector store do not match")?;

    let chain = Arc::new(KnowledgeChain::new(
        Arc::new(PatternGuardrail::new()),
        engine,
        build_synthesis(&config.llm, pipeline.synthesis),
    ));

    let use_case = HandleTurnUseCase::new(chain, Arc::new(FinancialCalculators::new()))
        .with_breaker_params(pipeline.breaker)
        .with_handler_timeout(pipeline.session.handler_timeout)
        .with_conversation_logger(build_conversation_logger(config));

    Ok(SessionManager::new(
        use_case,
        build_session_store(config),
        pipeline.session,
    ))
}

fn build_embedder(config: &FileEmbeddingConfig) -> Result<Arc<dyn EmbeddingService>> {
    match config.provider {
        EmbeddingProvider::Hashing => Ok(Arc::new(HashingEmbedder::new(config.dimension))),
        #[cfg(feature = "http")]
        EmbeddingProvider::Http => {
            let service = fincounsel_infrastructure::HttpEmbeddingService::new(
                &config.base_url,
                config.model.clone(),
                config.api_key(),
                config.dimension,
                Duration::from_secs(config.timeout_secs),
            )?;
            info!(endpoint = %service.endpoint(), "Using HTTP embedding service");
            Ok(Arc::new(service))
        }
        #[cfg(not(feature = "http"))]
        EmbeddingProvider::Http => bail!("embedding.provider = \"http\" requires the http feature"),
    }
}

async fn build_vector_store(
    config: &FileVectorStoreConfig,
    corpus_override: Option<PathBuf>,
    embedder: &dyn EmbeddingService,
) -> Result<Arc<dyn VectorStore>> {
    match config.provider {
        VectorStoreProvider::Memory => {
            let corpus = corpus_override.or_else(|| config.corpus_path.as_ref().map(PathBuf::from));
            match corpus {
                Some(path) => {
                    let store = InMemoryVectorStore::load_jsonl(&path, embedder)
                        .await
                        .with_context(|| format!("Failed to load corpus {}", path.display()))?;
                    if store.is_empty() {
                        warn!(path = %path.display(), "Corpus is empty; conceptual questions will fall back");
                    }
                    Ok(Arc::new(store))
                }
                None => {
                    warn!("No corpus configured; conceptual questions will fall back");
                    Ok(Arc::new(InMemoryVectorStore::new(embedder.dimension())))
                }
            }
        }
        #[cfg(feature = "http")]
        VectorStoreProvider::Elasticsearch => {
            let fields = fincounsel_infrastructure::IndexFields {
                vector: config.vector_field.clone(),
                text: config.text_field.clone(),
                document: config.document_field.clone(),
                section: config.section_field.clone(),
            };
            let store = fincounsel_infrastructure::ElasticsearchVectorStore::new(
                &config.url,
                &config.index,
                fields,
                config.api_key(),
                embedder.dimension(),
                Duration::from_secs(config.timeout_secs),
            )?;
            info!(url = %store.search_url(), "Using Elasticsearch vector store");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "http"))]
        VectorStoreProvider::Elasticsearch => {
            bail!("vector_store.provider = \"elasticsearch\" requires the http feature")
        }
    }
}

fn build_synthesis(llm: &FileLlmConfig, params: SynthesisParams) -> SynthesisStage {
    match params.drafter {
        DrafterKind::Extractive => SynthesisStage::extractive(params),
        DrafterKind::Llm => match llm_drafter(llm) {
            Some(drafter) => SynthesisStage::new(drafter, params),
            None => {
                warn!("LLM drafter unavailable, using the extractive drafter");
                SynthesisStage::extractive(params)
            }
        },
    }
}

#[cfg(feature = "http")]
fn llm_drafter(llm: &FileLlmConfig) -> Option<Arc<dyn fincounsel_application::AnswerDrafter>> {
    use fincounsel_application::LlmAnswerDrafter;
    use fincounsel_infrastructure::{AnthropicGateway, AnthropicSettings};

    let settings = AnthropicSettings {
        base_url: llm.base_url.clone(),
        model: llm.model.clone(),
        api_version: llm.api_version.clone(),
        max_tokens: llm.max_tokens,
        timeout: Duration::from_secs(llm.timeout_secs),
    };
    let gateway = AnthropicGateway::try_new(settings, llm.api_key())?;
    Some(Arc::new(LlmAnswerDrafter::new(Arc::new(gateway))))
}

#[cfg(not(feature = "http"))]
fn llm_drafter(_llm: &FileLlmConfig) -> Option<Arc<dyn fincounsel_application::AnswerDrafter>> {
    None
}

fn build_session_store(config: &FileConfig) -> Arc<dyn SessionStore> {
    let dir = config
        .session
        .store_dir
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| ConfigLoader::data_dir().map(|d| d.join("sessions")));
    match dir {
        Some(dir) => {
            info!(dir = %dir.display(), "Persisting sessions");
            Arc::new(JsonSessionStore::new(dir))
        }
        None => {
            warn!("No data directory; sessions will not survive a restart");
            Arc::new(NoSessionStore)
        }
    }
}

fn build_conversation_logger(config: &FileConfig) -> Arc<dyn ConversationLogger> {
    match config
        .logging
        .conversation_log
        .as_ref()
        .and_then(JsonlConversationLogger::new)
    {
        Some(logger) => Arc::new(logger),
        None => Arc::new(NoConversationLogger),
    }
}

/// Periodically drop idle sessions from memory; they resume from the store.
fn spawn_idle_eviction(manager: Arc<SessionManager>, idle_timeout: Duration) {
    let period = (idle_timeout / 2).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            manager.evict_idle().await;
        }
    });
}
