use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::Path;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::embeddings::OllamaClient;
use crate::ingest::{self, IngestReport};
use crate::rag::{LoadOutcome, RagPipeline, Requester};
use crate::server::{self, AppState};
use crate::store::MetadataRecord;
use crate::store::persistence::{self, PersistenceError};

/// Build the pipeline and load the existing store.
///
/// A store that exists but cannot be read is an error, so ingestion never
/// overwrites it with a fresh one.
fn open_pipeline(config: &Config) -> Result<RagPipeline> {
    let mut pipeline =
        RagPipeline::from_config(config).context("Failed to initialize pipeline")?;
    let store_path = config.store_path();

    match pipeline
        .load(&store_path)
        .with_context(|| format!("Failed to load store {}", store_path.display()))?
    {
        LoadOutcome::Loaded { chunks } => info!("Knowledge base has {} chunks", chunks),
        LoadOutcome::Missing => info!("Starting a new knowledge base"),
    }

    Ok(pipeline)
}

fn save_pipeline(config: &Config, pipeline: &RagPipeline) -> Result<()> {
    let store_path = config.store_path();
    pipeline
        .save(&store_path)
        .with_context(|| format!("Failed to save store {}", store_path.display()))?;
    println!(
        "Saved {} chunks to {}",
        pipeline.len(),
        store_path.display()
    );
    Ok(())
}

fn print_report(kind: &str, report: &IngestReport) {
    println!(
        "Ingested {} of {} {} files ({} chunks added)",
        report.succeeded,
        report.total(),
        kind,
        report.chunks_added
    );
    for failure in &report.failed {
        println!("  ✗ {}: {}", failure.path.display(), failure.reason);
    }
}

/// Index every text file in a directory and save the store
#[inline]
pub fn add_text_dir(config: &Config, dir: &Path) -> Result<()> {
    let mut pipeline = open_pipeline(config)?;
    let report = ingest::ingest_text_dir(&mut pipeline, dir)
        .with_context(|| format!("Failed to ingest {}", dir.display()))?;

    print_report("text", &report);
    save_pipeline(config, &pipeline)
}

/// Index every PDF in a directory and save the store
#[inline]
pub fn add_pdf_dir(config: &Config, dir: &Path, doc_type: &str) -> Result<()> {
    let mut pipeline = open_pipeline(config)?;
    let report = ingest::ingest_pdf_dir(&mut pipeline, dir, doc_type)
        .with_context(|| format!("Failed to ingest {}", dir.display()))?;

    print_report("PDF", &report);
    save_pipeline(config, &pipeline)
}

/// Index a described image and save the store
#[inline]
pub fn add_image(
    config: &Config,
    image_path: &str,
    description: &str,
    category: Option<String>,
) -> Result<()> {
    let mut pipeline = open_pipeline(config)?;

    let metadata = MetadataRecord {
        category,
        ..MetadataRecord::default()
    };
    pipeline
        .add_image_info(image_path, description, metadata)
        .with_context(|| format!("Failed to add image {}", image_path))?;

    println!("Added image: {}", image_path);
    save_pipeline(config, &pipeline)
}

/// Answer one question from the command line
#[inline]
pub fn ask(
    config: &Config,
    question: &str,
    requester: Option<&Requester>,
    top_k: Option<usize>,
) -> Result<()> {
    let pipeline = open_pipeline(config)?;
    if pipeline.is_empty() {
        warn!("Knowledge base is empty; add documents first");
    }

    let result = pipeline.generate_answer(question, top_k, requester);

    println!("{}", result.answer);

    if !result.sources.is_empty() {
        println!();
        println!("Sources:");
        for source in &result.sources {
            match source.page {
                Some(page) => println!("  • {} (page {})", source.display_name(), page),
                None => println!("  • {}", source.display_name()),
            }
        }
    }

    if !result.images.is_empty() {
        println!();
        println!("Images:");
        for image in &result.images {
            println!("  • {} - {}", image.path, image.description);
        }
    }

    Ok(())
}

/// Show the state of the store and of both external services
#[inline]
pub fn show_status(config: &Config) -> Result<()> {
    let store_path = config.store_path();

    println!("Knowledge base: {}", store_path.display());
    match persistence::read_state(&store_path) {
        Ok(state) => {
            println!("  Chunks: {}", state.chunks.len());
            println!("  Embedding model: {} ({} dimensions)", state.model, state.dimension);
            println!("  Saved at: {}", state.saved_at.to_rfc3339());
        }
        Err(PersistenceError::NotFound(_)) => {
            println!("  Not created yet. Use 'college-rag add-text <dir>' to add documents.");
        }
        Err(e) => {
            println!("  ✗ Unreadable: {}", e);
        }
    }

    println!();
    println!(
        "Embedding server: {} (model {})",
        config.embedding.ollama_url()?,
        config.embedding.model
    );
    match OllamaClient::new(&config.embedding).and_then(|client| client.health_check()) {
        Ok(()) => println!("  ✓ Ready"),
        Err(e) => println!("  ✗ {:#}", e),
    }

    println!();
    println!("Completion model: {}", config.completion.model);
    if config.completion.has_api_key() {
        println!("  ✓ API key configured");
    } else {
        println!("  ✗ No API key; set it with 'college-rag config' or the GROQ_API_KEY variable");
    }

    Ok(())
}

/// Serve the HTTP API until interrupted
#[inline]
pub async fn serve_http(config: &Config, port: Option<u16>) -> Result<()> {
    let mut pipeline =
        RagPipeline::from_config(config).context("Failed to initialize pipeline")?;

    // A broken store should not keep the API down
    if let Err(e) = pipeline.load(&config.store_path()) {
        error!("Failed to load knowledge base, serving empty: {}", e);
    }
    if !pipeline.is_ready() {
        warn!(
            "Completion model unavailable: {}",
            pipeline.not_ready_reason().unwrap_or("unknown reason")
        );
    }

    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", config.server.host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.server.host, port))?;

    println!("Serving {} chunks on http://{}", pipeline.len(), addr);
    server::serve(addr, AppState::new(pipeline, config.server.max_sources))
        .await
        .context("HTTP server failed")?;

    Ok(())
}
