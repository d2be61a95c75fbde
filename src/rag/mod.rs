// RAG pipeline module
// Ingestion, retrieval and grounded answer generation over one knowledge base

#[cfg(test)]
pub(crate) mod testing;

pub mod prompt;

pub use prompt::Requester;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::completion::{ChatMessage, CompletionModel, CompletionRequest, GroqClient};
use crate::config::Config;
use crate::embeddings::{ChunkingConfig, Embedder, OllamaClient, chunk_content};
use crate::ingest;
use crate::store::persistence::{self, PersistedState, PersistenceError};
use crate::store::{IMAGE_TYPE, KnowledgeBase, MetadataRecord, SearchHit};
use crate::{RagError, Result};

/// Answer returned when retrieval finds nothing to ground a reply on
pub const NO_CONTEXT_ANSWER: &str = "I don't have enough information to answer this question. Please add more data to the knowledge base.";

/// Knobs the pipeline reads on every call
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub chunking: ChunkingConfig,
    pub top_k: usize,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for PipelineSettings {
    #[inline]
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            top_k: 3,
            temperature: 0.3,
            max_tokens: 500,
        }
    }
}

impl PipelineSettings {
    #[inline]
    pub fn from_config(config: &Config) -> Self {
        Self {
            chunking: config.chunking.clone(),
            top_k: config.retrieval.top_k,
            temperature: config.completion.temperature,
            max_tokens: config.completion.max_tokens,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub path: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub sources: Vec<MetadataRecord>,
    pub images: Vec<ImageRef>,
}

impl AnswerResult {
    fn text_only(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            sources: Vec::new(),
            images: Vec::new(),
        }
    }
}

/// What [`RagPipeline::load`] found on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { chunks: usize },
    /// No store file yet; the in-memory knowledge base was left as it was
    Missing,
}

/// The retrieval-augmented answering pipeline.
///
/// Owns its knowledge base exclusively. All calls are synchronous and
/// blocking; callers sharing one pipeline across threads must provide their
/// own locking (the HTTP server wraps it in an `RwLock`).
pub struct RagPipeline {
    embedder: Box<dyn Embedder>,
    completion: Option<Box<dyn CompletionModel>>,
    not_ready_reason: Option<String>,
    knowledge: KnowledgeBase,
    settings: PipelineSettings,
}

impl std::fmt::Debug for RagPipeline {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("embedder", &self.embedder.model_name())
            .field(
                "completion",
                &self.completion.as_ref().map(|c| c.model_name()),
            )
            .field("chunks", &self.knowledge.len())
            .field("settings", &self.settings)
            .finish()
    }
}

impl RagPipeline {
    /// Build a pipeline from its collaborators. Without a completion model the
    /// pipeline can still ingest and search but is not ready to answer.
    #[inline]
    pub fn new(
        embedder: Box<dyn Embedder>,
        completion: Option<Box<dyn CompletionModel>>,
        settings: PipelineSettings,
    ) -> Self {
        let not_ready_reason = completion
            .is_none()
            .then(|| "no completion model configured".to_string());
        let knowledge = KnowledgeBase::new(embedder.dimension());

        Self {
            embedder,
            completion,
            not_ready_reason,
            knowledge,
            settings,
        }
    }

    /// Build the Ollama embedder and Groq completion client from configuration.
    ///
    /// A completion client that cannot be created leaves the pipeline not
    /// ready rather than failing; an unusable embedder is an error.
    #[inline]
    pub fn from_config(config: &Config) -> Result<Self> {
        let embedder = OllamaClient::new(&config.embedding)
            .map_err(|e| RagError::Embedding(format!("{:#}", e)))?;

        let (completion, reason) = match GroqClient::new(&config.completion) {
            Ok(client) => (Some(Box::new(client) as Box<dyn CompletionModel>), None),
            Err(e) => {
                error!("Completion client failed to initialize: {:#}", e);
                (None, Some(format!("{:#}", e)))
            }
        };

        let mut pipeline = Self::new(
            Box::new(embedder),
            completion,
            PipelineSettings::from_config(config),
        );
        if reason.is_some() {
            pipeline.not_ready_reason = reason;
        }
        Ok(pipeline)
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.completion.is_some()
    }

    #[inline]
    pub fn not_ready_reason(&self) -> Option<&str> {
        self.not_ready_reason.as_deref()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.knowledge.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.knowledge.is_empty()
    }

    #[inline]
    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    #[inline]
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Embed and store one chunk.
    ///
    /// Returns `Ok(false)` without embedding when the chunk is too short to be
    /// worth indexing.
    #[inline]
    pub fn add_chunk(&mut self, chunk: &str, metadata: MetadataRecord) -> Result<bool> {
        if !self.settings.chunking.is_indexable(chunk) {
            debug!("Skipping short chunk ({} chars)", chunk.trim().chars().count());
            return Ok(false);
        }

        let embedding = self.embed(chunk)?;
        self.knowledge
            .insert(chunk.to_string(), metadata, &embedding)?;
        Ok(true)
    }

    /// Chunk `text` and index every chunk with a copy of `metadata` carrying
    /// its chunk position. Returns the number of chunks stored.
    #[inline]
    pub fn add_text(&mut self, text: &str, metadata: &MetadataRecord) -> usize {
        let added = self.index_document(text, metadata);
        info!(
            "Added text '{}': {} chunks (total {})",
            metadata.display_name(),
            added,
            self.len()
        );
        added
    }

    /// Index a PDF page by page with `{source, type, page, chunk}` metadata.
    ///
    /// Pages without text are skipped. Fails only if the file cannot be read
    /// or parsed.
    #[inline]
    pub fn add_pdf(&mut self, path: &Path, doc_type: &str) -> Result<usize> {
        let pages = ingest::extract_pdf_pages(path)?;
        let source = path.file_name().map_or_else(
            || path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        );

        let mut added = 0;
        for (page_number, text) in (1_u32..).zip(pages.iter()) {
            if text.trim().is_empty() {
                debug!("Skipping empty page {} of {}", page_number, source);
                continue;
            }

            let metadata = MetadataRecord::default()
                .with_source(source.as_str())
                .with_type(doc_type)
                .with_page(page_number);
            added += self.index_document(text, &metadata);
        }

        info!(
            "Added PDF {}: {} pages, {} chunks (total {})",
            source,
            pages.len(),
            added,
            self.len()
        );
        Ok(added)
    }

    /// Index a description of an image so it can be retrieved by what it shows.
    ///
    /// The embedding covers the file name and description; the stored chunk is
    /// the description alone. No minimum-length filter applies.
    #[inline]
    pub fn add_image_info(
        &mut self,
        image_path: &str,
        description: &str,
        metadata: MetadataRecord,
    ) -> Result<()> {
        let file_name = Path::new(image_path)
            .file_name()
            .map_or_else(|| image_path.to_string(), |n| n.to_string_lossy().into_owned());
        let full_text = format!("Image: {}\nDescription: {}", file_name, description);

        let embedding = self.embed(&full_text)?;
        let metadata = MetadataRecord {
            doc_type: Some(IMAGE_TYPE.to_string()),
            image_path: Some(image_path.to_string()),
            description: Some(description.to_string()),
            ..metadata
        };
        self.knowledge
            .insert(description.to_string(), metadata, &embedding)?;

        info!("Added image metadata: {}", file_name);
        Ok(())
    }

    /// Nearest stored chunks to `query`, closest first
    #[inline]
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        if self.knowledge.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embed(query)?;
        self.knowledge.search(&query_embedding, top_k)
    }

    /// Retrieve context for `query` and ask the completion model to answer it.
    ///
    /// Never fails: problems are reported in the answer text. Sources from a
    /// successful retrieval are returned even when the completion call fails.
    #[inline]
    pub fn generate_answer(
        &self,
        query: &str,
        top_k: Option<usize>,
        requester: Option<&Requester>,
    ) -> AnswerResult {
        let Some(completion) = self.completion.as_ref() else {
            return AnswerResult::text_only(format!(
                "Error: completion client failed to initialize ({}). Please check the API key.",
                self.not_ready_reason
                    .as_deref()
                    .unwrap_or("no completion model configured")
            ));
        };

        let top_k = top_k.unwrap_or(self.settings.top_k);
        let hits = match self.search(query, top_k) {
            Ok(hits) => hits,
            Err(e) => {
                error!("Retrieval failed for '{}': {}", query, e);
                return AnswerResult::text_only(format!("Error retrieving context: {}", e));
            }
        };

        if hits.is_empty() {
            return AnswerResult::text_only(NO_CONTEXT_ANSWER);
        }

        let context = prompt::build_context(&hits);
        let images = hits
            .iter()
            .filter(|hit| hit.metadata.is_image())
            .map(|hit| ImageRef {
                path: hit.metadata.image_path.clone().unwrap_or_default(),
                description: hit.metadata.description.clone().unwrap_or_default(),
            })
            .collect();
        let sources = hits.into_iter().map(|hit| hit.metadata).collect();

        let request = CompletionRequest {
            messages: vec![
                ChatMessage::system(prompt::system_prompt(requester)),
                ChatMessage::user(prompt::user_prompt(&context, query, requester)),
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let answer = completion.complete(&request).unwrap_or_else(|e| {
            error!("Completion failed: {:#}", e);
            format!("Error generating response: {:#}", e)
        });

        AnswerResult {
            answer,
            sources,
            images,
        }
    }

    /// Write the knowledge base to `path`, replacing any existing file
    #[inline]
    pub fn save(&self, path: &Path) -> Result<()> {
        let state = PersistedState::capture(&self.knowledge, self.embedder.model_name());
        persistence::save_state(path, &state)?;
        Ok(())
    }

    /// Replace the knowledge base with the one stored at `path`.
    ///
    /// A missing file is not an error. Any other failure leaves the current
    /// knowledge base untouched.
    #[inline]
    pub fn load(&mut self, path: &Path) -> Result<LoadOutcome> {
        let state = match persistence::read_state(path) {
            Ok(state) => state,
            Err(PersistenceError::NotFound(_)) => {
                warn!("No store found at {}, starting empty", path.display());
                return Ok(LoadOutcome::Missing);
            }
            Err(e) => return Err(e.into()),
        };

        if state.model != self.embedder.model_name() {
            warn!(
                "Store {} was built with embedding model '{}', current model is '{}'",
                path.display(),
                state.model,
                self.embedder.model_name()
            );
        }

        self.knowledge = state.into_knowledge_base(self.embedder.dimension())?;
        info!(
            "Loaded {} chunks from {}",
            self.knowledge.len(),
            path.display()
        );
        Ok(LoadOutcome::Loaded {
            chunks: self.knowledge.len(),
        })
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embedder
            .embed(text)
            .map_err(|e| RagError::Embedding(format!("{:#}", e)))
    }

    fn index_document(&mut self, text: &str, metadata: &MetadataRecord) -> usize {
        let mut added = 0;
        for chunk in chunk_content(text, &self.settings.chunking) {
            let chunk_metadata = MetadataRecord {
                chunk_index: Some(chunk.chunk_index),
                ..metadata.clone()
            };

            match self.add_chunk(&chunk.content, chunk_metadata) {
                Ok(true) => added += 1,
                Ok(false) => {}
                Err(e) => warn!(
                    "Skipping chunk {} of '{}': {}",
                    chunk.chunk_index,
                    metadata.display_name(),
                    e
                ),
            }
        }
        added
    }
}
