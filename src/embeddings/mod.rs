// Embeddings module
// Word-window chunking and the text-to-vector embedding seam

pub mod chunking;
pub mod ollama;

pub use chunking::{ChunkingConfig, ContentChunk, chunk_content, chunk_text};
pub use ollama::OllamaClient;

use anyhow::Result;

/// Dimension of all-MiniLM-L6-v2 sentence embeddings
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 384;

/// Maps text to a fixed-length vector.
///
/// Implementations must be deterministic for a fixed model and return vectors
/// of exactly [`Embedder::dimension`] components.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn dimension(&self) -> usize;

    /// Identifier of the underlying model, recorded alongside persisted vectors
    fn model_name(&self) -> &str;
}
