
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use super::{KnowledgeBase, MetadataRecord};

/// Tag identifying files written by [`save_state`]
pub const FORMAT_TAG: &str = "college-rag-store";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Store file not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported store format '{format}' version {version}")]
    UnsupportedFormat { format: String, version: u32 },

    #[error("Store holds {found}-dimensional vectors, embedder produces {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Corrupt store file: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk snapshot of a knowledge base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub format: String,
    pub version: u32,
    pub dimension: usize,
    /// Embedding model that produced `vectors`
    pub model: String,
    pub saved_at: DateTime<Utc>,
    pub chunks: Vec<String>,
    pub metadata: Vec<MetadataRecord>,
    pub vectors: Vec<Vec<f32>>,
}

impl PersistedState {
    #[inline]
    pub fn capture(knowledge: &KnowledgeBase, model: &str) -> Self {
        Self {
            format: FORMAT_TAG.to_string(),
            version: FORMAT_VERSION,
            dimension: knowledge.dimension(),
            model: model.to_string(),
            saved_at: Utc::now(),
            chunks: knowledge.documents().chunks().to_vec(),
            metadata: knowledge.documents().metadata().to_vec(),
            vectors: knowledge.index().rows().map(<[f32]>::to_vec).collect(),
        }
    }

    /// Check the header and shape against the embedder about to use these vectors
    #[inline]
    pub fn validate(&self, expected_dimension: usize) -> Result<(), PersistenceError> {
        if self.format != FORMAT_TAG || self.version != FORMAT_VERSION {
            return Err(PersistenceError::UnsupportedFormat {
                format: self.format.clone(),
                version: self.version,
            });
        }

        if self.dimension != expected_dimension {
            return Err(PersistenceError::DimensionMismatch {
                expected: expected_dimension,
                found: self.dimension,
            });
        }

        if self.chunks.len() != self.metadata.len() || self.chunks.len() != self.vectors.len() {
            return Err(PersistenceError::Corrupt(format!(
                "{} chunks, {} metadata records, {} vectors",
                self.chunks.len(),
                self.metadata.len(),
                self.vectors.len()
            )));
        }

        if let Some(position) = self
            .vectors
            .iter()
            .position(|vector| vector.len() != self.dimension)
        {
            return Err(PersistenceError::Corrupt(format!(
                "vector #{} has {} components, expected {}",
                position,
                self.vectors[position].len(),
                self.dimension
            )));
        }

        Ok(())
    }

    /// Validate and rebuild the in-memory knowledge base
    #[inline]
    pub fn into_knowledge_base(
        self,
        expected_dimension: usize,
    ) -> Result<KnowledgeBase, PersistenceError> {
        self.validate(expected_dimension)?;
        KnowledgeBase::from_parts(self.dimension, self.chunks, self.metadata, self.vectors)
            .map_err(|e| PersistenceError::Corrupt(e.to_string()))
    }
}

/// Write a snapshot to `path`, replacing any existing file
#[inline]
pub fn save_state(path: &Path, state: &PersistedState) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string(state)?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;

    info!(
        "Saved {} chunks to {}",
        state.chunks.len(),
        path.display()
    );
    Ok(())
}

/// Read a snapshot without validating it against an embedder
#[inline]
pub fn read_state(path: &Path) -> Result<PersistedState, PersistenceError> {
    if !path.exists() {
        return Err(PersistenceError::NotFound(path.to_path_buf()));
    }

    let json = fs::read_to_string(path)?;
    let state: PersistedState = serde_json::from_str(&json)?;
    debug!(
        "Read store {} (format {} v{}, {} chunks, model {})",
        path.display(),
        state.format,
        state.version,
        state.chunks.len(),
        state.model
    );
    Ok(state)
}
