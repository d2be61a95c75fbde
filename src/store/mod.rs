// Retrieval store module
// Flat vector index and the parallel chunk/metadata sequences it mirrors

#[cfg(test)]
mod tests;

pub mod metadata;
pub mod persistence;

pub use metadata::{IMAGE_TYPE, MetadataRecord, MetadataValue};
pub use persistence::{PersistedState, PersistenceError};

use std::cmp::Ordering;
use tracing::debug;

use crate::{RagError, Result};

/// Append-only collection of fixed-length vectors searched by brute force
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    dimension: usize,
    /// Row-major storage, `len() * dimension` values
    data: Vec<f32>,
}

/// Position and squared Euclidean distance of a stored vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f32,
}

impl VectorIndex {
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Rebuild an index from previously stored rows
    #[inline]
    pub fn from_rows(dimension: usize, rows: Vec<Vec<f32>>) -> Result<Self> {
        let mut index = Self::new(dimension);
        index.data.reserve(rows.len() * dimension);
        for row in rows {
            index.add(&row)?;
        }
        Ok(index)
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            return 0;
        }
        self.data.len() / self.dimension
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn add(&mut self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension || self.dimension == 0 {
            return Err(RagError::Store(format!(
                "Vector has {} dimensions, index expects {}",
                vector.len(),
                self.dimension
            )));
        }
        self.data.extend_from_slice(vector);
        Ok(())
    }

    #[inline]
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    #[inline]
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dimension.max(1))
    }

    /// Exact k-nearest-neighbour search, closest first.
    ///
    /// `top_k` is clamped to the number of stored vectors; equal distances keep
    /// insertion order.
    #[inline]
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(RagError::Store(format!(
                "Query has {} dimensions, index expects {}",
                query.len(),
                self.dimension
            )));
        }

        let mut neighbors: Vec<Neighbor> = self
            .rows()
            .enumerate()
            .map(|(index, row)| Neighbor {
                index,
                distance: squared_l2(query, row),
            })
            .collect();

        neighbors.sort_by(|a, b| match a.distance.total_cmp(&b.distance) {
            Ordering::Equal => a.index.cmp(&b.index),
            other => other,
        });
        neighbors.truncate(top_k.min(self.len()));

        Ok(neighbors)
    }
}

#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).fold(0.0, |acc, (x, y)| {
        let diff = x - y;
        diff.mul_add(diff, acc)
    })
}

/// Chunk texts and their metadata, position `i` in both describing one unit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentStore {
    chunks: Vec<String>,
    metadata: Vec<MetadataRecord>,
}

impl DocumentStore {
    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[inline]
    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    #[inline]
    pub fn metadata(&self) -> &[MetadataRecord] {
        &self.metadata
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<(&str, &MetadataRecord)> {
        Some((self.chunks.get(index)?.as_str(), self.metadata.get(index)?))
    }

    fn push(&mut self, chunk: String, metadata: MetadataRecord) {
        self.chunks.push(chunk);
        self.metadata.push(metadata);
    }
}

/// A retrieved chunk with its metadata, closest matches first
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub chunk: String,
    pub metadata: MetadataRecord,
    pub distance: f32,
}

/// The vector index and document store kept in lockstep.
///
/// Every mutation appends to both or to neither, so the embedding at position
/// `i` always belongs to the chunk and metadata at position `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeBase {
    index: VectorIndex,
    documents: DocumentStore,
}

impl KnowledgeBase {
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            index: VectorIndex::new(dimension),
            documents: DocumentStore::default(),
        }
    }

    /// Assemble a knowledge base from parallel sequences, checking they line up
    #[inline]
    pub fn from_parts(
        dimension: usize,
        chunks: Vec<String>,
        metadata: Vec<MetadataRecord>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self> {
        if chunks.len() != metadata.len() || chunks.len() != vectors.len() {
            return Err(RagError::Store(format!(
                "Mismatched store lengths: {} chunks, {} metadata records, {} vectors",
                chunks.len(),
                metadata.len(),
                vectors.len()
            )));
        }

        Ok(Self {
            index: VectorIndex::from_rows(dimension, vectors)?,
            documents: DocumentStore { chunks, metadata },
        })
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    #[inline]
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    #[inline]
    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    /// Append one embedded chunk, returning its position
    #[inline]
    pub fn insert(
        &mut self,
        chunk: String,
        metadata: MetadataRecord,
        embedding: &[f32],
    ) -> Result<usize> {
        self.index.add(embedding)?;
        self.documents.push(chunk, metadata);
        debug!("Stored chunk #{}", self.len() - 1);
        Ok(self.len() - 1)
    }

    #[inline]
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let hits = self
            .index
            .search(query, top_k)?
            .into_iter()
            .filter_map(|neighbor| {
                let (chunk, metadata) = self.documents.get(neighbor.index)?;
                Some(SearchHit {
                    chunk: chunk.to_string(),
                    metadata: metadata.clone(),
                    distance: neighbor.distance,
                })
            })
            .collect();

        Ok(hits)
    }
}
