// Deterministic stand-ins for the embedding and completion services

use anyhow::{Result, bail};
use std::sync::{Arc, Mutex};

use crate::completion::{CompletionModel, CompletionRequest};
use crate::embeddings::Embedder;

/// Bag-of-words embedder: each lowercase word increments one hashed bucket
#[derive(Debug, Clone)]
pub(crate) struct HashingEmbedder {
    pub dimension: usize,
    pub model: String,
    /// Texts containing this marker fail to embed
    pub fail_on: Option<String>,
}

impl HashingEmbedder {
    pub(crate) fn new(dimension: usize) -> Self {
        Self {
            dimension,
            model: "hashing-test".to_string(),
            fail_on: None,
        }
    }
}

fn bucket(word: &str, dimension: usize) -> usize {
    // FNV-1a
    let hash = word.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
        (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    });
    (hash % dimension as u64) as usize
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self
            .fail_on
            .as_deref()
            .is_some_and(|marker| text.contains(marker))
        {
            bail!("embedding service unavailable");
        }

        let mut vector = vec![0.0; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            vector[bucket(&word.to_lowercase(), self.dimension)] += 1.0;
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Completion model that records every request and replies with a fixed answer
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingCompletion {
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
    pub reply: Option<String>,
}

impl RecordingCompletion {
    pub(crate) fn replying(reply: &str) -> Self {
        Self {
            requests: Arc::default(),
            reply: Some(reply.to_string()),
        }
    }

    /// A model whose every call fails
    pub(crate) fn failing() -> Self {
        Self::default()
    }

    pub(crate) fn calls(&self) -> Vec<CompletionRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

impl CompletionModel for RecordingCompletion {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().expect("lock").push(request.clone());
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => bail!("rate limit exceeded"),
        }
    }

    fn model_name(&self) -> &str {
        "recording-test"
    }
}
