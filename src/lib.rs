use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] store::persistence::PersistenceError),

    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("Pipeline not ready: {0}")]
    NotReady(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod completion;
pub mod config;
pub mod embeddings;
pub mod ingest;
pub mod rag;
pub mod server;
pub mod store;
