use thiserror::Error;

pub type Result<T> = std::result::Result<T, HrError>;

#[derive(Error, Debug)]
pub enum HrError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Embedding provider error: {0}")]
    EmbeddingProvider(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl HrError {
    #[inline]
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Wraps a lower-level failure from SQLite or LanceDB.
    #[inline]
    pub fn store(error: impl std::fmt::Display) -> Self {
        Self::Store(format!("{:#}", error))
    }
}

pub mod assistant;
pub mod chat;
pub mod commands;
pub mod config;
pub mod database;
pub mod documents;
pub mod embeddings;
pub mod indexer;
pub mod seed;

pub use assistant::HrAssistant;
