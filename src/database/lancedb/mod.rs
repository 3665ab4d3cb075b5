// LanceDB vector database module
// Holds one vector per embedded HR document and answers cosine similarity queries


pub mod vector_store;

use serde::{Deserialize, Serialize};

use crate::database::sqlite::models::DocumentType;

/// Embedding record stored in LanceDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Deterministic identifier, see [`EmbeddingRecord::vector_id`]
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: VectorMetadata,
}

/// Columns stored alongside each vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMetadata {
    pub document_type: DocumentType,
    pub document_id: String,
    pub organization_id: String,
    /// Rendered text that was embedded
    pub content: String,
    pub updated_at: String,
}

impl EmbeddingRecord {
    /// One vector per document: re-embedding a document reuses its id
    #[inline]
    pub fn vector_id(document_type: DocumentType, document_id: &str) -> String {
        format!("{}:{}", document_type.as_str(), document_id)
    }

    #[inline]
    pub fn new(
        document_type: DocumentType,
        document_id: &str,
        organization_id: &str,
        content: String,
        vector: Vec<f32>,
    ) -> Self {
        Self {
            id: Self::vector_id(document_type, document_id),
            vector,
            metadata: VectorMetadata {
                document_type,
                document_id: document_id.to_string(),
                organization_id: organization_id.to_string(),
                content,
                updated_at: chrono::Utc::now()
                    .naive_utc()
                    .format("%Y-%m-%d %H:%M:%S%.f")
                    .to_string(),
            },
        }
    }
}
