//! Embedding store: the SQLite ledger plus the LanceDB vectors it points at


use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::database::Database;
use crate::database::lancedb::EmbeddingRecord;
use crate::database::lancedb::vector_store::{SearchFilter, VectorStore};
use crate::database::sqlite::models::{DocumentType, EmbeddingEntry, NewEmbeddingEntry};
use crate::database::sqlite::queries::EmbeddingQueries;
use crate::{HrError, Result};

/// Coverage of one document type for one organization
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageStats {
    pub document_type: DocumentType,
    pub total_documents: u64,
    pub total_embeddings: u64,
    pub up_to_date: u64,
    pub needs_indexing: u64,
    /// Embeddings whose source record was deleted
    pub orphaned: u64,
    pub coverage_percent: f64,
    pub last_updated: Option<NaiveDateTime>,
}

impl CoverageStats {
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.needs_indexing == 0
    }
}

/// A stored document returned by similarity search
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedDocument {
    pub document_type: DocumentType,
    pub document_id: String,
    pub content: String,
    pub similarity: f32,
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

#[derive(Clone)]
pub struct EmbeddingStore {
    database: Database,
    vector_store: VectorStore,
}

impl EmbeddingStore {
    #[inline]
    pub fn new(database: Database, vector_store: VectorStore) -> Self {
        Self {
            database,
            vector_store,
        }
    }

    #[inline]
    pub fn database(&self) -> &Database {
        &self.database
    }

    #[inline]
    pub fn vector_store(&self) -> &VectorStore {
        &self.vector_store
    }

    /// Store or replace the embedding of one document
    ///
    /// The vector is written before the ledger row, so the ledger never
    /// points at a vector that was not stored.
    #[inline]
    pub async fn upsert(
        &self,
        document_type: DocumentType,
        document_id: &str,
        organization_id: &str,
        content: &str,
        vector: Vec<f32>,
    ) -> Result<EmbeddingEntry> {
        let dimension = vector.len();
        let record = EmbeddingRecord::new(
            document_type,
            document_id,
            organization_id,
            content.to_string(),
            vector,
        );
        let vector_id = record.id.clone();

        self.vector_store.upsert(&[record]).await?;

        let entry = EmbeddingQueries::upsert(
            self.database.pool(),
            NewEmbeddingEntry {
                document_type,
                document_id: document_id.to_string(),
                organization_id: organization_id.to_string(),
                vector_id,
                dimension: i64::try_from(dimension).unwrap_or(i64::MAX),
                content: content.to_string(),
            },
        )
        .await
        .map_err(HrError::store)?;

        debug!("Upserted embedding {}", entry.vector_id);
        Ok(entry)
    }

    #[inline]
    pub async fn count_by_type(
        &self,
        document_type: DocumentType,
        organization_id: &str,
    ) -> Result<u64> {
        EmbeddingQueries::count_by_type(self.database.pool(), document_type, organization_id)
            .await
            .map(to_u64)
            .map_err(HrError::store)
    }

    #[inline]
    pub async fn get(
        &self,
        document_type: DocumentType,
        document_id: &str,
    ) -> Result<Option<EmbeddingEntry>> {
        EmbeddingQueries::get(self.database.pool(), document_type, document_id)
            .await
            .map_err(HrError::store)
    }

    /// Up-to-date share of documents; an empty type counts as fully covered
    #[inline]
    pub async fn coverage(
        &self,
        document_type: DocumentType,
        organization_id: &str,
    ) -> Result<CoverageStats> {
        let counts = EmbeddingQueries::counts(self.database.pool(), document_type, organization_id)
            .await
            .map_err(HrError::store)?;

        let total_documents = to_u64(counts.total_documents);
        let up_to_date = to_u64(counts.up_to_date).min(total_documents);
        let coverage_percent = if total_documents == 0 {
            100.0
        } else {
            up_to_date as f64 * 100.0 / total_documents as f64
        };

        Ok(CoverageStats {
            document_type,
            total_documents,
            total_embeddings: to_u64(counts.total_embeddings),
            up_to_date,
            needs_indexing: total_documents - up_to_date,
            orphaned: to_u64(counts.orphaned),
            coverage_percent,
            last_updated: counts.last_updated,
        })
    }

    /// Most similar documents of one organization, best first
    #[inline]
    pub async fn search(
        &self,
        organization_id: &str,
        query_vector: &[f32],
        limit: usize,
        document_types: Option<&[DocumentType]>,
    ) -> Result<Vec<RetrievedDocument>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let filter = SearchFilter {
            organization_id,
            document_types,
        };
        let results = self
            .vector_store
            .search(query_vector, limit, &filter)
            .await?;

        Ok(results
            .into_iter()
            .map(|result| RetrievedDocument {
                document_type: result.metadata.document_type,
                document_id: result.metadata.document_id,
                content: result.metadata.content,
                similarity: result.similarity_score,
            })
            .collect())
    }

    /// Delete embeddings whose source document no longer exists
    #[inline]
    pub async fn purge_orphans(
        &self,
        document_type: DocumentType,
        organization_id: &str,
    ) -> Result<u64> {
        let orphans =
            EmbeddingQueries::list_orphaned(self.database.pool(), document_type, organization_id)
                .await
                .map_err(HrError::store)?;

        if orphans.is_empty() {
            return Ok(0);
        }

        let vector_ids: Vec<&str> = orphans.iter().map(|o| o.vector_id.as_str()).collect();
        self.vector_store.delete(&vector_ids).await?;

        let mut purged = 0;
        for orphan in &orphans {
            if EmbeddingQueries::delete(self.database.pool(), document_type, &orphan.document_id)
                .await
                .map_err(HrError::store)?
            {
                purged += 1;
            }
        }

        info!("Purged {} orphaned {} embeddings", purged, document_type);
        self.optimize().await;
        Ok(purged)
    }

    /// Compact both stores after bulk writes
    ///
    /// Failures are logged and swallowed; the data itself is already written.
    #[inline]
    pub async fn optimize(&self) {
        if let Err(e) = self.vector_store.optimize().await {
            warn!("Failed to optimize vector store: {}", e);
        }
        if let Err(e) = self.database.optimize().await {
            warn!("Failed to optimize database: {}", e);
        }
    }

    /// Drop every embedding of every organization
    ///
    /// The ledger is cleared before the vector table is recreated, so a
    /// failure in between leaves documents reported as needing indexing.
    /// Returns the number of ledger rows removed.
    #[inline]
    pub async fn reset(&self) -> Result<u64> {
        let cleared = EmbeddingQueries::delete_all(self.database.pool())
            .await
            .map_err(HrError::store)?;
        self.vector_store.reset().await?;

        info!("Reset embedding store, cleared {} entries", cleared);
        Ok(cleared)
    }
}
