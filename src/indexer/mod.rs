// Indexer module
// Batch reindexing of HR documents into the embedding store

pub mod store;


use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::Result;
use crate::database::sqlite::models::{DocumentFilter, DocumentType};
use crate::documents::{Document, DocumentSource};
use crate::embeddings::{Embedder, truncate_to_token_budget};

pub use store::{CoverageStats, EmbeddingStore, RetrievedDocument};

/// Reported after every processed document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReindexProgress {
    pub document_type: DocumentType,
    /// 1-based position within the current document type
    pub current: u64,
    pub total: u64,
    pub document_id: String,
    pub succeeded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReindexFailure {
    pub document_type: DocumentType,
    pub document_id: String,
    pub reason: String,
}

/// Outcome of one reindex run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReindexSummary {
    pub success: u64,
    pub failed: u64,
    pub failures: Vec<ReindexFailure>,
}

impl ReindexSummary {
    #[inline]
    pub fn processed(&self) -> u64 {
        self.success + self.failed
    }
}

/// Renders, embeds and stores documents one at a time
pub struct Indexer {
    source: DocumentSource,
    store: EmbeddingStore,
    embedder: Arc<dyn Embedder>,
    max_embedding_tokens: usize,
}

impl Indexer {
    #[inline]
    pub fn new(
        source: DocumentSource,
        store: EmbeddingStore,
        embedder: Arc<dyn Embedder>,
        max_embedding_tokens: usize,
    ) -> Self {
        Self {
            source,
            store,
            embedder,
            max_embedding_tokens,
        }
    }

    /// Reindex one document type, or all of them when `document_type` is `None`
    ///
    /// A document that fails to render, embed or store is recorded in the
    /// summary and the run moves on. Only a failure to read the HR store
    /// aborts.
    #[inline]
    pub async fn reindex<F>(
        &self,
        document_type: Option<DocumentType>,
        organization_id: &str,
        filter: &DocumentFilter,
        mut on_progress: F,
    ) -> Result<ReindexSummary>
    where
        F: FnMut(ReindexProgress) + Send,
    {
        let mut summary = ReindexSummary::default();
        for document_type in DocumentType::selection(document_type) {
            self.reindex_type(
                document_type,
                organization_id,
                filter,
                &mut summary,
                &mut on_progress,
            )
            .await?;
        }

        if summary.success > 0 {
            self.store.optimize().await;
        }

        info!(
            "Reindex finished for organization {}: {} succeeded, {} failed",
            organization_id, summary.success, summary.failed
        );
        Ok(summary)
    }

    async fn reindex_type<F>(
        &self,
        document_type: DocumentType,
        organization_id: &str,
        filter: &DocumentFilter,
        summary: &mut ReindexSummary,
        on_progress: &mut F,
    ) -> Result<()>
    where
        F: FnMut(ReindexProgress) + Send,
    {
        let total = self
            .source
            .count_documents(document_type, organization_id, filter)
            .await?;
        info!("Reindexing {} {} documents", total, document_type);

        let mut documents =
            self.source
                .list_documents(document_type, organization_id, filter.clone());
        let mut current = 0u64;

        while let Some(document) = documents.next().await {
            let document = document?;
            current += 1;

            let succeeded = match self.index_document(&document).await {
                Ok(()) => {
                    summary.success += 1;
                    true
                }
                Err(e) => {
                    warn!(
                        "Failed to index {} {}: {}",
                        document_type,
                        document.id(),
                        e
                    );
                    summary.failed += 1;
                    summary.failures.push(ReindexFailure {
                        document_type,
                        document_id: document.id().to_string(),
                        reason: e.to_string(),
                    });
                    false
                }
            };

            on_progress(ReindexProgress {
                document_type,
                current,
                total: total.max(current),
                document_id: document.id().to_string(),
                succeeded,
            });
        }

        Ok(())
    }

    async fn index_document(&self, document: &Document) -> Result<()> {
        let rendered = self.source.render_for_embedding(document).await?;
        let content = truncate_to_token_budget(&rendered, self.max_embedding_tokens);
        let vector = self.embedder.embed(&content).await?;

        self.store
            .upsert(
                document.document_type(),
                document.id(),
                document.organization_id(),
                &content,
                vector,
            )
            .await?;

        debug!("Indexed {} {}", document.document_type(), document.id());
        Ok(())
    }
}
