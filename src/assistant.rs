//! Caller-facing facade over one configured set of components

use std::sync::Arc;

use tracing::info;

use crate::chat::{AnswerComposer, ChatSession, ConversationTurn};
use crate::config::Config;
use crate::database::Database;
use crate::database::lancedb::vector_store::VectorStore;
use crate::database::sqlite::models::{DocumentFilter, DocumentType, Organization};
use crate::documents::DocumentSource;
use crate::embeddings::{Providers, build_providers};
use crate::indexer::{
    CoverageStats, EmbeddingStore, Indexer, ReindexProgress, ReindexSummary,
};
use crate::{HrError, Result};

pub struct HrAssistant {
    config: Config,
    database: Database,
    store: EmbeddingStore,
    pipeline: Option<Pipeline>,
}

/// The provider-backed half of the assistant
struct Pipeline {
    indexer: Indexer,
    composer: AnswerComposer,
}

async fn open_database(config: &Config) -> Result<Database> {
    Database::initialize_from_config_dir(config.get_base_dir())
        .await
        .map_err(HrError::store)
}

impl HrAssistant {
    /// Open the database, vector index and providers named by `config`
    #[inline]
    pub async fn open(config: Config) -> Result<Self> {
        let database = open_database(&config).await?;
        let vector_store = VectorStore::from_config(&config).await?;
        let providers = build_providers(&config)?;

        Ok(Self::with_components(
            config,
            database,
            vector_store,
            providers,
        ))
    }

    /// Open only the stores, for coverage reports and maintenance
    ///
    /// `reindex`, `chat` and `session` fail with `Config` on an assistant
    /// opened this way.
    #[inline]
    pub async fn open_storage(config: Config) -> Result<Self> {
        let database = open_database(&config).await?;
        let vector_store = VectorStore::from_config(&config).await?;
        let store = EmbeddingStore::new(database.clone(), vector_store);

        Ok(Self {
            config,
            database,
            store,
            pipeline: None,
        })
    }

    /// Drop every stored embedding and recreate the vector table with the
    /// configured dimension
    ///
    /// Unlike the other constructors this succeeds when the existing table
    /// was built with a different dimension. Returns the assistant and the
    /// number of ledger entries removed.
    #[inline]
    pub async fn open_and_reset(config: Config) -> Result<(Self, u64)> {
        let database = open_database(&config).await?;
        let vector_store = VectorStore::open_and_reset(
            &config.vector_database_path(),
            config.indexing.embedding_dimension as usize,
        )
        .await?;
        let store = EmbeddingStore::new(database.clone(), vector_store);
        let cleared = store.reset().await?;

        Ok((
            Self {
                config,
                database,
                store,
                pipeline: None,
            },
            cleared,
        ))
    }

    /// Assemble from already opened parts; tests plug in fake providers here
    #[inline]
    pub fn with_components(
        config: Config,
        database: Database,
        vector_store: VectorStore,
        providers: Providers,
    ) -> Self {
        let store = EmbeddingStore::new(database.clone(), vector_store);
        let source = DocumentSource::new(&database, config.indexing.page_size);
        let indexer = Indexer::new(
            source,
            store.clone(),
            Arc::clone(&providers.embedder),
            config.indexing.max_embedding_tokens,
        );
        let composer = AnswerComposer::new(
            store.clone(),
            providers.embedder,
            providers.generator,
            config.chat.clone(),
        );

        Self {
            config,
            database,
            store,
            pipeline: Some(Pipeline { indexer, composer }),
        }
    }

    fn pipeline(&self) -> Result<&Pipeline> {
        self.pipeline.as_ref().ok_or_else(|| {
            HrError::Config("assistant was opened without embedding providers".to_string())
        })
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn database(&self) -> &Database {
        &self.database
    }

    #[inline]
    pub fn store(&self) -> &EmbeddingStore {
        &self.store
    }

    /// Look up an organization by slug or id
    #[inline]
    pub async fn resolve_organization(&self, slug_or_id: &str) -> Result<Organization> {
        self.database
            .find_organization(slug_or_id)
            .await
            .map_err(HrError::store)?
            .ok_or_else(|| HrError::not_found("Organization", slug_or_id))
    }

    #[inline]
    pub async fn organizations(&self) -> Result<Vec<Organization>> {
        self.database
            .list_organizations()
            .await
            .map_err(HrError::store)
    }

    /// Reindex documents of one organization, reporting after every document
    #[inline]
    pub async fn reindex<F>(
        &self,
        organization: &str,
        document_type: Option<DocumentType>,
        filter: &DocumentFilter,
        on_progress: F,
    ) -> Result<ReindexSummary>
    where
        F: FnMut(ReindexProgress) + Send,
    {
        let pipeline = self.pipeline()?;
        let organization = self.resolve_organization(organization).await?;
        info!("Reindexing organization {}", organization.slug);

        pipeline
            .indexer
            .reindex(document_type, &organization.id, filter, on_progress)
            .await
    }

    /// Coverage per document type
    #[inline]
    pub async fn embedding_stats(
        &self,
        organization: &str,
        document_type: Option<DocumentType>,
    ) -> Result<Vec<CoverageStats>> {
        let organization = self.resolve_organization(organization).await?;

        let mut stats = Vec::new();
        for document_type in DocumentType::selection(document_type) {
            stats.push(
                self.store
                    .coverage(document_type, &organization.id)
                    .await?,
            );
        }
        Ok(stats)
    }

    /// Answer one question given the caller's history
    #[inline]
    pub async fn chat(
        &self,
        organization: &str,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<String> {
        let pipeline = self.pipeline()?;
        let organization = self.resolve_organization(organization).await?;
        pipeline
            .composer
            .answer(question, &organization.id, history)
            .await
    }

    /// Start a session that keeps its own history
    #[inline]
    pub async fn session(&self, organization: &str) -> Result<ChatSession<'_>> {
        let pipeline = self.pipeline()?;
        let organization = self.resolve_organization(organization).await?;
        Ok(pipeline.composer.session(&organization.id))
    }

    /// Remove embeddings whose source records were deleted
    #[inline]
    pub async fn purge_orphans(
        &self,
        organization: &str,
        document_type: Option<DocumentType>,
    ) -> Result<u64> {
        let organization = self.resolve_organization(organization).await?;

        let mut purged = 0;
        for document_type in DocumentType::selection(document_type) {
            purged += self
                .store
                .purge_orphans(document_type, &organization.id)
                .await?;
        }
        Ok(purged)
    }
}
