// Chat module
// Grounded answers over organization statistics and retrieved HR records

pub mod prompt;


use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Days, Utc};
use tracing::{debug, info, warn};

use crate::config::ChatConfig;
use crate::database::Database;
use crate::embeddings::Embedder;
use crate::indexer::EmbeddingStore;
use crate::{HrError, Result};

pub use prompt::{ChatContext, NOT_AVAILABLE};

/// Produces text from a prompt and a system instruction
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Exactly one provider call; failures map to [`HrError::Generation`]
    async fn generate(&self, prompt: &str, system_instruction: &str) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
}

/// Builds the context for a question and asks the generator once
pub struct AnswerComposer {
    database: Database,
    store: EmbeddingStore,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn TextGenerator>,
    settings: ChatConfig,
}

impl AnswerComposer {
    #[inline]
    pub fn new(
        store: EmbeddingStore,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
        settings: ChatConfig,
    ) -> Self {
        Self {
            database: store.database().clone(),
            store,
            embedder,
            generator,
            settings,
        }
    }

    #[inline]
    pub fn settings(&self) -> &ChatConfig {
        &self.settings
    }

    /// Start a conversation scoped to one organization
    #[inline]
    pub fn session(&self, organization_id: &str) -> ChatSession<'_> {
        ChatSession {
            composer: self,
            organization_id: organization_id.to_string(),
            history: Vec::new(),
        }
    }

    /// Statistics plus the records most similar to `question`
    ///
    /// Statistics are left out for an organization without employees. When
    /// the question cannot be embedded, retrieval is skipped.
    #[inline]
    pub async fn build_context(&self, question: &str, organization_id: &str) -> Result<ChatContext> {
        let window = self.settings.attendance_window_days;
        let today = Utc::now().date_naive();
        let since = today
            .checked_sub_days(Days::new(u64::from(window)))
            .unwrap_or(today);

        let statistics = self
            .database
            .organization_statistics(organization_id, since, window)
            .await
            .map_err(HrError::store)?
            .ok_or_else(|| HrError::not_found("Organization", organization_id))?;
        let statistics = (statistics.total_employees > 0).then_some(statistics);

        let documents = match self.embedder.embed(question).await {
            Ok(query_vector) => {
                let found = self
                    .store
                    .search(organization_id, &query_vector, self.settings.top_k, None)
                    .await?;
                prompt::select_documents(
                    found,
                    self.settings.min_similarity,
                    self.settings.max_context_chars,
                )
            }
            Err(e) => {
                warn!("Skipping retrieval, question could not be embedded: {}", e);
                Vec::new()
            }
        };

        debug!(
            "Context for organization {}: statistics={}, {} records",
            organization_id,
            statistics.is_some(),
            documents.len()
        );
        Ok(ChatContext {
            statistics,
            documents,
        })
    }

    /// Answer `question` for one organization given the prior turns
    #[inline]
    pub async fn answer(
        &self,
        question: &str,
        organization_id: &str,
        history: &[ConversationTurn],
    ) -> Result<String> {
        if question.trim().is_empty() {
            return Err(HrError::InvalidInput("question must not be empty".to_string()));
        }

        let context = self.build_context(question, organization_id).await?;
        let system = prompt::system_instruction(context.statistics.is_some());
        let body = prompt::build_prompt(
            question,
            history,
            &context,
            self.settings.max_history_turns,
        );

        info!(
            "Generating answer for organization {} ({} history turns)",
            organization_id,
            history.len()
        );
        self.generator.generate(&body, &system).await
    }
}

/// History of one conversation
///
/// `ask` takes `&mut self`, so a session answers one question at a time.
pub struct ChatSession<'a> {
    composer: &'a AnswerComposer,
    organization_id: String,
    history: Vec<ConversationTurn>,
}

impl ChatSession<'_> {
    #[inline]
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    #[inline]
    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    #[inline]
    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Answer and record the turn; a failed answer leaves the history as it was
    #[inline]
    pub async fn ask(&mut self, question: &str) -> Result<String> {
        let answer = self
            .composer
            .answer(question, &self.organization_id, &self.history)
            .await?;

        self.history.push(ConversationTurn {
            question: question.trim().to_string(),
            answer: answer.clone(),
        });

        let max_turns = self.composer.settings.max_history_turns;
        if self.history.len() > max_turns {
            let excess = self.history.len() - max_turns;
            self.history.drain(..excess);
        }

        Ok(answer)
    }
}
