// Embedding and generation providers

#[cfg(test)]
mod tests;

pub mod gemini;
pub mod ollama;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::chat::TextGenerator;
use crate::config::{Config, ProviderKind};
use crate::{HrError, Result};

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

/// Turns text into a fixed-length vector
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Exactly one provider call; failures map to [`HrError::EmbeddingProvider`]
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// The embedder and generator selected by the configuration
#[derive(Clone)]
pub struct Providers {
    pub embedder: Arc<dyn Embedder>,
    pub generator: Arc<dyn TextGenerator>,
}

/// Build the configured provider pair
#[inline]
pub fn build_providers(config: &Config) -> Result<Providers> {
    let timeout = Duration::from_secs(config.indexing.request_timeout_secs);
    let max_tokens = config.indexing.max_embedding_tokens;

    match config.provider {
        ProviderKind::Ollama => {
            let client = Arc::new(
                OllamaClient::new(&config.ollama, timeout, max_tokens)
                    .map_err(|e| HrError::Config(format!("{:#}", e)))?,
            );
            Ok(Providers {
                embedder: Arc::clone(&client) as Arc<dyn Embedder>,
                generator: client,
            })
        }
        ProviderKind::Gemini => {
            let client = Arc::new(GeminiClient::new(
                &config.gemini,
                config.indexing.embedding_dimension,
                timeout,
                max_tokens,
            )?);
            Ok(Providers {
                embedder: Arc::clone(&client) as Arc<dyn Embedder>,
                generator: client,
            })
        }
    }
}

/// Rough token estimate: about 0.75 words per token plus a little for punctuation
#[inline]
pub fn estimate_token_count(text: &str) -> usize {
    let word_count = text.split_whitespace().count();
    let punct_count = text.chars().filter(|c| c.is_ascii_punctuation()).count();

    (punct_count as f64).mul_add(0.1, word_count as f64 / 0.75) as usize
}

/// Cut `text` at a word boundary so its estimate stays within `max_tokens`
#[inline]
pub fn truncate_to_token_budget(text: &str, max_tokens: usize) -> String {
    if estimate_token_count(text) <= max_tokens {
        return text.to_string();
    }

    let mut truncated = String::new();
    let mut words = 0usize;
    let mut punct = 0usize;

    for piece in text.split_inclusive(char::is_whitespace) {
        let piece_words = usize::from(!piece.trim().is_empty());
        let piece_punct = piece.chars().filter(|c| c.is_ascii_punctuation()).count();

        let estimate = ((punct + piece_punct) as f64)
            .mul_add(0.1, (words + piece_words) as f64 / 0.75) as usize;
        if estimate > max_tokens {
            break;
        }

        words += piece_words;
        punct += piece_punct;
        truncated.push_str(piece);
    }

    truncated.trim_end().to_string()
}

/// Reject input that cannot be embedded
#[inline]
pub fn ensure_embeddable(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(HrError::EmbeddingProvider(
            "cannot embed empty text".to_string(),
        ));
    }
    Ok(())
}
