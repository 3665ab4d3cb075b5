#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::HrError;
use crate::chat::TextGenerator;
use crate::config::OllamaConfig;
use crate::embeddings::{Embedder, ensure_embeddable, truncate_to_token_budget};

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: Url,
    embedding_model: String,
    generation_model: String,
    max_input_tokens: usize,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

impl OllamaClient {
    #[inline]
    pub fn new(config: &OllamaConfig, timeout: Duration, max_input_tokens: usize) -> Result<Self> {
        let base_url = config
            .ollama_url()
            .context("Failed to generate Ollama URL from config")?;

        Ok(Self {
            base_url,
            embedding_model: config.embedding_model.clone(),
            generation_model: config.generation_model.clone(),
            max_input_tokens,
            agent: build_agent(timeout),
        })
    }

    /// Single POST with a JSON body; non-2xx statuses become errors carrying Ollama's message
    fn post_json<T: Serialize>(&self, path: &str, body: &T) -> Result<String> {
        let url = self
            .base_url
            .join(path)
            .with_context(|| format!("Failed to build URL for {}", path))?;

        let request_json = serde_json::to_string(body).context("Failed to serialize request")?;

        let mut response = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(&request_json)
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        let text = response
            .body_mut()
            .read_to_string()
            .context("Failed to read response body")?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorResponse>(&text).map_or(text, |e| e.error);
            warn!("Ollama returned HTTP {}: {}", status.as_u16(), detail);
            anyhow::bail!("HTTP {} from {}: {}", status.as_u16(), url, detail);
        }

        Ok(text)
    }

    /// Generate an embedding for a single text input
    #[inline]
    pub fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let input = truncate_to_token_budget(text, self.max_input_tokens);
        debug!("Generating embedding for text (length: {})", input.len());

        let response_text = self
            .post_json(
                "/api/embed",
                &EmbedRequest {
                    model: &self.embedding_model,
                    input: &input,
                },
            )
            .context("Failed to generate embedding")?;

        let embed_response: EmbedResponse =
            serde_json::from_str(&response_text).context("Failed to parse embedding response")?;

        let embedding = embed_response
            .embeddings
            .into_iter()
            .next()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Embedding response contained no vector"))?;

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }

    /// Produce a non-streamed completion
    #[inline]
    pub fn generate_text(&self, prompt: &str, system_instruction: &str) -> Result<String> {
        debug!(
            "Generating answer with {} (prompt length: {})",
            self.generation_model,
            prompt.len()
        );

        let response_text = self
            .post_json(
                "/api/generate",
                &GenerateRequest {
                    model: &self.generation_model,
                    prompt,
                    system: system_instruction,
                    stream: false,
                },
            )
            .context("Failed to generate answer")?;

        let generate_response: GenerateResponse = serde_json::from_str(&response_text)
            .context("Failed to parse generation response")?;

        Ok(generate_response.response.trim().to_string())
    }
}

#[async_trait]
impl Embedder for OllamaClient {
    #[inline]
    async fn embed(&self, text: &str) -> crate::Result<Vec<f32>> {
        ensure_embeddable(text)?;

        let client = self.clone();
        let text = text.to_string();
        tokio::task::spawn_blocking(move || client.generate_embedding(&text))
            .await
            .map_err(|e| HrError::EmbeddingProvider(format!("Embedding task failed: {}", e)))?
            .map_err(|e| HrError::EmbeddingProvider(format!("{:#}", e)))
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    #[inline]
    async fn generate(&self, prompt: &str, system_instruction: &str) -> crate::Result<String> {
        let client = self.clone();
        let prompt = prompt.to_string();
        let system_instruction = system_instruction.to_string();
        tokio::task::spawn_blocking(move || client.generate_text(&prompt, &system_instruction))
            .await
            .map_err(|e| HrError::Generation(format!("Generation task failed: {}", e)))?
            .map_err(|e| HrError::Generation(format!("{:#}", e)))
    }
}
