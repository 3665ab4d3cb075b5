
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::HrError;
use crate::chat::TextGenerator;
use crate::config::GeminiConfig;
use crate::embeddings::{Embedder, ensure_embeddable, truncate_to_token_budget};

/// Client for the Gemini REST API (`v1beta`)
#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: Url,
    api_key: String,
    embedding_model: String,
    generation_model: String,
    output_dimensionality: u32,
    max_input_tokens: usize,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    /// Absent on non-text parts such as function calls
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest {
    model: String,
    content: Content,
    output_dimensionality: u32,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GeminiClient {
    /// Fails with [`HrError::Config`] when the API key variable is unset
    #[inline]
    pub fn new(
        config: &GeminiConfig,
        output_dimensionality: u32,
        timeout: Duration,
        max_input_tokens: usize,
    ) -> crate::Result<Self> {
        let api_key = config.api_key().ok_or_else(|| {
            HrError::Config(format!(
                "Gemini API key not found in environment variable {}",
                config.api_key_env
            ))
        })?;
        Self::with_api_key(
            config,
            api_key,
            output_dimensionality,
            timeout,
            max_input_tokens,
        )
    }

    #[inline]
    pub fn with_api_key(
        config: &GeminiConfig,
        api_key: String,
        output_dimensionality: u32,
        timeout: Duration,
        max_input_tokens: usize,
    ) -> crate::Result<Self> {
        let base_url = config
            .base_url()
            .map_err(|e| HrError::Config(e.to_string()))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Ok(Self {
            base_url,
            api_key,
            embedding_model: config.embedding_model.clone(),
            generation_model: config.generation_model.clone(),
            output_dimensionality,
            max_input_tokens,
            agent,
        })
    }

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
            .header("x-goog-api-key", &self.api_key)
            .send(&request_json)
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        let text = response
            .body_mut()
            .read_to_string()
            .context("Failed to read response body")?;

        if !status.is_success() {
            let detail =
                serde_json::from_str::<ErrorEnvelope>(&text).map_or(text, |e| e.error.message);
            warn!("Gemini returned HTTP {}: {}", status.as_u16(), detail);
            anyhow::bail!("HTTP {} from {}: {}", status.as_u16(), url, detail);
        }

        Ok(text)
    }

    #[inline]
    pub fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let input = truncate_to_token_budget(text, self.max_input_tokens);
        debug!("Generating Gemini embedding (length: {})", input.len());

        let request = EmbedContentRequest {
            model: format!("models/{}", self.embedding_model),
            content: Content::text(None, &input),
            output_dimensionality: self.output_dimensionality,
        };

        let response_text = self
            .post_json(
                &format!("/v1beta/models/{}:embedContent", self.embedding_model),
                &request,
            )
            .context("Failed to generate embedding")?;

        let response: EmbedContentResponse =
            serde_json::from_str(&response_text).context("Failed to parse embedding response")?;

        if response.embedding.values.is_empty() {
            anyhow::bail!("Embedding response contained no vector");
        }
        Ok(response.embedding.values)
    }

    #[inline]
    pub fn generate_text(&self, prompt: &str, system_instruction: &str) -> Result<String> {
        debug!(
            "Generating answer with {} (prompt length: {})",
            self.generation_model,
            prompt.len()
        );

        let request = GenerateContentRequest {
            system_instruction: Content::text(None, system_instruction),
            contents: vec![Content::text(Some("user"), prompt)],
        };

        let response_text = self
            .post_json(
                &format!("/v1beta/models/{}:generateContent", self.generation_model),
                &request,
            )
            .context("Failed to generate answer")?;

        let response: GenerateContentResponse = serde_json::from_str(&response_text)
            .context("Failed to parse generation response")?;

        let answer: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if answer.trim().is_empty() {
            anyhow::bail!("Generation response contained no text");
        }
        Ok(answer.trim().to_string())
    }
}

#[async_trait]
impl Embedder for GeminiClient {
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
impl TextGenerator for GeminiClient {
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
