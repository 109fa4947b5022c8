//! Ollama-backed embedding and generation providers
//!
//! One shared HTTP client serves both capabilities. Embedding requests are
//! retried with backoff; generation requests are not (a retried stochastic
//! call would be a different answer, so the caller asks for a fresh
//! candidate instead).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{EmbeddingConfig, LlmConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::generation::GenerationProvider;
use super::retry::RetryPolicy;

/// Ollama API client implementing both embedding and generation
pub struct OllamaClient {
    client: Client,
    base_url: String,
    embed_model: String,
    generate_model: String,
    dimensions: usize,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    prompt: String,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaClient {
    /// Create a new client from the LLM and embedding configuration
    pub fn new(llm: &LlmConfig, embeddings: &EmbeddingConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(llm.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: llm.base_url.clone(),
            embed_model: llm.embed_model.clone(),
            generate_model: llm.generate_model.clone(),
            dimensions: embeddings.dimensions,
            retry: RetryPolicy::new(llm.max_retries),
        }
    }

    /// Check if Ollama is reachable
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbedRequest {
            model: self.embed_model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::embedding(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::embedding(format!("HTTP {}", response.status())));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("unparseable response: {}", e)))?;

        if embed_response.embedding.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "model '{}' returned {} dimensions, expected {}",
                self.embed_model,
                embed_response.embedding.len(),
                self.dimensions
            )));
        }

        Ok(embed_response.embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // Ollama has no native batch endpoint; items are sent sequentially
        // and the first failure fails the batch with its index attached.
        let mut embeddings = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            let vector = self
                .retry
                .run("embedding", || self.embed_one(text))
                .await
                .map_err(|e| match e {
                    Error::Embedding { message, .. } => Error::embedding_at(i, message),
                    other => other,
                })?;
            embeddings.push(vector);
        }
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.embed_model
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[async_trait]
impl GenerationProvider for OllamaClient {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: self.generate_model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: GenerateOptions { temperature },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::generation(temperature, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::generation(
                temperature,
                format!("HTTP {} - {}", status, body),
            ));
        }

        let generate_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::generation(temperature, format!("unparseable response: {}", e)))?;

        Ok(generate_response.response)
    }

    fn model(&self) -> &str {
        &self.generate_model
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
