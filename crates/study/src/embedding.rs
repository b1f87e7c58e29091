use anyhow::{anyhow, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::env;

use slidemap_core::{Embedder, HashEmbedder, HashEmbedderConfig, SlideError};

pub const DEFAULT_OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_BATCH_SIZE: usize = 64;

/// `[embedding]` section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// `hash` (offline) or `openai`.
    pub provider: String,
    pub model: String,
    /// Vector size of the hash backend.
    pub dimensions: usize,
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "hash".to_string(),
            model: DEFAULT_OPENAI_EMBEDDING_MODEL.to_string(),
            dimensions: HashEmbedderConfig::default().dimensions,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Clone)]
pub enum EmbeddingBackend {
    Hash(HashEmbedder),
    OpenAi(OpenAiEmbedder),
}

/// Embedding backend chosen once per run from configuration.
#[derive(Clone)]
pub struct EmbeddingClient {
    backend: EmbeddingBackend,
}

impl EmbeddingClient {
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let backend = match config.provider.to_lowercase().as_str() {
            "hash" => EmbeddingBackend::Hash(HashEmbedder::new(HashEmbedderConfig {
                dimensions: config.dimensions.max(1),
                ..HashEmbedderConfig::default()
            })),
            "openai" => EmbeddingBackend::OpenAi(
                OpenAiEmbedder::new(&config.model)?.with_batch_size(config.batch_size),
            ),
            other => return Err(anyhow!(format!("unknown embedding provider {other}"))),
        };
        Ok(Self { backend })
    }

    pub fn hash() -> Self {
        Self {
            backend: EmbeddingBackend::Hash(HashEmbedder::default()),
        }
    }

    pub fn backend(&self) -> &EmbeddingBackend {
        &self.backend
    }
}

impl Embedder for EmbeddingClient {
    fn dimensions(&self) -> usize {
        match &self.backend {
            EmbeddingBackend::Hash(embedder) => embedder.dimensions(),
            EmbeddingBackend::OpenAi(client) => client.dimensions(),
        }
    }

    fn embed(&self, texts: &[String]) -> slidemap_core::Result<Vec<Vec<f32>>> {
        match &self.backend {
            EmbeddingBackend::Hash(embedder) => embedder.embed(texts),
            EmbeddingBackend::OpenAi(client) => client.embed(texts),
        }
    }
}

/// Remote backend for the OpenAI `/embeddings` endpoint.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    http: Client,
    model: String,
    api_key: String,
    base_url: String,
    batch_size: usize,
}

impl OpenAiEmbedder {
    pub fn new(model: &str) -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY is required for openai embeddings"))?;
        if api_key.trim().is_empty() {
            return Err(anyhow!("OPENAI_API_KEY is empty"));
        }
        Ok(Self {
            http: Client::new(),
            model: model.to_string(),
            api_key,
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));
        let payload = serde_json::json!({
            "model": self.model,
            "input": inputs,
        });
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "openai embeddings request failed: {}",
                response.status()
            ));
        }
        let parsed: OpenAiEmbeddingResponse = response.json()?;
        order_by_index(parsed.data, inputs.len())
    }
}

impl Embedder for OpenAiEmbedder {
    fn dimensions(&self) -> usize {
        match self.model.as_str() {
            "text-embedding-3-large" => 3072,
            _ => 1536,
        }
    }

    fn embed(&self, texts: &[String]) -> slidemap_core::Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let vectors = self
                .embed_batch(batch)
                .map_err(|err| SlideError::Embedding(format!("{err:#}")))?;
            out.extend(vectors);
        }
        Ok(out)
    }
}

/// Puts response items back into request order and checks that every
/// input got exactly one vector.
fn order_by_index(mut data: Vec<OpenAiEmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>> {
    data.sort_by_key(|item| item.index);
    if data.len() != expected || data.iter().enumerate().any(|(pos, item)| item.index != pos) {
        return Err(anyhow!(
            "embedding response does not cover inputs 0..{expected}"
        ));
    }
    Ok(data.into_iter().map(|item| item.embedding).collect())
}

#[derive(Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingData>,
}

#[derive(Deserialize)]
struct OpenAiEmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}
