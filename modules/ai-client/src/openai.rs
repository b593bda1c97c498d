use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible embeddings client.
///
/// Works against any provider exposing the `/embeddings` endpoint (OpenAI,
/// Voyage, local inference servers) via `with_base_url`.
#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    embedding_model: String,
    base_url: String,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, embedding_model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            embedding_model: embedding_model.into(),
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    pub fn from_env(embedding_model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key, embedding_model))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Embed a single text.
    pub async fn embed(&self, text: impl Into<String>) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(vec![text.into()]).await?;
        vectors
            .pop()
            .ok_or_else(|| anyhow!("Embeddings response was empty"))
    }

    /// Embed multiple texts in one API call. Output order matches input order.
    pub async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        let count = texts.len();
        debug!(model = %self.embedding_model, count, "Embeddings request");

        let request = EmbeddingsRequest {
            model: self.embedding_model.clone(),
            input: texts,
        };

        let response = reqwest::Client::new()
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("Embeddings API error ({status}): {error_text}"));
        }

        let mut body: EmbeddingsResponse = response.json().await?;
        body.data.sort_by_key(|d| d.index);

        if body.data.len() != count {
            return Err(anyhow!(
                "Embeddings response count mismatch: expected {count}, got {}",
                body.data.len()
            ));
        }

        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}

// --- Wire types ---

#[derive(Debug, Serialize)]
struct EmbeddingsRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}
