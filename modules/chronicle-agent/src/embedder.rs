use anyhow::Result;
use async_trait::async_trait;

use ai_client::OpenAi;

use crate::traits::TextEmbedder;

/// Embedding adapter over the OpenAI-compatible embeddings endpoint.
pub struct Embedder {
    client: OpenAi,
}

impl Embedder {
    pub fn new(api_key: &str, base_url: Option<&str>) -> Self {
        let mut client = OpenAi::new(api_key, "text-embedding-3-small");
        if let Some(url) = base_url {
            client = client.with_base_url(url);
        }
        Self { client }
    }
}

#[async_trait]
impl TextEmbedder for Embedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(text).await
    }
}
