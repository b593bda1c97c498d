//! Topic refinement: turn the user's raw topic into a sharper news query.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use ai_client::Claude;
use chronicle_common::ChronicleError;

use crate::traits::QueryRefiner;

const REFINE_SYSTEM_PROMPT: &str = "You rewrite research topics as concise news search \
queries. Reply with the query text only: no quotes, no explanation, no alternatives. \
Keep it under 10 words and preserve proper nouns exactly.";

pub struct TopicRefiner {
    client: Claude,
}

impl TopicRefiner {
    pub fn new(client: Claude) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QueryRefiner for TopicRefiner {
    async fn refine(&self, topic: &str) -> Result<String> {
        let raw = self
            .client
            .chat_completion(REFINE_SYSTEM_PROMPT, topic)
            .await
            .map_err(|e| ChronicleError::CollaboratorUnavailable(format!("refiner: {e}")))
            .context("Query refinement failed")?;

        let refined = raw.trim().trim_matches('"').trim().to_string();
        if refined.is_empty() {
            anyhow::bail!("Refiner returned an empty query for topic {topic:?}");
        }

        info!(topic, refined, "Refined search query");
        Ok(refined)
    }
}
