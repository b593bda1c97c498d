//! Follow-up query generation from the timeline built so far.

use anyhow::{Context, Result};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

use ai_client::Claude;
use chronicle_common::{ChronicleError, GraphEvent};

use crate::traits::CuriosityAgent;

const CURIOSITY_SYSTEM_PROMPT: &str = "You study a chronological list of events gathered \
about a topic and propose news search queries that would fill the gaps: periods with no \
coverage, unexplained jumps between events, named actors whose role is unclear. Propose \
2 to 3 specific queries. Each query must stand alone as a news search.";

/// Most recent events included in the prompt context.
const CONTEXT_EVENTS: usize = 20;
/// Cap on queries taken from one reflection.
const MAX_QUERIES: usize = 3;

#[derive(Debug, Deserialize, JsonSchema)]
struct FollowUpQueries {
    queries: Vec<String>,
}

pub struct GapFinder {
    client: Claude,
}

impl GapFinder {
    pub fn new(client: Claude) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CuriosityAgent for GapFinder {
    async fn follow_up_queries(&self, topic: &str, events: &[GraphEvent]) -> Result<Vec<String>> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let recent = &events[events.len().saturating_sub(CONTEXT_EVENTS)..];
        let context: String = recent
            .iter()
            .map(|e| format!("- {}: {}\n", e.date, e.title))
            .collect();
        let user = format!("Topic: {topic}\n\nEvents so far:\n{context}");

        let mut response: FollowUpQueries = self
            .client
            .extract(CURIOSITY_SYSTEM_PROMPT, user)
            .await
            .map_err(|e| ChronicleError::CollaboratorUnavailable(format!("curiosity: {e}")))
            .context("Follow-up query generation failed")?;

        response.queries.retain(|q| !q.trim().is_empty());
        response.queries.truncate(MAX_QUERIES);

        info!(count = response.queries.len(), "Generated follow-up queries");
        Ok(response.queries)
    }
}
