//! LLM event extraction from article chunks.

use anyhow::{Context, Result};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::debug;

use ai_client::Claude;
use chronicle_common::{CandidateEvent, ChronicleError, Chunk};

use crate::traits::EventExtractor;

const EXTRACTION_SYSTEM_PROMPT: &str = r#"You extract discrete, datable real-world events from news text.

For each event found in the text, report:
- title: a short, stable name for the event (under 15 words). Use the same
  title for the same real-world event regardless of phrasing in the article.
- description: one or two sentences describing what happened.
- date: the date the event OCCURRED, as stated or clearly implied by the text.
  Prefer an ISO date (YYYY-MM-DD). If the text gives only a partial or relative
  date you cannot resolve, omit the date field entirely. Never guess.
- actors: the people and organizations that took part.
- location: the place the event happened, if stated.

Only report events that actually happened. Skip speculation, predictions,
opinions, and background commentary. An empty list is a valid answer."#;

/// Max bytes of chunk text sent per request. Chunks are normally far
/// smaller; this guards against pathological inputs.
const MAX_EXTRACT_BYTES: usize = 30_000;

#[derive(Debug, Deserialize, JsonSchema)]
struct ExtractedEvent {
    title: String,
    description: String,
    /// Date the event occurred, as written in the text.
    date: Option<String>,
    #[serde(default)]
    actors: Vec<String>,
    location: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ExtractionResponse {
    events: Vec<ExtractedEvent>,
}

/// Claude-backed extractor producing candidate events with provenance
/// attached from the chunk.
pub struct ClaudeExtractor {
    client: Claude,
}

impl ClaudeExtractor {
    pub fn new(client: Claude) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventExtractor for ClaudeExtractor {
    async fn extract(&self, chunk: &Chunk) -> Result<Vec<CandidateEvent>> {
        let text = truncate_at_char_boundary(&chunk.text, MAX_EXTRACT_BYTES);
        let user = format!(
            "Article: {title}\nSource: {url}\n\n{text}",
            title = chunk.title,
            url = chunk.source_url,
        );

        let response: ExtractionResponse = self
            .client
            .extract(EXTRACTION_SYSTEM_PROMPT, user)
            .await
            .map_err(|e| ChronicleError::ExtractionParse(e.to_string()))
            .context("Event extraction failed")?;

        let candidates: Vec<CandidateEvent> = response
            .events
            .into_iter()
            .filter(|e| !is_junk_title(&e.title))
            .map(|e| CandidateEvent {
                title: e.title.trim().to_string(),
                description: e.description,
                explicit_date: e.date,
                actors: e.actors,
                location: e.location,
                source_url: chunk.source_url.clone(),
                inferred_date: chunk.published_date,
            })
            .collect();

        debug!(
            chunk_id = %chunk.id,
            count = candidates.len(),
            "extracted candidate events"
        );
        Ok(candidates)
    }
}

fn is_junk_title(title: &str) -> bool {
    let t = title.trim();
    t.is_empty() || t.len() < 4 || t.eq_ignore_ascii_case("unknown")
}

fn truncate_at_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut idx = max_bytes;
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    &text[..idx]
}
