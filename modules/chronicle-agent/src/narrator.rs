//! Narrative rendering of the finished timeline.

use anyhow::{Context, Result};
use async_trait::async_trait;

use ai_client::Claude;
use chronicle_common::{GraphEvent, Narrative};

use crate::traits::Narrator;

const NARRATE_SYSTEM_PROMPT: &str = "You write a factual chronological narrative from an \
ordered list of events. Produce a short background paragraph, one timeline entry per \
date (merging same-date events), and a brief conclusion. Stick to the events given; \
do not invent details.";

pub struct NarrativeCompiler {
    client: Claude,
}

impl NarrativeCompiler {
    pub fn new(client: Claude) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Narrator for NarrativeCompiler {
    async fn narrate(&self, topic: &str, events: &[GraphEvent]) -> Result<Narrative> {
        let listing: String = events
            .iter()
            .map(|e| format!("- {}: {} — {}\n", e.date, e.title, e.description))
            .collect();
        let user = format!("Topic: {topic}\n\nEvents in chronological order:\n{listing}");

        self.client
            .extract(NARRATE_SYSTEM_PROMPT, user)
            .await
            .context("Narrative request failed")
    }
}
