use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::debug;

use chronicle_common::{dates, CandidateEvent, ChronicleError, GraphEvent, UNKNOWN_LOCATION};

use crate::store::EventStore;

/// Temporal knowledge-graph builder.
///
/// Owns the semantics on top of the storage seam: date normalization with
/// publish-date fallback, idempotent upserts keyed by (title, date), and
/// the full-rebuild BEFORE chain.
#[derive(Clone)]
pub struct TimelineGraph {
    store: Arc<dyn EventStore>,
}

impl TimelineGraph {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Upsert one candidate event. Returns Ok(false) when the candidate
    /// has no resolvable date (neither explicit nor inferred) — such
    /// candidates are dropped, never persisted.
    pub async fn add_event(&self, candidate: &CandidateEvent) -> Result<bool> {
        let date = match normalize_date(candidate) {
            Ok(date) => date,
            Err(err) => {
                debug!(
                    title = candidate.title.as_str(),
                    %err,
                    "Dropping candidate"
                );
                return Ok(false);
            }
        };

        let event = GraphEvent {
            title: candidate.title.clone(),
            date,
            description: candidate.description.clone(),
            url: candidate.source_url.clone(),
        };
        let location = candidate
            .location
            .clone()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

        self.store
            .upsert_event(&event, &location, &candidate.actors)
            .await
            .map_err(|e| ChronicleError::GraphWrite(e.to_string()))
            .context("Event upsert failed")?;

        Ok(true)
    }

    /// Recompute the whole BEFORE chain from the ascending scan. Safe to
    /// call repeatedly; N events always end up with exactly N-1 edges.
    pub async fn rebuild_temporal_order(&self) -> Result<usize> {
        self.store
            .rebuild_before_chain()
            .await
            .map_err(|e| ChronicleError::GraphWrite(e.to_string()))
            .context("Temporal order rebuild failed")
    }

    /// All events ascending by (date, title). The terminal artifact for
    /// narration.
    pub async fn sorted_events(&self) -> Result<Vec<GraphEvent>> {
        self.store.events_ascending().await
    }

    pub async fn before_edge_count(&self) -> Result<usize> {
        self.store.before_edge_count().await
    }

    /// Reset the graph at run start.
    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await
    }
}

/// Normalize the candidate's explicit date, falling back to the source's
/// publish date. An unparseable explicit date means the event lands on the
/// article's publish date, which may differ from when it happened. With
/// neither, the candidate is unplaceable on the timeline.
fn normalize_date(candidate: &CandidateEvent) -> Result<NaiveDate, ChronicleError> {
    candidate
        .explicit_date
        .as_deref()
        .and_then(dates::parse_flexible)
        .or(candidate.inferred_date)
        .ok_or_else(|| ChronicleError::DateNormalization(candidate.explicit_date.clone()))
}
