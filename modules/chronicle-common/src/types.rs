use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An article fetched and readability-extracted from the web.
/// Immutable for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    pub url: String,
    pub title: String,
    pub publisher: String,
    pub published_date: Option<NaiveDate>,
    pub raw_text: String,
}

/// A bounded text window cut from a source document, carrying the
/// document's metadata. `id` is unique per (source_url, sequence).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub source_url: String,
    pub title: String,
    pub published_date: Option<NaiveDate>,
    pub publisher: String,
}

/// One event proposed by the extraction adapter for a single chunk.
///
/// `explicit_date` is whatever date string the text itself mentions;
/// `inferred_date` is the source article's publish date, used as a
/// fallback when the explicit date is missing or unparseable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateEvent {
    pub title: String,
    pub description: String,
    pub explicit_date: Option<String>,
    pub actors: Vec<String>,
    pub location: Option<String>,
    pub source_url: String,
    pub inferred_date: Option<NaiveDate>,
}

/// The persisted, deduplicated representation of one real-world event.
/// Keyed by (title, date) for idempotent merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEvent {
    pub title: String,
    pub date: NaiveDate,
    pub description: String,
    pub url: String,
}

impl GraphEvent {
    /// Merge key. Two candidates resolving to the same key collapse
    /// into one stored event.
    pub fn key(&self) -> (NaiveDate, String) {
        (self.date, self.title.clone())
    }
}

/// Default location node name when extraction found none.
pub const UNKNOWN_LOCATION: &str = "Unknown";

// --- Narrative output ---

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NarrativeEntry {
    /// ISO date the entry covers.
    pub date: String,
    pub summary: String,
}

/// The terminal artifact handed to the caller: a prose rendering of the
/// ordered event chain.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Narrative {
    pub background: String,
    pub timeline: Vec<NarrativeEntry>,
    pub conclusion: String,
}
