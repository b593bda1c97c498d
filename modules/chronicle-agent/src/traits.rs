//! Trait boundaries for the research loop.
//!
//! Each collaborator the controller talks to sits behind one of these
//! traits so tests can swap in mocks without network or API keys.

use anyhow::Result;
use async_trait::async_trait;

use chronicle_common::{CandidateEvent, Chunk, GraphEvent, Narrative, SourceDocument};

/// A search hit before the article body has been fetched.
#[derive(Debug, Clone)]
pub struct ArticleRef {
    pub url: String,
    /// Publish timestamp as reported by the search API, unparsed.
    pub published_at: Option<String>,
}

/// News search API. Returns article references for a query, most
/// relevant first.
#[async_trait]
pub trait NewsSearcher: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<ArticleRef>>;
}

/// Fetches an article URL and reduces it to readable text.
#[async_trait]
pub trait ArticleFetcher: Send + Sync {
    async fn fetch(&self, article: &ArticleRef) -> Result<SourceDocument>;
}

/// Turns one chunk of article text into zero or more candidate events.
#[async_trait]
pub trait EventExtractor: Send + Sync {
    async fn extract(&self, chunk: &Chunk) -> Result<Vec<CandidateEvent>>;
}

/// Rewrites the user's raw topic into a sharper search query.
#[async_trait]
pub trait QueryRefiner: Send + Sync {
    async fn refine(&self, topic: &str) -> Result<String>;
}

/// Looks at the events gathered so far and proposes follow-up queries
/// to fill gaps in the timeline.
#[async_trait]
pub trait CuriosityAgent: Send + Sync {
    async fn follow_up_queries(&self, topic: &str, events: &[GraphEvent]) -> Result<Vec<String>>;
}

/// Renders the final ordered event chain as prose.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, topic: &str, events: &[GraphEvent]) -> Result<Narrative>;
}

/// Text embedding provider.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
