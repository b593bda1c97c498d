//! Test mocks for the research loop.
//!
//! One mock per trait boundary, HashMap-backed with builder-style
//! registration. Unregistered inputs return `Err` unless noted, so
//! tests fail loudly on unexpected calls.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::NaiveDate;

use chronicle_common::{CandidateEvent, Chunk, GraphEvent, SourceDocument};

use crate::traits::{
    ArticleFetcher, ArticleRef, CuriosityAgent, EventExtractor, NewsSearcher, QueryRefiner,
    TextEmbedder,
};

/// Standard embedding dimension for test vectors.
pub const TEST_EMBEDDING_DIM: usize = 64;

// ---------------------------------------------------------------------------
// Builders for test data
// ---------------------------------------------------------------------------

pub fn article(url: &str) -> ArticleRef {
    ArticleRef {
        url: url.to_string(),
        published_at: None,
    }
}

pub fn source_doc(url: &str, text: &str, published: Option<NaiveDate>) -> SourceDocument {
    SourceDocument {
        url: url.to_string(),
        title: format!("Article at {url}"),
        publisher: "example.com".to_string(),
        published_date: published,
        raw_text: text.to_string(),
    }
}

pub fn candidate(title: &str, explicit_date: Option<&str>) -> CandidateEvent {
    CandidateEvent {
        title: title.to_string(),
        description: format!("{title} description"),
        explicit_date: explicit_date.map(str::to_string),
        actors: Vec::new(),
        location: None,
        source_url: "https://example.com".to_string(),
        inferred_date: None,
    }
}

// ---------------------------------------------------------------------------
// MockSearcher
// ---------------------------------------------------------------------------

/// Query → results map. Unregistered queries return an empty result set
/// (a search that simply found nothing).
pub struct MockSearcher {
    results: HashMap<String, Vec<ArticleRef>>,
    fail_all: bool,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self {
            results: HashMap::new(),
            fail_all: false,
        }
    }

    pub fn on_query(mut self, query: &str, results: Vec<ArticleRef>) -> Self {
        self.results.insert(query.to_string(), results);
        self
    }

    /// Make every search return an error.
    pub fn failing(mut self) -> Self {
        self.fail_all = true;
        self
    }
}

#[async_trait]
impl NewsSearcher for MockSearcher {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<ArticleRef>> {
        if self.fail_all {
            bail!("MockSearcher: forced failure for {query}");
        }
        let mut results = self.results.get(query).cloned().unwrap_or_default();
        results.truncate(max_results);
        Ok(results)
    }
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// URL → document map. Returns `Err` for unregistered URLs.
pub struct MockFetcher {
    docs: HashMap<String, SourceDocument>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            docs: HashMap::new(),
        }
    }

    pub fn on_url(mut self, url: &str, doc: SourceDocument) -> Self {
        self.docs.insert(url.to_string(), doc);
        self
    }
}

#[async_trait]
impl ArticleFetcher for MockFetcher {
    async fn fetch(&self, article: &ArticleRef) -> Result<SourceDocument> {
        self.docs
            .get(&article.url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockFetcher: no document registered for {}", article.url))
    }
}

// ---------------------------------------------------------------------------
// MockEmbedder
// ---------------------------------------------------------------------------

/// Deterministic embedder. Texts containing a registered marker get that
/// marker's exact vector; everything else gets a unique hash-based unit
/// vector (low similarity to all other texts).
pub struct MockEmbedder {
    markers: Vec<(String, Vec<f32>)>,
    failing_markers: Vec<String>,
    dimension: usize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            markers: Vec::new(),
            failing_markers: Vec::new(),
            dimension,
        }
    }

    /// Texts containing `marker` embed to exactly `vector`.
    pub fn on_contains(mut self, marker: &str, vector: Vec<f32>) -> Self {
        self.markers.push((marker.to_string(), vector));
        self
    }

    /// Texts containing `marker` fail to embed.
    pub fn failing_on(mut self, marker: &str) -> Self {
        self.failing_markers.push(marker.to_string());
        self
    }

    fn hash_vector(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish();

        let mut vec = vec![0.0f32; self.dimension];
        for v in vec.iter_mut() {
            // Simple LCG PRNG
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            *v = ((state >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0;
        }
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vec.iter_mut() {
                *v /= norm;
            }
        }
        vec
    }
}

#[async_trait]
impl TextEmbedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.failing_markers.iter().any(|m| text.contains(m)) {
            bail!("MockEmbedder: forced failure");
        }
        for (marker, vector) in &self.markers {
            if text.contains(marker) {
                return Ok(vector.clone());
            }
        }
        Ok(self.hash_vector(text))
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

/// Marker → candidate list, matched by substring against the chunk
/// text. Unmatched chunks extract nothing.
pub struct MockExtractor {
    by_marker: Vec<(String, Vec<CandidateEvent>)>,
    failing_markers: Vec<String>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self {
            by_marker: Vec::new(),
            failing_markers: Vec::new(),
        }
    }

    pub fn on_contains(mut self, marker: &str, candidates: Vec<CandidateEvent>) -> Self {
        self.by_marker.push((marker.to_string(), candidates));
        self
    }

    /// Chunks containing `marker` fail extraction.
    pub fn failing_on(mut self, marker: &str) -> Self {
        self.failing_markers.push(marker.to_string());
        self
    }
}

#[async_trait]
impl EventExtractor for MockExtractor {
    async fn extract(&self, chunk: &Chunk) -> Result<Vec<CandidateEvent>> {
        if self.failing_markers.iter().any(|m| chunk.text.contains(m)) {
            bail!("MockExtractor: forced failure for {}", chunk.id);
        }
        for (marker, candidates) in &self.by_marker {
            if chunk.text.contains(marker) {
                // Attach provenance the way a real extractor would
                return Ok(candidates
                    .iter()
                    .cloned()
                    .map(|mut c| {
                        c.source_url = chunk.source_url.clone();
                        c.inferred_date = chunk.published_date;
                        c
                    })
                    .collect());
            }
        }
        Ok(Vec::new())
    }
}

// ---------------------------------------------------------------------------
// MockRefiner
// ---------------------------------------------------------------------------

pub struct MockRefiner {
    response: Option<String>,
}

impl MockRefiner {
    /// Refiner that always returns `query`.
    pub fn returning(query: &str) -> Self {
        Self {
            response: Some(query.to_string()),
        }
    }

    /// Refiner that always fails.
    pub fn failing() -> Self {
        Self { response: None }
    }
}

#[async_trait]
impl QueryRefiner for MockRefiner {
    async fn refine(&self, topic: &str) -> Result<String> {
        match &self.response {
            Some(q) => Ok(q.clone()),
            None => bail!("MockRefiner: forced failure for {topic}"),
        }
    }
}

// ---------------------------------------------------------------------------
// MockCuriosity
// ---------------------------------------------------------------------------

/// Scripted follow-up queries, one batch per reflection call. Returns
/// an empty batch once the script runs out.
pub struct MockCuriosity {
    script: Mutex<VecDeque<Vec<String>>>,
    calls: Mutex<Vec<usize>>,
}

impl MockCuriosity {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn then(self, queries: &[&str]) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(queries.iter().map(|q| q.to_string()).collect());
        self
    }

    /// Number of events seen at each reflection call.
    pub fn seen_event_counts(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CuriosityAgent for MockCuriosity {
    async fn follow_up_queries(&self, _topic: &str, events: &[GraphEvent]) -> Result<Vec<String>> {
        self.calls.lock().unwrap().push(events.len());
        Ok(self.script.lock().unwrap().pop_front().unwrap_or_default())
    }
}
