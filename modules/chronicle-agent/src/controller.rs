//! The research loop: refine, retrieve, extract, graph, reflect.
//!
//! Each iteration pulls a batch of articles for the pending queries,
//! admits their chunks through the dedup gate, extracts events from the
//! admitted chunks, upserts them into the timeline graph, and asks the
//! curiosity agent for follow-up queries. The loop stops on its
//! iteration cap, an empty query queue, a batch that produced no new
//! events, a cancellation signal, or a systemic graph failure.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};
use uuid::Uuid;

use chronicle_common::{GraphEvent, RunConfig, SourceDocument};
use chronicle_graph::TimelineGraph;

use crate::chunker::chunk_document;
use crate::dedup::ChunkStore;
use crate::traits::{ArticleFetcher, CuriosityAgent, EventExtractor, NewsSearcher, QueryRefiner};

/// Concurrent article fetches per batch.
const FETCH_CONCURRENCY: usize = 5;

/// Counters for one run.
#[derive(Debug, Clone)]
pub struct RunStats {
    pub run_id: Uuid,
    pub iterations: u32,
    pub queries_issued: usize,
    pub articles_fetched: usize,
    pub fetch_failures: usize,
    pub chunks_admitted: usize,
    pub chunks_deduped: usize,
    pub candidates_extracted: usize,
    pub events_persisted: usize,
    pub candidates_dropped_dateless: usize,
}

impl RunStats {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            iterations: 0,
            queries_issued: 0,
            articles_fetched: 0,
            fetch_failures: 0,
            chunks_admitted: 0,
            chunks_deduped: 0,
            candidates_extracted: 0,
            events_persisted: 0,
            candidates_dropped_dateless: 0,
        }
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run {}: {} iterations, {} queries, {} articles ({} failed), \
             {} chunks admitted ({} deduped), {} candidates, {} events persisted ({} dateless)",
            self.run_id,
            self.iterations,
            self.queries_issued,
            self.articles_fetched,
            self.fetch_failures,
            self.chunks_admitted,
            self.chunks_deduped,
            self.candidates_extracted,
            self.events_persisted,
            self.candidates_dropped_dateless,
        )
    }
}

/// What a finished run hands back: the ordered timeline plus counters.
pub struct RunReport {
    pub events: Vec<GraphEvent>,
    pub stats: RunStats,
}

pub struct Controller {
    graph: TimelineGraph,
    store: ChunkStore,
    searcher: Arc<dyn NewsSearcher>,
    fetcher: Arc<dyn ArticleFetcher>,
    extractor: Arc<dyn EventExtractor>,
    refiner: Arc<dyn QueryRefiner>,
    curiosity: Arc<dyn CuriosityAgent>,
    config: RunConfig,
    stop: Arc<AtomicBool>,
}

impl Controller {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        graph: TimelineGraph,
        store: ChunkStore,
        searcher: Arc<dyn NewsSearcher>,
        fetcher: Arc<dyn ArticleFetcher>,
        extractor: Arc<dyn EventExtractor>,
        refiner: Arc<dyn QueryRefiner>,
        curiosity: Arc<dyn CuriosityAgent>,
        config: RunConfig,
    ) -> Self {
        Self {
            graph,
            store,
            searcher,
            fetcher,
            extractor,
            refiner,
            curiosity,
            config,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for cooperative cancellation. Setting it stops the run at
    /// the next iteration boundary; work already committed stays.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub async fn run(&self) -> Result<RunReport> {
        let mut stats = RunStats::new();
        info!(run_id = %stats.run_id, topic = %self.config.topic, "Starting run");

        // Each run builds its graph from scratch
        self.graph.clear().await?;
        self.store.clear().await;

        let initial_query = match self.refiner.refine(&self.config.topic).await {
            Ok(q) => q,
            Err(e) => {
                warn!(error = %e, "Refiner unavailable, searching the raw topic");
                self.config.topic.clone()
            }
        };

        let mut queue: Vec<String> = vec![initial_query];
        let mut visited: HashSet<String> = HashSet::new();

        for iteration in 1..=self.config.max_iterations {
            if self.stop.load(Ordering::Relaxed) {
                info!(iteration, "Cancellation requested, stopping");
                break;
            }
            if queue.is_empty() {
                info!(iteration, "No queries left, stopping");
                break;
            }

            stats.iterations = iteration;
            info!(iteration, queries = queue.len(), "Iteration start");

            let docs = self
                .retrieve_batch(&queue, &mut visited, &mut stats)
                .await;
            queue.clear();

            let progress = match self.extract_and_graph(&docs, &mut stats).await {
                Ok(persisted) => persisted > 0,
                Err(e) => {
                    error!(error = %e, "Graph writes failing, stopping with partial timeline");
                    break;
                }
            };

            if !progress {
                info!(iteration, "No new events this iteration, stopping");
                break;
            }

            // Reflection is pointless on the final iteration
            if iteration < self.config.max_iterations {
                let events = self.graph.sorted_events().await?;
                match self
                    .curiosity
                    .follow_up_queries(&self.config.topic, &events)
                    .await
                {
                    Ok(queries) => queue = queries,
                    Err(e) => {
                        warn!(error = %e, "Curiosity agent unavailable, stopping early");
                    }
                }
            }
        }

        let events = self.graph.sorted_events().await?;
        info!(%stats, events = events.len(), "Run complete");
        Ok(RunReport { events, stats })
    }

    /// Search every pending query, fetch unseen articles concurrently.
    /// Search and fetch failures are logged and skipped.
    async fn retrieve_batch(
        &self,
        queries: &[String],
        visited: &mut HashSet<String>,
        stats: &mut RunStats,
    ) -> Vec<SourceDocument> {
        let mut refs = Vec::new();
        for query in queries {
            stats.queries_issued += 1;
            match self
                .searcher
                .search(query, self.config.max_articles_per_iteration)
                .await
            {
                Ok(results) => {
                    for article in results {
                        if visited.insert(article.url.clone()) {
                            refs.push(article);
                        }
                    }
                }
                Err(e) => warn!(query, error = %e, "Search failed, skipping query"),
            }
        }

        let fetches = stream::iter(refs.iter())
            .map(|article| {
                let fetcher = self.fetcher.clone();
                async move { (article.url.clone(), fetcher.fetch(article).await) }
            })
            .buffer_unordered(FETCH_CONCURRENCY)
            .collect::<Vec<_>>()
            .await;

        let mut docs = Vec::new();
        for (url, result) in fetches {
            match result {
                Ok(doc) if doc.raw_text.trim().is_empty() => {
                    warn!(url, "Article body empty after extraction, skipping");
                    stats.fetch_failures += 1;
                }
                Ok(doc) => {
                    stats.articles_fetched += 1;
                    docs.push(doc);
                }
                Err(e) => {
                    warn!(url, error = %e, "Fetch failed, skipping article");
                    stats.fetch_failures += 1;
                }
            }
        }
        docs
    }

    /// Chunk the batch, run admitted chunks through extraction, and
    /// upsert the candidates. Item failures are contained; a graph
    /// write failure aborts the batch as systemic. Returns the number
    /// of events newly persisted.
    async fn extract_and_graph(
        &self,
        docs: &[SourceDocument],
        stats: &mut RunStats,
    ) -> Result<usize> {
        let mut admitted = Vec::new();
        for doc in docs {
            for chunk in chunk_document(doc) {
                match self.store.put(chunk.clone()).await {
                    Ok(outcome) if outcome.inserted => {
                        stats.chunks_admitted += 1;
                        admitted.push(chunk);
                    }
                    Ok(_) => stats.chunks_deduped += 1,
                    Err(e) => {
                        warn!(chunk_id = %chunk.id, error = %e, "Embedding failed, skipping chunk")
                    }
                }
            }
        }

        let mut persisted = 0usize;
        for chunk in &admitted {
            let candidates = match self.extractor.extract(chunk).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(chunk_id = %chunk.id, error = %e, "Extraction failed, skipping chunk");
                    continue;
                }
            };
            stats.candidates_extracted += candidates.len();

            for candidate in &candidates {
                match self.graph.add_event(candidate).await {
                    Ok(true) => {
                        persisted += 1;
                        stats.events_persisted += 1;
                    }
                    Ok(false) => stats.candidates_dropped_dateless += 1,
                    Err(e) => return Err(e),
                }
            }
        }

        if persisted > 0 {
            self.graph.rebuild_temporal_order().await?;
        }
        Ok(persisted)
    }
}
