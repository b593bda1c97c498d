//! End-to-end loop tests over the in-memory store and mocks:
//! dedup gating, termination rules, containment of item failures,
//! and stats accounting.

use std::sync::Arc;

use chrono::NaiveDate;

use chronicle_agent::controller::Controller;
use chronicle_agent::dedup::ChunkStore;
use chronicle_agent::testing::{
    article, candidate, source_doc, MockCuriosity, MockEmbedder, MockExtractor, MockFetcher,
    MockRefiner, MockSearcher, TEST_EMBEDDING_DIM,
};
use chronicle_agent::traits::{
    ArticleFetcher, CuriosityAgent, EventExtractor, NewsSearcher, QueryRefiner, TextEmbedder,
};
use chronicle_common::RunConfig;
use chronicle_graph::{MemoryEventStore, TimelineGraph};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn run_config(max_iterations: u32) -> RunConfig {
    RunConfig {
        topic: "the harbor bridge collapse".to_string(),
        max_iterations,
        max_articles_per_iteration: 3,
        dedup_distance_threshold: 0.1,
    }
}

struct Harness {
    graph: TimelineGraph,
    store: Arc<MemoryEventStore>,
    embedder: MockEmbedder,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryEventStore::new());
        Self {
            graph: TimelineGraph::new(store.clone()),
            store,
            embedder: MockEmbedder::new(TEST_EMBEDDING_DIM),
        }
    }

    fn controller(
        self,
        searcher: impl NewsSearcher + 'static,
        fetcher: impl ArticleFetcher + 'static,
        extractor: impl EventExtractor + 'static,
        refiner: impl QueryRefiner + 'static,
        curiosity: impl CuriosityAgent + 'static,
        config: RunConfig,
    ) -> Controller {
        let embedder: Arc<dyn TextEmbedder> = Arc::new(self.embedder);
        Controller::new(
            self.graph,
            ChunkStore::new(embedder, config.dedup_distance_threshold),
            Arc::new(searcher),
            Arc::new(fetcher),
            Arc::new(extractor),
            Arc::new(refiner),
            Arc::new(curiosity),
            config,
        )
    }
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

/// A ~2.2kB article body that chunks into exactly three windows, with a
/// distinct marker in each window's non-overlapping region.
fn long_article_text() -> String {
    let mut text = String::new();
    text.push_str("first-marker ");
    text.push_str(&"x".repeat(850 - text.len())); // bytes 0..850, chunk 0 only
    text.push_str(&"y".repeat(150)); // 850..1000, chunk 0/1 overlap
    text.push_str("second-marker ");
    text.push_str(&"z".repeat(1700 - text.len())); // ..1700, chunk 1 only
    text.push_str(&"w".repeat(150)); // 1700..1850, chunk 1/2 overlap
    text.push_str("third-marker ");
    text.push_str(&"v".repeat(300)); // chunk 2 only
    text
}

#[tokio::test]
async fn end_to_end_run_builds_two_event_timeline() {
    // Three articles. The long one yields three chunks; the other two are
    // near-duplicate coverage of its first and second chunks.
    let mut harness = Harness::new();
    harness.embedder = harness
        .embedder
        .on_contains("first-marker", vec![1.0, 0.0, 0.0, 0.0])
        .on_contains("dup-of-first", vec![0.999, 0.02, 0.0, 0.0])
        .on_contains("second-marker", vec![0.0, 1.0, 0.0, 0.0])
        .on_contains("dup-of-second", vec![0.02, 0.999, 0.0, 0.0])
        .on_contains("third-marker", vec![0.0, 0.0, 1.0, 0.0]);

    let searcher = MockSearcher::new().on_query(
        "harbor bridge collapse",
        vec![
            article("https://a.example.com/1"),
            article("https://b.example.com/2"),
            article("https://c.example.com/3"),
        ],
    );
    let fetcher = MockFetcher::new()
        .on_url(
            "https://a.example.com/1",
            source_doc("https://a.example.com/1", &long_article_text(), None),
        )
        .on_url(
            "https://b.example.com/2",
            source_doc("https://b.example.com/2", "dup-of-first wire copy", None),
        )
        .on_url(
            "https://c.example.com/3",
            source_doc("https://c.example.com/3", "dup-of-second wire copy", None),
        );
    // Either member of a near-duplicate pair may win the admission race;
    // both phrasings extract the same event.
    let extractor = MockExtractor::new()
        .on_contains("first-marker", vec![candidate("Summit opens", Some("2024-03-01"))])
        .on_contains("dup-of-first", vec![candidate("Summit opens", Some("2024-03-01"))])
        .on_contains("second-marker", vec![candidate("Summit closes", Some("2024-03-03"))])
        .on_contains("dup-of-second", vec![candidate("Summit closes", Some("2024-03-03"))])
        .on_contains("third-marker", vec![candidate("Ministers mingle", None)]); // dateless

    let store = harness.store.clone();
    let controller = harness.controller(
        searcher,
        fetcher,
        extractor,
        MockRefiner::returning("harbor bridge collapse"),
        MockCuriosity::new(),
        run_config(1),
    );

    let report = controller.run().await.unwrap();

    assert_eq!(report.events.len(), 2);
    assert_eq!(report.events[0].title, "Summit opens");
    assert_eq!(report.events[0].date, date(2024, 3, 1));
    assert_eq!(report.events[1].title, "Summit closes");
    assert_eq!(report.events[1].date, date(2024, 3, 3));

    let edges = store.before_edges();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].0 .0, date(2024, 3, 1));
    assert_eq!(edges[0].1 .0, date(2024, 3, 3));

    assert_eq!(report.stats.iterations, 1);
    assert_eq!(report.stats.articles_fetched, 3);
    assert_eq!(report.stats.chunks_admitted, 3);
    assert_eq!(report.stats.chunks_deduped, 2);
    assert_eq!(report.stats.candidates_extracted, 3);
    assert_eq!(report.stats.events_persisted, 2);
    assert_eq!(report.stats.candidates_dropped_dateless, 1);
}

#[tokio::test]
async fn two_events_get_a_single_before_edge() {
    let harness = Harness::new();
    let store = harness.store.clone();

    let searcher = MockSearcher::new().on_query(
        "q",
        vec![article("https://a.example.com/1"), article("https://b.example.com/2")],
    );
    let fetcher = MockFetcher::new()
        .on_url(
            "https://a.example.com/1",
            source_doc("https://a.example.com/1", "first report text", None),
        )
        .on_url(
            "https://b.example.com/2",
            source_doc("https://b.example.com/2", "second report text", None),
        );
    let extractor = MockExtractor::new()
        .on_contains("first report", vec![candidate("Collapse", Some("2024-03-01"))])
        .on_contains("second report", vec![candidate("Salvage begins", Some("2024-03-03"))]);

    let controller = harness.controller(
        searcher,
        fetcher,
        extractor,
        MockRefiner::returning("q"),
        MockCuriosity::new(),
        run_config(1),
    );
    controller.run().await.unwrap();

    let edges = store.before_edges();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].0, (date(2024, 3, 1), "Collapse".to_string()));
    assert_eq!(edges[0].1, (date(2024, 3, 3), "Salvage begins".to_string()));
}

// ---------------------------------------------------------------------------
// Reflection and termination
// ---------------------------------------------------------------------------

#[tokio::test]
async fn follow_up_queries_drive_a_second_iteration() {
    let harness = Harness::new();

    let searcher = MockSearcher::new()
        .on_query("q", vec![article("https://a.example.com/1")])
        .on_query("follow-up", vec![article("https://b.example.com/2")]);
    let fetcher = MockFetcher::new()
        .on_url(
            "https://a.example.com/1",
            source_doc("https://a.example.com/1", "initial coverage", None),
        )
        .on_url(
            "https://b.example.com/2",
            source_doc("https://b.example.com/2", "later development", None),
        );
    let extractor = MockExtractor::new()
        .on_contains("initial coverage", vec![candidate("Collapse", Some("2024-03-01"))])
        .on_contains("later development", vec![candidate("Channel reopens", Some("2024-05-20"))]);
    let curiosity = Arc::new(MockCuriosity::new().then(&["follow-up"]));

    let controller = Controller::new(
        harness.graph,
        ChunkStore::new(Arc::new(harness.embedder), 0.1),
        Arc::new(searcher),
        Arc::new(fetcher),
        Arc::new(extractor),
        Arc::new(MockRefiner::returning("q")),
        curiosity.clone(),
        run_config(3),
    );

    let report = controller.run().await.unwrap();
    assert_eq!(report.events.len(), 2);
    // Reflection ran after iterations 1 and 2, seeing the growing timeline
    assert_eq!(curiosity.seen_event_counts(), vec![1, 2]);
    assert_eq!(report.stats.iterations, 2);
}

#[tokio::test]
async fn stops_when_no_progress_even_with_iterations_left() {
    let harness = Harness::new();

    let searcher = MockSearcher::new()
        .on_query("q", vec![article("https://a.example.com/1")])
        .on_query("dead-end", vec![article("https://a.example.com/1")]); // already visited
    let fetcher = MockFetcher::new().on_url(
        "https://a.example.com/1",
        source_doc("https://a.example.com/1", "only article", None),
    );
    let extractor = MockExtractor::new()
        .on_contains("only article", vec![candidate("Collapse", Some("2024-03-01"))]);

    let controller = harness.controller(
        searcher,
        fetcher,
        extractor,
        MockRefiner::returning("q"),
        MockCuriosity::new().then(&["dead-end"]).then(&["never-used"]),
        run_config(5),
    );

    let report = controller.run().await.unwrap();
    // Iteration 2 finds only a visited URL, produces nothing, and stops.
    assert_eq!(report.stats.iterations, 2);
    assert_eq!(report.events.len(), 1);
}

#[tokio::test]
async fn stops_when_curiosity_returns_no_queries() {
    let harness = Harness::new();

    let searcher = MockSearcher::new().on_query("q", vec![article("https://a.example.com/1")]);
    let fetcher = MockFetcher::new().on_url(
        "https://a.example.com/1",
        source_doc("https://a.example.com/1", "only article", None),
    );
    let extractor = MockExtractor::new()
        .on_contains("only article", vec![candidate("Collapse", Some("2024-03-01"))]);

    let controller = harness.controller(
        searcher,
        fetcher,
        extractor,
        MockRefiner::returning("q"),
        MockCuriosity::new(), // empty script: no follow-ups
        run_config(4),
    );

    let report = controller.run().await.unwrap();
    assert_eq!(report.stats.iterations, 1);
    assert_eq!(report.events.len(), 1);
}

#[tokio::test]
async fn cancellation_stops_before_the_next_iteration() {
    let harness = Harness::new();

    let controller = harness.controller(
        MockSearcher::new().on_query("q", vec![article("https://a.example.com/1")]),
        MockFetcher::new().on_url(
            "https://a.example.com/1",
            source_doc("https://a.example.com/1", "some text", None),
        ),
        MockExtractor::new(),
        MockRefiner::returning("q"),
        MockCuriosity::new(),
        run_config(3),
    );

    controller
        .cancel_handle()
        .store(true, std::sync::atomic::Ordering::Relaxed);

    let report = controller.run().await.unwrap();
    assert_eq!(report.stats.iterations, 0);
    assert!(report.events.is_empty());
}

// ---------------------------------------------------------------------------
// Failure containment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refiner_failure_falls_back_to_the_raw_topic() {
    let harness = Harness::new();

    let searcher = MockSearcher::new().on_query(
        "the harbor bridge collapse", // raw topic, not a refined query
        vec![article("https://a.example.com/1")],
    );
    let fetcher = MockFetcher::new().on_url(
        "https://a.example.com/1",
        source_doc("https://a.example.com/1", "bridge collapse coverage", None),
    );
    let extractor = MockExtractor::new()
        .on_contains("bridge collapse", vec![candidate("Collapse", Some("2024-03-01"))]);

    let controller = harness.controller(
        searcher,
        fetcher,
        extractor,
        MockRefiner::failing(),
        MockCuriosity::new(),
        run_config(1),
    );

    let report = controller.run().await.unwrap();
    assert_eq!(report.events.len(), 1);
}

#[tokio::test]
async fn fetch_and_extract_failures_are_contained_to_their_items() {
    let mut harness = Harness::new();
    harness.embedder = harness.embedder.failing_on("unembeddable");

    let searcher = MockSearcher::new().on_query(
        "q",
        vec![
            article("https://a.example.com/1"),
            article("https://missing.example.com/2"), // fetch fails
            article("https://b.example.com/3"),
            article("https://c.example.com/4"),
        ],
    );
    let fetcher = MockFetcher::new()
        .on_url(
            "https://a.example.com/1",
            source_doc("https://a.example.com/1", "good coverage", None),
        )
        .on_url(
            "https://b.example.com/3",
            source_doc("https://b.example.com/3", "unembeddable text", None),
        )
        .on_url(
            "https://c.example.com/4",
            source_doc("https://c.example.com/4", "poison for the extractor", None),
        );
    let extractor = MockExtractor::new()
        .on_contains("good coverage", vec![candidate("Collapse", Some("2024-03-01"))])
        .failing_on("poison");

    let mut config = run_config(1);
    config.max_articles_per_iteration = 4;

    let controller = harness.controller(
        searcher,
        fetcher,
        extractor,
        MockRefiner::returning("q"),
        MockCuriosity::new(),
        config,
    );

    let report = controller.run().await.unwrap();
    // The one healthy article still produced its event
    assert_eq!(report.events.len(), 1);
    assert_eq!(report.stats.fetch_failures, 1);
    assert_eq!(report.stats.articles_fetched, 3);
}

#[tokio::test]
async fn search_failure_yields_an_empty_run() {
    let harness = Harness::new();

    let controller = harness.controller(
        MockSearcher::new().failing(),
        MockFetcher::new(),
        MockExtractor::new(),
        MockRefiner::returning("q"),
        MockCuriosity::new(),
        run_config(2),
    );

    let report = controller.run().await.unwrap();
    assert!(report.events.is_empty());
    assert_eq!(report.stats.iterations, 1);
}

// ---------------------------------------------------------------------------
// Idempotence across sources
// ---------------------------------------------------------------------------

#[tokio::test]
async fn same_event_from_two_sources_is_stored_once() {
    let mut harness = Harness::new();
    // Distinct embeddings so both chunks pass the gate
    harness.embedder = harness
        .embedder
        .on_contains("wire report", vec![1.0, 0.0, 0.0, 0.0])
        .on_contains("local report", vec![0.0, 1.0, 0.0, 0.0]);

    let searcher = MockSearcher::new().on_query(
        "q",
        vec![article("https://wire.example.com/1"), article("https://local.example.com/2")],
    );
    let fetcher = MockFetcher::new()
        .on_url(
            "https://wire.example.com/1",
            source_doc("https://wire.example.com/1", "wire report of the collapse", None),
        )
        .on_url(
            "https://local.example.com/2",
            source_doc("https://local.example.com/2", "local report with new details", None),
        );
    // Both extractions name the same (title, date) event
    let extractor = MockExtractor::new()
        .on_contains("wire report", vec![candidate("Collapse", Some("2024-03-01"))])
        .on_contains("local report", vec![candidate("Collapse", Some("March 1, 2024"))]);

    let controller = harness.controller(
        searcher,
        fetcher,
        extractor,
        MockRefiner::returning("q"),
        MockCuriosity::new(),
        run_config(1),
    );

    let report = controller.run().await.unwrap();
    assert_eq!(report.events.len(), 1);
    assert_eq!(report.events[0].date, date(2024, 3, 1));
    // Both upserts count as persisted; the graph holds one node
    assert_eq!(report.stats.events_persisted, 2);
}

#[tokio::test]
async fn publish_date_fallback_rescues_undated_candidates() {
    let harness = Harness::new();

    let searcher = MockSearcher::new().on_query("q", vec![article("https://a.example.com/1")]);
    let fetcher = MockFetcher::new().on_url(
        "https://a.example.com/1",
        source_doc(
            "https://a.example.com/1",
            "coverage without explicit dates",
            Some(date(2024, 4, 2)),
        ),
    );
    let extractor = MockExtractor::new().on_contains(
        "without explicit dates",
        vec![candidate("Report released", None)],
    );

    let controller = harness.controller(
        searcher,
        fetcher,
        extractor,
        MockRefiner::returning("q"),
        MockCuriosity::new(),
        run_config(1),
    );

    let report = controller.run().await.unwrap();
    assert_eq!(report.events.len(), 1);
    assert_eq!(report.events[0].date, date(2024, 4, 2));
    assert_eq!(report.stats.candidates_dropped_dateless, 0);
}
