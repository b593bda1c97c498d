use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::Claude;
use chronicle_agent::controller::Controller;
use chronicle_agent::curiosity::GapFinder;
use chronicle_agent::dedup::ChunkStore;
use chronicle_agent::embedder::Embedder;
use chronicle_agent::extractor::ClaudeExtractor;
use chronicle_agent::narrator::NarrativeCompiler;
use chronicle_agent::refiner::TopicRefiner;
use chronicle_agent::retrieval::{GNewsSearcher, PageFetcher};
use chronicle_agent::traits::Narrator;
use chronicle_common::Config;
use chronicle_graph::{GraphClient, Neo4jEventStore, TimelineGraph};

const CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";

/// Build a chronological event graph for a news topic.
#[derive(Parser)]
#[command(name = "chronicle")]
struct Args {
    /// Topic to research, e.g. "the 2024 Baltimore bridge collapse"
    topic: String,

    /// Skip the final narrative rendering
    #[arg(long)]
    no_narrative: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("chronicle_agent=info".parse()?)
                .add_directive("chronicle_graph=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env();
    let run_config = config.run_config(&args.topic);

    info!(topic = %args.topic, "Chronicle starting");

    let client =
        GraphClient::connect(&config.neo4j_uri, &config.neo4j_user, &config.neo4j_password)
            .await?;
    let graph = TimelineGraph::new(Arc::new(Neo4jEventStore::new(client)));

    let claude = Claude::new(&config.anthropic_api_key, CLAUDE_MODEL);
    let embedder = Embedder::new(
        &config.embedding_api_key,
        config.embedding_base_url.as_deref(),
    );
    let store = ChunkStore::new(Arc::new(embedder), run_config.dedup_distance_threshold);

    let controller = Controller::new(
        graph,
        store,
        Arc::new(GNewsSearcher::new(&config.gnews_api_key)),
        Arc::new(PageFetcher::new()),
        Arc::new(ClaudeExtractor::new(claude.clone())),
        Arc::new(TopicRefiner::new(claude.clone())),
        Arc::new(GapFinder::new(claude.clone())),
        run_config,
    );

    let report = controller.run().await?;
    info!(stats = %report.stats, "Run finished");

    if args.no_narrative || report.events.is_empty() {
        println!("{}", serde_json::to_string_pretty(&report.events)?);
        return Ok(());
    }

    let narrator = NarrativeCompiler::new(claude);
    let narrative = narrator.narrate(&args.topic, &report.events).await?;
    println!("{}", serde_json::to_string_pretty(&narrative)?);

    Ok(())
}
