use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Neo4j
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,

    // AI providers
    pub anthropic_api_key: String,
    pub embedding_api_key: String,
    pub embedding_base_url: Option<String>,

    // Retrieval
    pub gnews_api_key: String,

    // Run defaults (overridable per run)
    pub max_iterations: u32,
    pub max_articles_per_iteration: usize,
    pub dedup_distance_threshold: f32,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            neo4j_uri: required_env("NEO4J_URI"),
            neo4j_user: required_env("NEO4J_USER"),
            neo4j_password: required_env("NEO4J_PASSWORD"),
            anthropic_api_key: required_env("ANTHROPIC_API_KEY"),
            embedding_api_key: required_env("EMBEDDING_API_KEY"),
            embedding_base_url: env::var("EMBEDDING_BASE_URL").ok(),
            gnews_api_key: required_env("GNEWS_API_KEY"),
            max_iterations: parsed_env("MAX_ITERATIONS", 2),
            max_articles_per_iteration: parsed_env("MAX_ARTICLES_PER_ITERATION", 3),
            dedup_distance_threshold: parsed_env("DEDUP_DISTANCE_THRESHOLD", 0.1),
        }
    }

    /// Knobs for a single run, seeded from env defaults.
    pub fn run_config(&self, topic: &str) -> RunConfig {
        RunConfig {
            topic: topic.to_string(),
            max_iterations: self.max_iterations,
            max_articles_per_iteration: self.max_articles_per_iteration,
            dedup_distance_threshold: self.dedup_distance_threshold,
        }
    }
}

/// Per-run behavior knobs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub topic: String,
    pub max_iterations: u32,
    pub max_articles_per_iteration: usize,
    pub dedup_distance_threshold: f32,
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid number, got {raw:?}")),
        Err(_) => default,
    }
}
