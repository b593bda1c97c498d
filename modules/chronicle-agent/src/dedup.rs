//! Embedding-gated chunk store.
//!
//! A chunk is admitted only if its embedding is at least the configured
//! cosine distance away from every chunk already stored. Near-duplicate
//! coverage of the same event from different outlets is dropped before
//! it reaches extraction.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::debug;

use chronicle_common::Chunk;

use crate::traits::TextEmbedder;

/// Result of one admission attempt.
#[derive(Debug, Clone, Copy)]
pub struct PutOutcome {
    pub inserted: bool,
    /// Cosine distance to the closest stored chunk. `None` when the
    /// store was empty.
    pub nearest_distance: Option<f32>,
}

struct StoredChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// In-memory vector store for one run's chunks.
pub struct ChunkStore {
    embedder: Arc<dyn TextEmbedder>,
    distance_threshold: f32,
    inner: Mutex<Vec<StoredChunk>>,
}

impl ChunkStore {
    pub fn new(embedder: Arc<dyn TextEmbedder>, distance_threshold: f32) -> Self {
        Self {
            embedder,
            distance_threshold,
            inner: Mutex::new(Vec::new()),
        }
    }

    /// Embed the chunk and admit it unless a stored chunk sits within
    /// the distance threshold. Nearest-neighbor check and insert happen
    /// under one lock so concurrent puts cannot both admit the same
    /// near-duplicate pair.
    pub async fn put(&self, chunk: Chunk) -> Result<PutOutcome> {
        let embedding = self.embedder.embed(&chunk.text).await?;

        let mut inner = self.inner.lock().await;
        let nearest = inner
            .iter()
            .map(|stored| cosine_distance(&stored.embedding, &embedding))
            .min_by(|a, b| a.total_cmp(b));

        if let Some(distance) = nearest {
            if distance < self.distance_threshold {
                debug!(
                    chunk_id = %chunk.id,
                    distance,
                    threshold = self.distance_threshold,
                    "dropping near-duplicate chunk"
                );
                return Ok(PutOutcome {
                    inserted: false,
                    nearest_distance: Some(distance),
                });
            }
        }

        inner.push(StoredChunk { chunk, embedding });
        Ok(PutOutcome {
            inserted: true,
            nearest_distance: nearest,
        })
    }

    /// All admitted chunks in insertion order.
    pub async fn all_chunks(&self) -> Vec<Chunk> {
        self.inner
            .lock()
            .await
            .iter()
            .map(|stored| stored.chunk.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn clear(&self) {
        self.inner.lock().await.clear();
    }
}

/// Cosine distance (1 - cosine similarity). Zero-norm vectors are
/// treated as maximally distant.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}
