pub mod chunker;
pub mod controller;
pub mod curiosity;
pub mod dedup;
pub mod embedder;
pub mod extractor;
pub mod narrator;
pub mod refiner;
pub mod retrieval;
pub mod testing;
pub mod traits;

pub use controller::{Controller, RunReport, RunStats};
pub use dedup::ChunkStore;
