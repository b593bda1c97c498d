pub mod client;
pub mod memory;
pub mod neo4j;
pub mod store;
pub mod timeline;

pub use client::GraphClient;
pub use memory::MemoryEventStore;
pub use neo4j::Neo4jEventStore;
pub use store::EventStore;
pub use timeline::TimelineGraph;
