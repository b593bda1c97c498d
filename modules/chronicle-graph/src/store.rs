// Storage seam for the temporal graph.
//
// The timeline core depends only on these guarantees: upsert-by-key for
// event/date/location/actor nodes, an ascending-date scan, and full
// replacement of the BEFORE chain. Anything honoring them can back a run —
// the Neo4j store in production, the in-memory store in tests (and for
// runs that don't need the graph to outlive the process).

use anyhow::Result;
use async_trait::async_trait;

use chronicle_common::GraphEvent;

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Upsert an event by (title, date), its Date node, its Location node,
    /// and participation edges for each actor. Returns true if the event
    /// node was newly created, false if an existing node was merged into.
    /// Non-key fields are last-write-wins.
    async fn upsert_event(
        &self,
        event: &GraphEvent,
        location: &str,
        actors: &[String],
    ) -> Result<bool>;

    /// Replace the entire BEFORE-edge set with edges linking each
    /// consecutive pair of the ascending (date, title) scan. Returns the
    /// number of edges after the rebuild: exactly N-1 for N events.
    async fn rebuild_before_chain(&self) -> Result<usize>;

    /// All events ascending by (date, title).
    async fn events_ascending(&self) -> Result<Vec<GraphEvent>>;

    /// Current number of BEFORE edges.
    async fn before_edge_count(&self) -> Result<usize>;

    /// Drop all nodes and edges. Called at run start; a run owns its
    /// store exclusively.
    async fn clear(&self) -> Result<()>;
}
