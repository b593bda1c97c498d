use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use neo4rs::query;
use tracing::{debug, info};

use chronicle_common::GraphEvent;

use crate::store::EventStore;
use crate::GraphClient;

/// Neo4j-backed event store.
///
/// Dates are stored as ISO `YYYY-MM-DD` strings, so lexicographic ORDER BY
/// is chronological and the same-date tiebreak falls out of the secondary
/// title sort. All node writes are MERGEs keyed on identity fields, so
/// re-ingesting the same fact from another source collapses into the
/// existing node.
pub struct Neo4jEventStore {
    client: GraphClient,
}

impl Neo4jEventStore {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventStore for Neo4jEventStore {
    async fn upsert_event(
        &self,
        event: &GraphEvent,
        location: &str,
        actors: &[String],
    ) -> Result<bool> {
        let date = event.date.format("%Y-%m-%d").to_string();

        let q = query(
            "MERGE (e:Event {title: $title, date: $date})
             ON CREATE SET e._created = true
             SET e.description = $description, e.url = $url
             WITH e, coalesce(e._created, false) AS created
             REMOVE e._created
             MERGE (d:Date {value: $date})
             MERGE (e)-[:HAPPENED_ON]->(d)
             WITH e, created
             MERGE (l:Location {name: $location})
             MERGE (e)-[:OCCURRED_AT]->(l)
             RETURN created",
        )
        .param("title", event.title.as_str())
        .param("date", date.as_str())
        .param("description", event.description.as_str())
        .param("url", event.url.as_str())
        .param("location", location);

        let mut stream = self
            .client
            .graph
            .execute(q)
            .await
            .context("Event upsert failed")?;

        let mut created = false;
        if let Some(row) = stream.next().await.context("Event upsert returned no row")? {
            created = row.get("created").unwrap_or(false);
        }

        if !actors.is_empty() {
            let q = query(
                "MATCH (e:Event {title: $title, date: $date})
                 UNWIND $actors AS actor_name
                 MERGE (a:Actor {name: actor_name})
                 MERGE (a)-[:PARTICIPATED_IN]->(e)",
            )
            .param("title", event.title.as_str())
            .param("date", date.as_str())
            .param("actors", actors.to_vec());

            self.client
                .graph
                .run(q)
                .await
                .context("Actor edge upsert failed")?;
        }

        debug!(title = event.title.as_str(), date = date.as_str(), created, "Event upserted");
        Ok(created)
    }

    async fn rebuild_before_chain(&self) -> Result<usize> {
        // Full replacement: never patch the chain incrementally. Duplicate
        // and out-of-order insertion can't leave stale edges behind.
        self.client
            .graph
            .run(query("MATCH ()-[b:BEFORE]->() DELETE b"))
            .await
            .context("Failed to clear BEFORE edges")?;

        self.client
            .graph
            .run(query(
                "MATCH (e:Event)
                 WITH e ORDER BY e.date ASC, e.title ASC
                 WITH collect(e) AS events
                 UNWIND range(0, size(events) - 2) AS i
                 WITH events[i] AS e1, events[i+1] AS e2
                 MERGE (e1)-[:BEFORE]->(e2)",
            ))
            .await
            .context("Failed to rebuild BEFORE chain")?;

        let count = self.before_edge_count().await?;
        info!(edges = count, "Temporal chain rebuilt");
        Ok(count)
    }

    async fn events_ascending(&self) -> Result<Vec<GraphEvent>> {
        let q = query(
            "MATCH (e:Event)
             RETURN e.title AS title, e.date AS date,
                    e.description AS description, e.url AS url
             ORDER BY e.date ASC, e.title ASC",
        );

        let mut stream = self
            .client
            .graph
            .execute(q)
            .await
            .context("Event scan failed")?;

        let mut events = Vec::new();
        while let Some(row) = stream.next().await.context("Event scan stream failed")? {
            let title: String = row.get("title").unwrap_or_default();
            let date: String = row.get("date").unwrap_or_default();
            let description: String = row.get("description").unwrap_or_default();
            let url: String = row.get("url").unwrap_or_default();

            let Ok(date) = NaiveDate::parse_from_str(&date, "%Y-%m-%d") else {
                continue;
            };
            events.push(GraphEvent {
                title,
                date,
                description,
                url,
            });
        }

        Ok(events)
    }

    async fn before_edge_count(&self) -> Result<usize> {
        let q = query("MATCH ()-[b:BEFORE]->() RETURN count(b) AS edges");

        let mut stream = self
            .client
            .graph
            .execute(q)
            .await
            .context("BEFORE edge count failed")?;

        if let Some(row) = stream.next().await.context("BEFORE edge count stream failed")? {
            let edges: i64 = row.get("edges").unwrap_or(0);
            return Ok(edges as usize);
        }

        Ok(0)
    }

    async fn clear(&self) -> Result<()> {
        self.client
            .graph
            .run(query("MATCH (n) DETACH DELETE n"))
            .await
            .context("Failed to clear graph")?;
        info!("Graph cleared for new run");
        Ok(())
    }
}
