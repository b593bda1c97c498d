use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use chronicle_common::GraphEvent;

use crate::store::EventStore;

/// In-memory event store.
///
/// The BTreeMap key (date, title) makes the ascending scan free and gives
/// same-date events their deterministic lexicographic-title tiebreak. The
/// whole map sits behind one mutex, so concurrent upserts serialize — two
/// tasks can't both create the same key.
#[derive(Default)]
pub struct MemoryEventStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    events: BTreeMap<(NaiveDate, String), StoredEvent>,
    before: Vec<((NaiveDate, String), (NaiveDate, String))>,
}

struct StoredEvent {
    event: GraphEvent,
    location: String,
    actors: BTreeSet<String>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Actors recorded for an event key. Test inspection hook.
    pub fn actors_for(&self, date: NaiveDate, title: &str) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .events
            .get(&(date, title.to_string()))
            .map(|s| s.actors.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Location recorded for an event key. Test inspection hook.
    pub fn location_for(&self, date: NaiveDate, title: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .events
            .get(&(date, title.to_string()))
            .map(|s| s.location.clone())
    }

    /// BEFORE edges as (from_key, to_key) pairs. Test inspection hook.
    pub fn before_edges(&self) -> Vec<((NaiveDate, String), (NaiveDate, String))> {
        self.inner.lock().unwrap().before.clone()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn upsert_event(
        &self,
        event: &GraphEvent,
        location: &str,
        actors: &[String],
    ) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let key = event.key();

        match inner.events.get_mut(&key) {
            Some(existing) => {
                // Merge: last-write-wins on non-key fields, actors accumulate
                existing.event.description = event.description.clone();
                existing.event.url = event.url.clone();
                existing.location = location.to_string();
                existing.actors.extend(actors.iter().cloned());
                Ok(false)
            }
            None => {
                inner.events.insert(
                    key,
                    StoredEvent {
                        event: event.clone(),
                        location: location.to_string(),
                        actors: actors.iter().cloned().collect(),
                    },
                );
                Ok(true)
            }
        }
    }

    async fn rebuild_before_chain(&self) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        let keys: Vec<(NaiveDate, String)> = inner.events.keys().cloned().collect();
        inner.before = keys.windows(2).map(|w| (w[0].clone(), w[1].clone())).collect();
        Ok(inner.before.len())
    }

    async fn events_ascending(&self) -> Result<Vec<GraphEvent>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.events.values().map(|s| s.event.clone()).collect())
    }

    async fn before_edge_count(&self) -> Result<usize> {
        Ok(self.inner.lock().unwrap().before.len())
    }

    async fn clear(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.events.clear();
        inner.before.clear();
        Ok(())
    }
}
