use std::collections::HashMap;
use std::marker::PhantomData;
use uuid::Uuid;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::event_sourcing::core::{DomainEvent, EventEnvelope, Aggregate, serialize_event, deserialize_event};

// ============================================================================
// Generic Event Store - Repository for Events
// ============================================================================
//
// Responsibilities:
// 1. Append events per aggregate stream (append-only)
// 2. Load event history for aggregates
// 3. Ensure optimistic concurrency control
//
// Payloads are kept serialized, the same way a database row would hold them,
// and decoded on load.
//
// ============================================================================

/// Raised when an append carries a stale expected version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Concurrency conflict on {aggregate_id}: expected version {expected}, but current is {actual}")]
pub struct ConcurrencyConflict {
    pub aggregate_id: Uuid,
    pub expected: i64,
    pub actual: i64,
}

#[derive(Debug, Clone)]
struct StoredEvent {
    event_id: Uuid,
    sequence_number: i64,
    event_type: String,
    event_version: i32,
    event_data: String,
    correlation_id: Uuid,
    user_id: Option<Uuid>,
    timestamp: DateTime<Utc>,
    metadata: HashMap<String, String>,
}

pub struct EventStore<E: DomainEvent> {
    streams: RwLock<HashMap<Uuid, Vec<StoredEvent>>>,
    aggregate_type_name: String,  // e.g., "Course"
    _phantom: PhantomData<E>,
}

impl<E: DomainEvent> EventStore<E> {
    pub fn new(aggregate_type_name: &str) -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            aggregate_type_name: aggregate_type_name.to_string(),
            _phantom: PhantomData,
        }
    }

    pub fn aggregate_type_name(&self) -> &str {
        &self.aggregate_type_name
    }

    /// Append events to the event store
    /// Returns the new version number after appending
    pub async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<EventEnvelope<E>>,
    ) -> Result<i64> {
        if events.is_empty() {
            bail!("Cannot append empty event list");
        }

        // Serialize before taking the lock so a bad payload leaves the stream untouched
        let mut rows = Vec::with_capacity(events.len());
        let mut new_version = expected_version;
        for envelope in &events {
            new_version += 1;
            rows.push(StoredEvent {
                event_id: envelope.event_id,
                sequence_number: new_version,
                event_type: envelope.event_type.clone(),
                event_version: envelope.event_version,
                event_data: serialize_event(&envelope.event_data)
                    .with_context(|| format!("Failed to serialize {}", envelope.event_type))?,
                correlation_id: envelope.correlation_id,
                user_id: envelope.user_id,
                timestamp: envelope.timestamp,
                metadata: envelope.metadata.clone(),
            });
        }

        let mut streams = self.streams.write().await;
        let stream = streams.entry(aggregate_id).or_default();

        // Check optimistic concurrency
        let current_version = stream.last().map(|row| row.sequence_number).unwrap_or(0);
        if current_version != expected_version {
            return Err(ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual: current_version,
            }
            .into());
        }

        stream.extend(rows);

        tracing::info!(
            aggregate_id = %aggregate_id,
            aggregate_type = %self.aggregate_type_name,
            new_version = new_version,
            event_count = events.len(),
            "Appended events to event store"
        );

        Ok(new_version)
    }

    /// Load all events for an aggregate, ordered by sequence number
    pub async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<EventEnvelope<E>>> {
        let streams = self.streams.read().await;
        let Some(stream) = streams.get(&aggregate_id) else {
            return Ok(Vec::new());
        };

        let mut events = Vec::with_capacity(stream.len());
        for row in stream {
            let event_data: E = deserialize_event(&row.event_data).with_context(|| {
                format!(
                    "Failed to decode {} #{} for aggregate {}",
                    row.event_type, row.sequence_number, aggregate_id
                )
            })?;

            events.push(EventEnvelope {
                event_id: row.event_id,
                aggregate_id,
                sequence_number: row.sequence_number,
                event_type: row.event_type.clone(),
                event_version: row.event_version,
                event_data,
                correlation_id: row.correlation_id,
                user_id: row.user_id,
                timestamp: row.timestamp,
                metadata: row.metadata.clone(),
            });
        }

        tracing::debug!("Loaded {} events for aggregate {}", events.len(), aggregate_id);
        Ok(events)
    }

    /// Get current version of aggregate (0 when it has no events)
    pub async fn get_current_version(&self, aggregate_id: Uuid) -> Result<i64> {
        let streams = self.streams.read().await;
        Ok(streams
            .get(&aggregate_id)
            .and_then(|stream| stream.last())
            .map(|row| row.sequence_number)
            .unwrap_or(0))
    }

    /// Load aggregate from events
    pub async fn load_aggregate<A>(&self, aggregate_id: Uuid) -> Result<A>
    where
        A: Aggregate<Event = E>,
        <A as Aggregate>::Error: std::fmt::Display,
    {
        let events = self.load_events(aggregate_id).await?;

        if events.is_empty() {
            bail!("Aggregate not found: {}", aggregate_id);
        }

        A::load_from_events(events)
    }

    /// Check if aggregate exists
    pub async fn aggregate_exists(&self, aggregate_id: Uuid) -> Result<bool> {
        let version = self.get_current_version(aggregate_id).await?;
        Ok(version > 0)
    }

    /// Ids of every stream that holds at least one event
    pub async fn aggregate_ids(&self) -> Vec<Uuid> {
        let streams = self.streams.read().await;
        streams
            .iter()
            .filter(|(_, stream)| !stream.is_empty())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Rebuild every aggregate in the store
    pub async fn load_all<A>(&self) -> Result<Vec<A>>
    where
        A: Aggregate<Event = E>,
        <A as Aggregate>::Error: std::fmt::Display,
    {
        let mut aggregates = Vec::new();
        for aggregate_id in self.aggregate_ids().await {
            aggregates.push(self.load_aggregate::<A>(aggregate_id).await?);
        }
        Ok(aggregates)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Clone, Debug)]
    #[serde(tag = "type", content = "data")]
    enum CounterEvent {
        Opened { start: i64 },
        Added { amount: i64 },
    }

    impl DomainEvent for CounterEvent {
        fn variant_name(&self) -> &'static str {
            match self {
                CounterEvent::Opened { .. } => "CounterOpened",
                CounterEvent::Added { .. } => "CounterAdded",
            }
        }
    }

    #[derive(Debug)]
    struct Counter {
        id: Uuid,
        version: i64,
        total: i64,
    }

    impl Aggregate for Counter {
        type Event = CounterEvent;
        type Command = i64;
        type Error = String;

        fn apply_first_event(aggregate_id: Uuid, event: &Self::Event) -> Result<Self, Self::Error> {
            match event {
                CounterEvent::Opened { start } => Ok(Self { id: aggregate_id, version: 0, total: *start }),
                _ => Err("counter not opened".to_string()),
            }
        }

        fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
            match event {
                CounterEvent::Opened { .. } => Err("counter opened twice".to_string()),
                CounterEvent::Added { amount } => {
                    self.total += amount;
                    Ok(())
                }
            }
        }

        fn handle_command(&self, amount: &i64) -> Result<Vec<Self::Event>, Self::Error> {
            Ok(vec![CounterEvent::Added { amount: *amount }])
        }

        fn version(&self) -> i64 { self.version }
        fn set_version(&mut self, version: i64) { self.version = version; }
    }

    fn envelope(aggregate_id: Uuid, seq: i64, event: CounterEvent) -> EventEnvelope<CounterEvent> {
        EventEnvelope::new(aggregate_id, seq, event.variant_name().to_string(), event, Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_append_and_load_aggregate() {
        let store = EventStore::<CounterEvent>::new("Counter");
        let id = Uuid::new_v4();

        let version = store
            .append_events(id, 0, vec![
                envelope(id, 1, CounterEvent::Opened { start: 10 }),
                envelope(id, 2, CounterEvent::Added { amount: 5 }),
            ])
            .await
            .unwrap();
        assert_eq!(version, 2);

        let counter = store.load_aggregate::<Counter>(id).await.unwrap();
        assert_eq!(counter.id, id);
        assert_eq!(counter.total, 15);
        assert_eq!(counter.version, 2);
        assert!(store.aggregate_exists(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_version_is_a_concurrency_conflict() {
        let store = EventStore::<CounterEvent>::new("Counter");
        let id = Uuid::new_v4();
        store
            .append_events(id, 0, vec![envelope(id, 1, CounterEvent::Opened { start: 0 })])
            .await
            .unwrap();

        let err = store
            .append_events(id, 0, vec![envelope(id, 1, CounterEvent::Added { amount: 1 })])
            .await
            .unwrap_err();

        let conflict = err.downcast_ref::<ConcurrencyConflict>().unwrap();
        assert_eq!(conflict.expected, 0);
        assert_eq!(conflict.actual, 1);
        assert_eq!(store.get_current_version(id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_append_is_rejected() {
        let store = EventStore::<CounterEvent>::new("Counter");
        let result = store.append_events(Uuid::new_v4(), 0, vec![]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_aggregate() {
        let store = EventStore::<CounterEvent>::new("Counter");
        let id = Uuid::new_v4();

        assert!(!store.aggregate_exists(id).await.unwrap());
        assert!(store.load_events(id).await.unwrap().is_empty());
        assert!(store.load_aggregate::<Counter>(id).await.is_err());
    }

    #[tokio::test]
    async fn test_load_all_rebuilds_each_stream() {
        let store = EventStore::<CounterEvent>::new("Counter");
        for start in [1, 2, 3] {
            let id = Uuid::new_v4();
            store
                .append_events(id, 0, vec![envelope(id, 1, CounterEvent::Opened { start })])
                .await
                .unwrap();
        }

        let mut totals: Vec<i64> = store
            .load_all::<Counter>()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.total)
            .collect();
        totals.sort();
        assert_eq!(totals, vec![1, 2, 3]);
        assert_eq!(store.aggregate_type_name(), "Counter");
    }
}
