use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;
use anyhow::{Result, bail};

use crate::event_sourcing::core::{DomainEvent, EventEnvelope};

// ============================================================================
// Generic Event Store - Append-only log per aggregate
// ============================================================================
//
// Type Parameter:
// - `E`: The domain event type (must implement DomainEvent trait)
//
// Responsibilities:
// 1. Append events per aggregate (append-only)
// 2. Load event history for aggregates
// 3. Ensure optimistic concurrency control on sequence numbers
//
// The log lives in memory; a durable backend would keep the same contract.
//
// ============================================================================

pub struct EventStore<E: DomainEvent> {
    aggregate_type_name: String,  // e.g., "Order"
    streams: RwLock<HashMap<Uuid, Vec<EventEnvelope<E>>>>,
}

impl<E: DomainEvent> EventStore<E> {
    pub fn new(aggregate_type_name: &str) -> Self {
        Self {
            aggregate_type_name: aggregate_type_name.to_string(),
            streams: RwLock::new(HashMap::new()),
        }
    }

    /// Append events to an aggregate's stream.
    /// Returns the sequence number of the last appended event.
    pub async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_sequence: i64,
        events: Vec<EventEnvelope<E>>,
    ) -> Result<i64> {
        if events.is_empty() {
            bail!("Cannot append empty event list");
        }

        if let Some(stray) = events.iter().find(|e| e.aggregate_id != aggregate_id) {
            bail!(
                "Event {} belongs to aggregate {}, not {}",
                stray.event_id,
                stray.aggregate_id,
                aggregate_id
            );
        }

        let mut streams = self.streams.write().await;
        let stream = streams.entry(aggregate_id).or_default();

        let current = stream.len() as i64;
        if current != expected_sequence {
            bail!(
                "Concurrency conflict on {} {}: expected sequence {}, but current is {}",
                self.aggregate_type_name,
                aggregate_id,
                expected_sequence,
                current
            );
        }

        let mut sequence = expected_sequence;
        for mut envelope in events {
            sequence += 1;
            envelope.sequence_number = sequence;
            stream.push(envelope);
        }

        tracing::debug!(
            aggregate_type = %self.aggregate_type_name,
            aggregate_id = %aggregate_id,
            sequence = sequence,
            "Events appended"
        );

        Ok(sequence)
    }

    /// Load all events for an aggregate in sequence order
    pub async fn load_events(&self, aggregate_id: Uuid) -> Vec<EventEnvelope<E>> {
        self.streams
            .read()
            .await
            .get(&aggregate_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Sequence number of the latest event (0 when the stream is empty)
    pub async fn get_current_sequence(&self, aggregate_id: Uuid) -> i64 {
        self.streams
            .read()
            .await
            .get(&aggregate_id)
            .map(|stream| stream.len() as i64)
            .unwrap_or(0)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    struct Noted {
        note: String,
    }

    impl DomainEvent for Noted {
        fn event_type(&self) -> &'static str { "Noted" }
    }

    fn envelope(aggregate_id: Uuid, note: &str) -> EventEnvelope<Noted> {
        EventEnvelope::new(aggregate_id, Noted { note: note.to_string() }, Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_append_assigns_sequence_numbers() {
        let store = EventStore::<Noted>::new("Order");
        let aggregate_id = Uuid::new_v4();

        let last = store
            .append_events(aggregate_id, 0, vec![envelope(aggregate_id, "a"), envelope(aggregate_id, "b")])
            .await
            .unwrap();
        assert_eq!(last, 2);

        let events = store.load_events(aggregate_id).await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].sequence_number, 1);
        assert_eq!(events[1].sequence_number, 2);
        assert_eq!(events[1].event_data.note, "b");
    }

    #[tokio::test]
    async fn test_concurrency_conflict_detected() {
        let store = EventStore::<Noted>::new("Order");
        let aggregate_id = Uuid::new_v4();

        store.append_events(aggregate_id, 0, vec![envelope(aggregate_id, "a")]).await.unwrap();

        let result = store.append_events(aggregate_id, 0, vec![envelope(aggregate_id, "b")]).await;
        assert!(result.unwrap_err().to_string().contains("Concurrency conflict"));
        assert_eq!(store.get_current_sequence(aggregate_id).await, 1);
    }

    #[tokio::test]
    async fn test_empty_append_rejected() {
        let store = EventStore::<Noted>::new("Order");
        assert!(store.append_events(Uuid::new_v4(), 0, vec![]).await.is_err());
    }

    #[tokio::test]
    async fn test_foreign_event_rejected() {
        let store = EventStore::<Noted>::new("Order");
        let aggregate_id = Uuid::new_v4();

        let result = store
            .append_events(aggregate_id, 0, vec![envelope(Uuid::new_v4(), "stray")])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_streams_are_isolated() {
        let store = EventStore::<Noted>::new("Order");
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        store.append_events(first, 0, vec![envelope(first, "a")]).await.unwrap();
        store.append_events(first, 1, vec![envelope(first, "b")]).await.unwrap();
        store.append_events(second, 0, vec![envelope(second, "c")]).await.unwrap();

        assert_eq!(store.get_current_sequence(first).await, 2);
        assert_eq!(store.get_current_sequence(second).await, 1);
        assert!(store.load_events(Uuid::new_v4()).await.is_empty());
    }
}
