use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

// ============================================================================
// Event Envelope - Event Metadata
// ============================================================================
//
// Wraps domain events with metadata before they reach the event store.
// Generic over the event type.
//
// ============================================================================

/// Generic Event Envelope - wraps any domain event with metadata
///
/// Type Parameter:
/// - `E`: The domain event type (must implement DomainEvent trait)
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EventEnvelope<E> {
    // Event Identity
    pub event_id: Uuid,
    pub aggregate_id: Uuid,
    pub sequence_number: i64,

    // Event Type Information
    pub event_type: String,
    pub event_version: i32,

    // Event Payload
    pub event_data: E,

    // Correlation (groups everything done for one request)
    pub correlation_id: Uuid,

    // Actor Information
    pub user_id: Option<Uuid>,

    // Timing
    pub timestamp: DateTime<Utc>,

    // Additional Metadata
    pub metadata: HashMap<String, String>,
}

impl<E: DomainEvent> EventEnvelope<E> {
    /// Wrap an event; the sequence number is assigned by the event store.
    pub fn new(aggregate_id: Uuid, event_data: E, correlation_id: Uuid) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            aggregate_id,
            sequence_number: 0,
            event_type: event_data.event_type().to_string(),
            event_version: E::event_version(),
            event_data,
            correlation_id,
            user_id: None,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

// ============================================================================
// Domain Event Trait
// ============================================================================

/// All domain events implement this trait to be stored in an event store.
pub trait DomainEvent: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync {
    /// Name of this concrete event, e.g. "OrderUpdated"
    fn event_type(&self) -> &'static str;
    fn event_version() -> i32 where Self: Sized { 1 }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Clone, Debug)]
    struct TestEvent {
        data: String,
    }

    impl DomainEvent for TestEvent {
        fn event_type(&self) -> &'static str { "TestEvent" }
    }

    #[test]
    fn test_event_envelope_creation() {
        let aggregate_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();

        let envelope = EventEnvelope::new(
            aggregate_id,
            TestEvent { data: "test".to_string() },
            correlation_id,
        );

        assert_eq!(envelope.aggregate_id, aggregate_id);
        assert_eq!(envelope.sequence_number, 0);
        assert_eq!(envelope.event_type, "TestEvent");
        assert_eq!(envelope.event_version, 1);
        assert_eq!(envelope.correlation_id, correlation_id);
        assert!(envelope.user_id.is_none());
    }

    #[test]
    fn test_envelope_builders() {
        let user_id = Uuid::new_v4();
        let envelope = EventEnvelope::new(
            Uuid::new_v4(),
            TestEvent { data: "x".to_string() },
            Uuid::new_v4(),
        )
        .with_user(user_id)
        .with_metadata("source", "test");

        assert_eq!(envelope.user_id, Some(user_id));
        assert_eq!(envelope.metadata.get("source").map(String::as_str), Some("test"));
    }
}
