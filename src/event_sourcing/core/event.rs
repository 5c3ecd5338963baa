use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use anyhow::Result;

// ============================================================================
// Event Envelope - Event Metadata
// ============================================================================
//
// Wraps domain events with the metadata the store keeps alongside them.
// Generic over the event payload.
//
// ============================================================================

/// Generic Event Envelope - wraps any domain event with metadata
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

    // Groups the events emitted by one command
    pub correlation_id: Uuid,

    // Who triggered this event
    pub user_id: Option<Uuid>,

    pub timestamp: DateTime<Utc>,

    pub metadata: HashMap<String, String>,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        aggregate_id: Uuid,
        sequence_number: i64,
        event_type: String,
        event_data: E,
        correlation_id: Uuid,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            aggregate_id,
            sequence_number,
            event_type,
            event_version: 1,
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
}

// ============================================================================
// Domain Event Trait
// ============================================================================

/// All domain events implement this to be kept in the event store.
pub trait DomainEvent: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync {
    /// Name of the concrete variant, recorded on the envelope
    fn variant_name(&self) -> &'static str;
}

// ============================================================================
// Event Serialization Helpers
// ============================================================================

pub fn serialize_event<E: Serialize>(event: &E) -> Result<String> {
    Ok(serde_json::to_string(event)?)
}

pub fn deserialize_event<E: for<'de> Deserialize<'de>>(json: &str) -> Result<E> {
    Ok(serde_json::from_str(json)?)
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
        fn variant_name(&self) -> &'static str { "TestEvent" }
    }

    #[test]
    fn test_event_envelope_creation() {
        let aggregate_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let event = TestEvent {
            data: "test".to_string(),
        };

        let envelope = EventEnvelope::new(
            aggregate_id,
            1,
            event.variant_name().to_string(),
            event,
            correlation_id,
        )
        .with_user(user_id)
        .with_metadata("source", "test");

        assert_eq!(envelope.aggregate_id, aggregate_id);
        assert_eq!(envelope.sequence_number, 1);
        assert_eq!(envelope.event_type, "TestEvent");
        assert_eq!(envelope.correlation_id, correlation_id);
        assert_eq!(envelope.user_id, Some(user_id));
        assert_eq!(envelope.metadata.get("source").map(String::as_str), Some("test"));
    }

    #[test]
    fn test_event_serialization() {
        let event = TestEvent {
            data: "test data".to_string(),
        };

        let json = serialize_event(&event).unwrap();
        let deserialized: TestEvent = deserialize_event(&json).unwrap();

        assert_eq!(event.data, deserialized.data);
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        let result: Result<TestEvent> = deserialize_event("{not json");
        assert!(result.is_err());
    }
}
