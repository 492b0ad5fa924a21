use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use eduplan_core::AggregateId;

use crate::Event;

/// Routing metadata for one committed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventHeader {
    pub event_id: Uuid,
    pub aggregate_id: AggregateId,
    /// e.g. `billing.plan`; consumers filter on it before decoding.
    pub aggregate_type: String,
    /// Aggregate row version after the write that produced the event.
    pub sequence_number: u64,
    pub event_type: String,
    pub schema_version: u32,
    pub occurred_at: DateTime<Utc>,
}

/// A committed event as it travels over the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    header: EventHeader,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(header: EventHeader, payload: E) -> Self {
        Self { header, payload }
    }

    pub fn header(&self) -> &EventHeader {
        &self.header
    }

    pub fn event_id(&self) -> Uuid {
        self.header.event_id
    }

    pub fn aggregate_id(&self) -> AggregateId {
        self.header.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.header.aggregate_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.header.sequence_number
    }

    pub fn event_type(&self) -> &str {
        &self.header.event_type
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.header.occurred_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_parts(self) -> (EventHeader, E) {
        (self.header, self.payload)
    }
}

impl EventEnvelope<JsonValue> {
    /// Serialize `event` and stamp it with a fresh UUIDv7 event id.
    pub fn from_typed<T>(
        aggregate_id: AggregateId,
        aggregate_type: &str,
        sequence_number: u64,
        event: &T,
    ) -> Result<Self, serde_json::Error>
    where
        T: Event + Serialize,
    {
        let header = EventHeader {
            event_id: Uuid::now_v7(),
            aggregate_id,
            aggregate_type: aggregate_type.to_string(),
            sequence_number,
            event_type: event.event_type().to_string(),
            schema_version: event.schema_version(),
            occurred_at: event.occurred_at(),
        };
        Ok(Self::new(header, serde_json::to_value(event)?))
    }

    /// Decode the payload into the typed event it was built from.
    pub fn decode<T>(&self) -> Result<T, serde_json::Error>
    where
        T: for<'de> Deserialize<'de>,
    {
        T::deserialize(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Renamed {
        name: String,
        at: DateTime<Utc>,
    }

    impl Event for Renamed {
        fn event_type(&self) -> &'static str {
            "billing.plan.renamed"
        }

        fn schema_version(&self) -> u32 {
            2
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            self.at
        }
    }

    #[test]
    fn from_typed_fills_header_from_the_event() {
        let event = Renamed {
            name: "Professor Plus".to_string(),
            at: Utc::now(),
        };
        let aggregate_id = AggregateId::new();

        let envelope = EventEnvelope::from_typed(aggregate_id, "billing.plan", 4, &event).unwrap();

        assert_eq!(envelope.aggregate_id(), aggregate_id);
        assert_eq!(envelope.aggregate_type(), "billing.plan");
        assert_eq!(envelope.sequence_number(), 4);
        assert_eq!(envelope.event_type(), "billing.plan.renamed");
        assert_eq!(envelope.header().schema_version, 2);
        assert_eq!(envelope.occurred_at(), event.at);
        assert_eq!(envelope.decode::<Renamed>().unwrap(), event);
    }
}
