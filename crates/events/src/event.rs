use chrono::{DateTime, Utc};

/// A committed domain fact, as carried on the bus.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted name consumers route on, e.g. `billing.plan.blocked`.
    fn event_type(&self) -> &'static str;

    /// Payload schema revision; bump when the serialized shape changes.
    fn schema_version(&self) -> u32 {
        1
    }

    /// Business time of the fact.
    fn occurred_at(&self) -> DateTime<Utc>;
}
