/// Compared by value, never by identity: billable references, preset
/// templates. Replace instead of mutating.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
