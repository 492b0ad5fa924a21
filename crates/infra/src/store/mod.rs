//! Transactional billing store boundary.
//!
//! Plans, invoices and billables are loaded and saved through short
//! transactions so multi-row changes (demote + promote, state + version)
//! commit atomically.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryBillingStore;
pub use r#trait::{BillingStore, BillingTransaction, StoreError};
