use std::sync::Arc;

use thiserror::Error;

use eduplan_billing::{BillableEntity, BillableRef, Invoice, InvoiceId, Plan, PlanId, PlanState};
use eduplan_core::ExpectedVersion;

/// Billing store operation error.
///
/// These are **infrastructure errors** (missing rows, stale versions, rejected
/// writes) as opposed to domain errors (validation, transitions).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("write rejected: {0}")]
    Rejected(String),

    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Transactional persistence for plans, invoices and billables.
///
/// Every write made through one [`BillingTransaction`] becomes visible
/// atomically on `commit`, or not at all. Transactions against the same plan
/// are serialized by the implementation (row lock, serializable isolation or
/// a process-wide lock), so a reader never sees two current invoices or a
/// torn plan state.
pub trait BillingStore: Send + Sync {
    fn begin(&self) -> Result<Box<dyn BillingTransaction + '_>, StoreError>;
}

impl<S> BillingStore for Arc<S>
where
    S: BillingStore + ?Sized,
{
    fn begin(&self) -> Result<Box<dyn BillingTransaction + '_>, StoreError> {
        (**self).begin()
    }
}

/// Unit of work over the billing tables.
///
/// Reads observe the transaction's own uncommitted writes. A failed write
/// leaves the transaction usable and its earlier writes intact; dropping the
/// transaction without `commit` discards everything.
pub trait BillingTransaction {
    fn plan(&self, id: PlanId) -> Result<Plan, StoreError>;

    /// Write the plan row, checking the stored version against `expected`.
    ///
    /// On success the plan is stamped with its new row version.
    fn save_plan(&mut self, plan: &mut Plan, expected: ExpectedVersion) -> Result<(), StoreError>;

    /// Plans currently in `state`, ordered by id.
    fn plans_in_state(&self, state: PlanState) -> Result<Vec<Plan>, StoreError>;

    fn invoice(&self, id: InvoiceId) -> Result<Invoice, StoreError>;

    /// Invoices bound to the plan, oldest billing period first.
    fn invoices_for_plan(&self, plan_id: PlanId) -> Result<Vec<Invoice>, StoreError>;

    fn save_invoice(&mut self, invoice: &Invoice) -> Result<(), StoreError>;

    fn billable(&self, reference: BillableRef) -> Result<BillableEntity, StoreError>;

    fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
