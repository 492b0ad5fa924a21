//! Plan lifecycle and billing-state domain module.
//!
//! Business rules for subscription plans, their invoices and billable audit
//! snapshots, implemented purely as deterministic domain logic (no IO, no
//! storage, no notifications).

pub mod audit;
pub mod billable;
pub mod invoice;
pub mod ledger;
pub mod plan;
pub mod preset;
pub mod state;

pub use audit::BillableAudit;
pub use billable::{
    Billable, BillableEntity, BillableId, BillableKind, BillableRef, Course, Environment,
    PartnerEnvironmentAssociation,
};
pub use invoice::{Invoice, InvoiceId, SettlementState};
pub use ledger::{CurrentInvoiceChange, InvoiceLedger};
pub use plan::{
    BillableAudited, ChangeState, Plan, PlanCommand, PlanEvent, PlanId, RecordBillableAudit,
    StateChanged, PLAN_AGGREGATE_TYPE,
};
pub use preset::{from_preset, PlanKind, PlanLimits, PlanTemplate};
pub use state::{EntryAction, PlanState, Transition, TransitionRule};
