//! Plan workflows: lifecycle transitions, current-invoice assignment and
//! billable audits.
//!
//! Every operation is one store transaction:
//!
//! ```text
//! begin
//!   ↓
//! load plan (and invoices)
//!   ↓
//! decide (Plan::handle / InvoiceLedger::reassign), nothing written yet
//!   ↓
//! write rows
//!   ↓
//! commit
//!   ↓
//! publish events (after commit, failures logged)
//! ```
//!
//! Returning early with `?` drops the transaction, which rolls it back.

use chrono::Utc;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, info, warn};

use eduplan_billing::{
    BillableAudit, ChangeState, Invoice, InvoiceId, InvoiceLedger, PLAN_AGGREGATE_TYPE, Plan,
    PlanCommand, PlanEvent, PlanId, PlanState, RecordBillableAudit, SettlementState, Transition,
};
use eduplan_core::{AggregateRoot, DomainError, ExpectedVersion};
use eduplan_events::{EventBus, EventEnvelope, execute};

use crate::store::{BillingStore, BillingTransaction, StoreError};

/// Error surfaced to the administrative workflow layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid transition: cannot {event} from {from}")]
    InvalidTransition {
        event: &'static str,
        from: &'static str,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("concurrent modification: {0}")]
    Conflict(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("persistence failed: {0}")]
    Persistence(#[source] StoreError),
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::InvalidTransition { event, from } => {
                ServiceError::InvalidTransition { event, from }
            }
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                ServiceError::Validation(msg)
            }
            DomainError::InvariantViolation(msg) => ServiceError::InvariantViolation(msg),
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
            DomainError::NotFound => ServiceError::NotFound(value.to_string()),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { .. } => ServiceError::NotFound(value.to_string()),
            StoreError::Concurrency(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Persistence(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Entry point for billing/admin workflows acting on plans.
#[derive(Debug)]
pub struct PlanService<S, B> {
    store: S,
    bus: B,
}

impl<S, B> PlanService<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self { store, bus }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn into_parts(self) -> (S, B) {
        (self.store, self.bus)
    }
}

impl<S, B> PlanService<S, B>
where
    S: BillingStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Persist a new plan (for example one built by `from_preset`).
    pub fn create_plan(&self, mut plan: Plan) -> ServiceResult<Plan> {
        plan.validate()?;

        let mut tx = self.store.begin()?;
        tx.save_plan(&mut plan, ExpectedVersion::NoRow)?;
        tx.commit()?;

        info!(plan_id = %plan.id_typed(), kind = plan.kind().type_name(), "plan created");
        Ok(plan)
    }

    pub fn plan(&self, plan_id: PlanId) -> ServiceResult<Plan> {
        let tx = self.store.begin()?;
        Ok(tx.plan(plan_id)?)
    }

    pub fn block(&self, plan_id: PlanId) -> ServiceResult<Plan> {
        self.transition(plan_id, Transition::Block)
    }

    /// From `active` this is a self-loop: the row is rewritten, nothing else
    /// happens.
    pub fn activate(&self, plan_id: PlanId) -> ServiceResult<Plan> {
        self.transition(plan_id, Transition::Activate)
    }

    pub fn migrate(&self, plan_id: PlanId) -> ServiceResult<Plan> {
        self.transition(plan_id, Transition::Migrate)
    }

    /// Fire a lifecycle event and commit the new state.
    ///
    /// Entry side effects (the blocked notice) run from the published event,
    /// after commit. Their failure never undoes the transition.
    pub fn transition(&self, plan_id: PlanId, transition: Transition) -> ServiceResult<Plan> {
        let mut tx = self.store.begin()?;
        let mut plan = tx.plan(plan_id)?;
        let expected = ExpectedVersion::Exact(plan.version());

        let cmd = PlanCommand::ChangeState(ChangeState {
            plan_id,
            transition,
            occurred_at: Utc::now(),
        });
        let events = execute(&mut plan, &cmd)?;

        tx.save_plan(&mut plan, expected)?;
        tx.commit()?;

        info!(
            %plan_id,
            event = transition.as_str(),
            state = plan.state().as_str(),
            "plan state changed"
        );
        self.publish(&plan, &events);
        Ok(plan)
    }

    /// Make `invoice_id` the plan's current invoice, or clear it with `None`.
    /// Returns the new current invoice.
    ///
    /// The previous current invoice is demoted first. That write is
    /// best-effort: a failure is logged and the assignment goes on. Failing
    /// to promote the new invoice aborts the whole transaction.
    pub fn set_current_invoice(
        &self,
        plan_id: PlanId,
        invoice_id: Option<InvoiceId>,
    ) -> ServiceResult<Option<Invoice>> {
        let mut tx = self.store.begin()?;
        let ledger = self.ledger(&*tx, plan_id)?;
        let target = invoice_id.map(|id| tx.invoice(id)).transpose()?;

        let change = ledger.reassign(target.as_ref());

        if let Some(demoted) = &change.demote {
            if let Err(err) = tx.save_invoice(demoted) {
                warn!(
                    %plan_id,
                    invoice_id = %demoted.id_typed(),
                    error = %err,
                    "could not demote previous current invoice; continuing"
                );
            }
        }
        if let Some(promoted) = &change.promote {
            tx.save_invoice(promoted)?;
        }

        let current = change.promote;
        tx.commit()?;

        debug!(
            %plan_id,
            current = ?current.as_ref().map(Invoice::id_typed),
            "current invoice reassigned"
        );
        Ok(current)
    }

    pub fn current_invoice(&self, plan_id: PlanId) -> ServiceResult<Option<Invoice>> {
        let tx = self.store.begin()?;
        Ok(self.ledger(&*tx, plan_id)?.current().cloned())
    }

    /// True when any invoice of the plan is pending or overdue.
    pub fn pending_payment(&self, plan_id: PlanId) -> ServiceResult<bool> {
        let tx = self.store.begin()?;
        Ok(self.ledger(&*tx, plan_id)?.has_pending_payment())
    }

    /// Store a billing period for the plan. It is never made current here:
    /// whatever flag the caller's copy carries, the row is written non-current.
    pub fn record_invoice(&self, plan_id: PlanId, invoice: Invoice) -> ServiceResult<Invoice> {
        let mut tx = self.store.begin()?;
        tx.plan(plan_id)?;

        let mut invoice = invoice.for_plan(plan_id).demoted();
        match tx.invoice(invoice.id_typed()) {
            Ok(stored) if stored.is_current() => {
                return Err(ServiceError::InvariantViolation(format!(
                    "invoice {} is current; reassign it through set_current_invoice",
                    stored.id_typed()
                )));
            }
            Ok(stored) => invoice.record_settlement(stored.settlement()),
            Err(StoreError::NotFound { .. }) => {}
            Err(err) => return Err(err.into()),
        }

        tx.save_invoice(&invoice)?;
        tx.commit()?;
        Ok(invoice)
    }

    /// Record a settlement fact reported by the billing collaborator.
    pub fn record_settlement(
        &self,
        invoice_id: InvoiceId,
        settlement: SettlementState,
    ) -> ServiceResult<Invoice> {
        let mut tx = self.store.begin()?;
        let mut invoice = tx.invoice(invoice_id)?;
        invoice.record_settlement(settlement);
        tx.save_invoice(&invoice)?;
        tx.commit()?;
        Ok(invoice)
    }

    /// Capture the plan's billable and persist the snapshot on the plan row.
    ///
    /// The snapshot is fully built before the single plan write, so a failed
    /// write leaves the previous `billable_audit` untouched.
    pub fn audit_billable(&self, plan_id: PlanId) -> ServiceResult<Plan> {
        let mut tx = self.store.begin()?;
        let mut plan = tx.plan(plan_id)?;
        let expected = ExpectedVersion::Exact(plan.version());

        let reference = plan
            .billable()
            .ok_or_else(|| ServiceError::Validation(format!("plan {plan_id} has no billable")))?;
        let billable = tx.billable(reference)?;
        let audit = BillableAudit::capture(&billable, Utc::now())?;

        let cmd = PlanCommand::RecordBillableAudit(RecordBillableAudit { plan_id, audit });
        let events = execute(&mut plan, &cmd)?;

        tx.save_plan(&mut plan, expected)?;
        tx.commit()?;

        info!(%plan_id, billable = reference.kind.type_name(), "billable audited");
        self.publish(&plan, &events);
        Ok(plan)
    }

    /// Plans with the given state, for admin follow-up.
    pub fn plans_in_state(&self, state: PlanState) -> ServiceResult<Vec<Plan>> {
        let tx = self.store.begin()?;
        Ok(tx.plans_in_state(state)?)
    }

    pub fn blocked_plans(&self) -> ServiceResult<Vec<Plan>> {
        self.plans_in_state(PlanState::Blocked)
    }

    /// Loads the plan first so an unknown id is `NotFound`.
    fn ledger(&self, tx: &dyn BillingTransaction, plan_id: PlanId) -> ServiceResult<InvoiceLedger> {
        tx.plan(plan_id)?;
        Ok(InvoiceLedger::new(plan_id, tx.invoices_for_plan(plan_id)?))
    }

    /// Publish committed events. The state change already stands, so
    /// failures are only logged.
    fn publish(&self, plan: &Plan, events: &[PlanEvent]) {
        for event in events {
            let envelope = match EventEnvelope::from_typed(
                plan.id_typed().0,
                PLAN_AGGREGATE_TYPE,
                plan.version(),
                event,
            ) {
                Ok(envelope) => envelope,
                Err(err) => {
                    warn!(plan_id = %plan.id_typed(), error = %err, "could not encode plan event");
                    continue;
                }
            };

            if let Err(err) = self.bus.publish(envelope) {
                warn!(plan_id = %plan.id_typed(), error = ?err, "could not publish plan event");
            }
        }
    }
}
