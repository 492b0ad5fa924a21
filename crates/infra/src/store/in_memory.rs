use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use eduplan_billing::{
    Billable, BillableEntity, BillableRef, Invoice, InvoiceId, Plan, PlanId, PlanState,
};
use eduplan_core::{AggregateRoot, ExpectedVersion};

use super::r#trait::{BillingStore, BillingTransaction, StoreError};

#[derive(Debug, Default, Clone)]
struct Tables {
    plans: HashMap<PlanId, Plan>,
    invoices: HashMap<InvoiceId, Invoice>,
    billables: HashMap<BillableRef, BillableEntity>,
}

/// Rows whose writes are refused, to exercise failure paths.
#[derive(Debug, Default, Clone)]
struct Faults {
    plans: HashSet<PlanId>,
    invoices: HashSet<InvoiceId>,
}

/// In-memory billing store.
///
/// Intended for tests/dev. Transactions are fully serialized: `begin` holds
/// the table lock until the transaction commits or is dropped, and works on a
/// private copy that replaces the tables on commit.
#[derive(Debug, Default)]
pub struct InMemoryBillingStore {
    tables: Mutex<Tables>,
    faults: Mutex<Faults>,
}

impl InMemoryBillingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a billable (courses and environments are owned elsewhere).
    pub fn insert_billable(&self, billable: impl Into<BillableEntity>) -> Result<BillableRef, StoreError> {
        let billable = billable.into();
        let reference = billable.billable_ref();
        self.tables
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .billables
            .insert(reference, billable);
        Ok(reference)
    }

    /// Refuse every later write to this plan row.
    pub fn reject_plan_writes(&self, id: PlanId) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.plans.insert(id);
        }
    }

    /// Refuse every later write to this invoice row.
    pub fn reject_invoice_writes(&self, id: InvoiceId) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.invoices.insert(id);
        }
    }

    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            *faults = Faults::default();
        }
    }
}

impl BillingStore for InMemoryBillingStore {
    fn begin(&self) -> Result<Box<dyn BillingTransaction + '_>, StoreError> {
        let faults = self.faults.lock().map_err(|_| StoreError::Poisoned)?.clone();
        let committed = self.tables.lock().map_err(|_| StoreError::Poisoned)?;
        let working = committed.clone();

        Ok(Box::new(InMemoryTransaction {
            committed,
            working,
            faults,
        }))
    }
}

struct InMemoryTransaction<'a> {
    committed: MutexGuard<'a, Tables>,
    working: Tables,
    faults: Faults,
}

impl BillingTransaction for InMemoryTransaction<'_> {
    fn plan(&self, id: PlanId) -> Result<Plan, StoreError> {
        self.working
            .plans
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("plan", id))
    }

    fn save_plan(&mut self, plan: &mut Plan, expected: ExpectedVersion) -> Result<(), StoreError> {
        let id = plan.id_typed();
        if self.faults.plans.contains(&id) {
            return Err(StoreError::Rejected(format!("plan {id} is read-only")));
        }

        let stored = self.working.plans.get(&id).map(|p| p.version());
        expected
            .check(stored)
            .map_err(|e| StoreError::Concurrency(e.to_string()))?;

        plan.mark_persisted(stored.map_or(1, |v| v + 1));
        self.working.plans.insert(id, plan.clone());
        Ok(())
    }

    fn plans_in_state(&self, state: PlanState) -> Result<Vec<Plan>, StoreError> {
        let mut plans: Vec<Plan> = self
            .working
            .plans
            .values()
            .filter(|plan| plan.state() == state)
            .cloned()
            .collect();
        plans.sort_by_key(Plan::id_typed);
        Ok(plans)
    }

    fn invoice(&self, id: InvoiceId) -> Result<Invoice, StoreError> {
        self.working
            .invoices
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("invoice", id))
    }

    fn invoices_for_plan(&self, plan_id: PlanId) -> Result<Vec<Invoice>, StoreError> {
        let mut invoices: Vec<Invoice> = self
            .working
            .invoices
            .values()
            .filter(|inv| inv.belongs_to(plan_id))
            .cloned()
            .collect();
        invoices.sort_by_key(|inv| (inv.period_start(), inv.id_typed()));
        Ok(invoices)
    }

    fn save_invoice(&mut self, invoice: &Invoice) -> Result<(), StoreError> {
        let id = invoice.id_typed();
        if self.faults.invoices.contains(&id) {
            return Err(StoreError::Rejected(format!("invoice {id} is read-only")));
        }
        if let Some(plan_id) = invoice.plan_id() {
            if !self.working.plans.contains_key(&plan_id) {
                return Err(StoreError::Rejected(format!(
                    "invoice {id} references unknown plan {plan_id}"
                )));
            }
        }

        self.working.invoices.insert(id, invoice.clone());
        Ok(())
    }

    fn billable(&self, reference: BillableRef) -> Result<BillableEntity, StoreError> {
        self.working
            .billables
            .get(&reference)
            .cloned()
            .ok_or_else(|| StoreError::not_found(reference.kind.type_name(), reference.id))
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryTransaction {
            mut committed,
            working,
            ..
        } = *self;
        *committed = working;
        Ok(())
    }
}
