//! The invoices of one plan and the "current invoice" invariant.
//!
//! At most one invoice of a plan is current. The ledger never writes anything
//! itself: `reassign` computes the demotion/promotion pair and the caller
//! persists both inside one transaction.

use crate::invoice::{Invoice, InvoiceId};
use crate::plan::PlanId;

/// Writes needed to move the "current" flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentInvoiceChange {
    /// Previous current invoice with `current = false`. Best-effort write.
    pub demote: Option<Invoice>,
    /// New current invoice, bound to the plan. Must be written.
    pub promote: Option<Invoice>,
}

impl CurrentInvoiceChange {
    pub fn is_noop(&self) -> bool {
        self.demote.is_none() && self.promote.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceLedger {
    plan_id: PlanId,
    invoices: Vec<Invoice>,
}

impl InvoiceLedger {
    /// Build from the plan's invoices; invoices of other plans are ignored.
    pub fn new(plan_id: PlanId, invoices: impl IntoIterator<Item = Invoice>) -> Self {
        let invoices = invoices
            .into_iter()
            .filter(|inv| inv.belongs_to(plan_id))
            .collect();
        Self { plan_id, invoices }
    }

    pub fn plan_id(&self) -> PlanId {
        self.plan_id
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    pub fn get(&self, id: InvoiceId) -> Option<&Invoice> {
        self.invoices.iter().find(|inv| inv.id_typed() == id)
    }

    /// The current invoice. Uniqueness is guaranteed by `reassign`, not
    /// re-checked here.
    pub fn current(&self) -> Option<&Invoice> {
        self.invoices.iter().find(|inv| inv.is_current())
    }

    pub fn has_pending_payment(&self) -> bool {
        self.invoices
            .iter()
            .any(|inv| inv.settlement().awaits_payment())
    }

    /// Compute the writes that make `new_current` the plan's current invoice,
    /// or leave the plan without one when `None`.
    pub fn reassign(&self, new_current: Option<&Invoice>) -> CurrentInvoiceChange {
        CurrentInvoiceChange {
            demote: self.current().map(Invoice::demoted),
            promote: new_current.map(|inv| inv.promoted_for(self.plan_id)),
        }
    }

    /// Mirror persisted writes into this in-memory view.
    ///
    /// Pass only the writes that actually succeeded.
    pub fn record(&mut self, written: &Invoice) {
        if !written.belongs_to(self.plan_id) {
            self.invoices.retain(|inv| inv.id_typed() != written.id_typed());
            return;
        }
        match self
            .invoices
            .iter_mut()
            .find(|inv| inv.id_typed() == written.id_typed())
        {
            Some(slot) => *slot = written.clone(),
            None => self.invoices.push(written.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::SettlementState;
    use chrono::NaiveDate;
    use eduplan_core::{AggregateId, EntityId};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn test_plan_id() -> PlanId {
        PlanId::new(AggregateId::new())
    }

    fn invoice_for(plan_id: PlanId) -> Invoice {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Invoice::new(
            InvoiceId::new(EntityId::new()),
            start,
            start + chrono::Days::new(15),
            dec!(150.25),
        )
        .unwrap()
        .for_plan(plan_id)
    }

    fn apply(ledger: &mut InvoiceLedger, change: &CurrentInvoiceChange) {
        if let Some(d) = &change.demote {
            ledger.record(d);
        }
        if let Some(p) = &change.promote {
            ledger.record(p);
        }
    }

    #[test]
    fn reassign_demotes_previous_and_promotes_new() {
        let plan_id = test_plan_id();
        let a = invoice_for(plan_id);
        let b = invoice_for(plan_id);
        let mut ledger = InvoiceLedger::new(plan_id, vec![a.clone(), b.clone()]);

        let change = ledger.reassign(Some(&a));
        apply(&mut ledger, &change);
        assert_eq!(ledger.current().map(Invoice::id_typed), Some(a.id_typed()));

        let change = ledger.reassign(Some(&b));
        assert_eq!(change.demote.as_ref().map(Invoice::id_typed), Some(a.id_typed()));
        assert!(!change.demote.as_ref().unwrap().is_current());
        assert!(change.promote.as_ref().unwrap().is_current());

        apply(&mut ledger, &change);
        assert!(!ledger.get(a.id_typed()).unwrap().is_current());
        assert_eq!(ledger.current().map(Invoice::id_typed), Some(b.id_typed()));
    }

    #[test]
    fn reassign_to_none_leaves_no_current_invoice() {
        let plan_id = test_plan_id();
        let a = invoice_for(plan_id);
        let mut ledger = InvoiceLedger::new(plan_id, vec![a.clone()]);
        let change = ledger.reassign(Some(&a));
        apply(&mut ledger, &change);

        let change = ledger.reassign(None);
        assert!(change.promote.is_none());
        apply(&mut ledger, &change);

        assert!(ledger.current().is_none());
        assert!(!ledger.get(a.id_typed()).unwrap().is_current());
    }

    #[test]
    fn promoting_a_foreign_invoice_binds_it_to_the_plan() {
        let plan_id = test_plan_id();
        let foreign = invoice_for(test_plan_id());
        let mut ledger = InvoiceLedger::new(plan_id, Vec::new());

        let change = ledger.reassign(Some(&foreign));
        assert_eq!(change.promote.as_ref().unwrap().plan_id(), Some(plan_id));
        apply(&mut ledger, &change);

        assert_eq!(ledger.invoices().len(), 1);
        assert_eq!(
            ledger.current().map(Invoice::id_typed),
            Some(foreign.id_typed())
        );
    }

    #[test]
    fn reassign_on_empty_ledger_to_none_is_noop() {
        let ledger = InvoiceLedger::new(test_plan_id(), Vec::new());
        assert!(ledger.reassign(None).is_noop());
    }

    #[test]
    fn pending_payment_requires_pending_or_overdue_invoice() {
        let plan_id = test_plan_id();
        assert!(!InvoiceLedger::new(plan_id, Vec::new()).has_pending_payment());

        let mut paid = invoice_for(plan_id);
        paid.record_settlement(SettlementState::Paid);
        let mut ledger = InvoiceLedger::new(plan_id, vec![paid]);
        assert!(!ledger.has_pending_payment());

        let mut overdue = invoice_for(plan_id);
        overdue.record_settlement(SettlementState::Overdue);
        ledger.record(&overdue);
        assert!(ledger.has_pending_payment());
    }

    #[test]
    fn invoices_of_other_plans_are_ignored() {
        let plan_id = test_plan_id();
        let mut other = invoice_for(test_plan_id());
        other.record_settlement(SettlementState::Pending);

        let ledger = InvoiceLedger::new(plan_id, vec![other]);
        assert!(ledger.invoices().is_empty());
        assert!(!ledger.has_pending_payment());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: any sequence of reassignments (including `None`) keeps at
        /// most one current invoice, and it is the last one assigned.
        #[test]
        fn at_most_one_current_invoice(
            picks in prop::collection::vec(prop::option::of(0usize..5), 1..30)
        ) {
            let plan_id = test_plan_id();
            let pool: Vec<Invoice> = (0..5).map(|_| invoice_for(plan_id)).collect();
            let mut ledger = InvoiceLedger::new(plan_id, pool.clone());

            for pick in &picks {
                let target = pick.map(|i| pool[i].clone());
                let change = ledger.reassign(target.as_ref());
                apply(&mut ledger, &change);

                let current: Vec<_> = ledger.invoices().iter().filter(|i| i.is_current()).collect();
                prop_assert!(current.len() <= 1);
                prop_assert_eq!(
                    current.first().map(|i| i.id_typed()),
                    target.map(|t| t.id_typed())
                );
            }
        }
    }
}
