use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use eduplan_core::{DomainError, DomainResult, Entity, EntityId};

use crate::plan::PlanId;

/// Invoice identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub EntityId);

impl InvoiceId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Settlement fact recorded on an invoice by the billing collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementState {
    /// Period not yet closed.
    Waiting,
    Pending,
    Overdue,
    Paid,
}

impl SettlementState {
    /// Pending and overdue invoices mean the plan owes money.
    pub fn awaits_payment(self) -> bool {
        matches!(self, SettlementState::Pending | SettlementState::Overdue)
    }
}

/// One billing period of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    id: InvoiceId,
    plan_id: Option<PlanId>,
    period_start: NaiveDate,
    period_end: NaiveDate,
    amount: Decimal,
    current: bool,
    settlement: SettlementState,
}

impl Invoice {
    /// New, unbound, non-current invoice in `waiting` settlement.
    pub fn new(
        id: InvoiceId,
        period_start: NaiveDate,
        period_end: NaiveDate,
        amount: Decimal,
    ) -> DomainResult<Self> {
        if period_end < period_start {
            return Err(DomainError::validation(
                "invoice period_end must not precede period_start",
            ));
        }
        if amount < Decimal::ZERO {
            return Err(DomainError::validation("invoice amount must not be negative"));
        }

        Ok(Self {
            id,
            plan_id: None,
            period_start,
            period_end,
            amount,
            current: false,
            settlement: SettlementState::Waiting,
        })
    }

    /// Attach to a plan without making it current.
    pub fn for_plan(mut self, plan_id: PlanId) -> Self {
        self.plan_id = Some(plan_id);
        self
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn plan_id(&self) -> Option<PlanId> {
        self.plan_id
    }

    pub fn period_start(&self) -> NaiveDate {
        self.period_start
    }

    pub fn period_end(&self) -> NaiveDate {
        self.period_end
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn is_current(&self) -> bool {
        self.current
    }

    pub fn settlement(&self) -> SettlementState {
        self.settlement
    }

    pub fn belongs_to(&self, plan_id: PlanId) -> bool {
        self.plan_id == Some(plan_id)
    }

    pub fn record_settlement(&mut self, settlement: SettlementState) {
        self.settlement = settlement;
    }

    /// Copy with the `current` flag cleared.
    pub fn demoted(&self) -> Self {
        Self {
            current: false,
            ..self.clone()
        }
    }

    pub(crate) fn promoted_for(&self, plan_id: PlanId) -> Self {
        Self {
            current: true,
            plan_id: Some(plan_id),
            ..self.clone()
        }
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn new_invoice_is_unbound_and_not_current() {
        let inv = Invoice::new(
            InvoiceId::new(EntityId::new()),
            today(),
            today() + chrono::Days::new(15),
            dec!(150.25),
        )
        .unwrap();

        assert!(!inv.is_current());
        assert_eq!(inv.plan_id(), None);
        assert_eq!(inv.settlement(), SettlementState::Waiting);
    }

    #[test]
    fn inverted_period_is_rejected() {
        let err = Invoice::new(
            InvoiceId::new(EntityId::new()),
            today(),
            today() - chrono::Days::new(1),
            dec!(10),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn negative_amount_is_rejected() {
        let err = Invoice::new(InvoiceId::new(EntityId::new()), today(), today(), dec!(-0.01))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn only_pending_and_overdue_await_payment() {
        assert!(SettlementState::Pending.awaits_payment());
        assert!(SettlementState::Overdue.awaits_payment());
        assert!(!SettlementState::Waiting.awaits_payment());
        assert!(!SettlementState::Paid.awaits_payment());
    }
}
