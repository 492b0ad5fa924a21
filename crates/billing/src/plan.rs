use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use eduplan_core::{Aggregate, AggregateId, AggregateRoot, DomainError, UserId};
use eduplan_events::Event;

use crate::audit::BillableAudit;
use crate::billable::BillableRef;
use crate::preset::{PlanKind, PlanLimits, PlanTemplate};
use crate::state::{EntryAction, PlanState, Transition};

/// Aggregate type name used in event envelopes.
pub const PLAN_AGGREGATE_TYPE: &str = "billing.plan";

/// Plan identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(pub AggregateId);

impl PlanId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PlanId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: Plan.
///
/// `state` has no setter; it only moves through [`PlanCommand::ChangeState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    id: PlanId,
    kind: PlanKind,
    state: PlanState,
    name: String,
    price: Option<Decimal>,
    yearly_price: Option<Decimal>,
    limits: PlanLimits,
    billable: Option<BillableRef>,
    user_id: Option<UserId>,
    billable_audit: Option<BillableAudit>,
    version: u64,
}

impl Plan {
    /// New, unsaved plan in the initial state.
    pub fn new(id: PlanId, kind: PlanKind, name: impl Into<String>, price: Option<Decimal>) -> Self {
        Self {
            id,
            kind,
            state: PlanState::INITIAL,
            name: name.into(),
            price,
            yearly_price: None,
            limits: PlanLimits::default(),
            billable: None,
            user_id: None,
            billable_audit: None,
            version: 0,
        }
    }

    /// New, unsaved plan carrying a preset template's attributes.
    pub fn from_template(id: PlanId, kind: PlanKind, template: &PlanTemplate) -> Self {
        let mut plan = Self::new(id, kind, template.name, Some(template.price));
        plan.yearly_price = Some(template.yearly_price);
        plan.limits = template.limits;
        plan
    }

    pub fn with_billable(mut self, billable: BillableRef) -> Self {
        self.billable = Some(billable);
        self
    }

    pub fn with_owner(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn id_typed(&self) -> PlanId {
        self.id
    }

    pub fn kind(&self) -> PlanKind {
        self.kind
    }

    pub fn state(&self) -> PlanState {
        self.state
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Option<Decimal> {
        self.price
    }

    pub fn yearly_price(&self) -> Option<Decimal> {
        self.yearly_price
    }

    pub fn limits(&self) -> &PlanLimits {
        &self.limits
    }

    pub fn billable(&self) -> Option<BillableRef> {
        self.billable
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn billable_audit(&self) -> Option<&BillableAudit> {
        self.billable_audit.as_ref()
    }

    pub fn is_blocked(&self) -> bool {
        self.state == PlanState::Blocked
    }

    pub fn is_persisted(&self) -> bool {
        self.version > 0
    }

    /// Record the row version assigned by storage after a successful write.
    pub fn mark_persisted(&mut self, version: u64) {
        self.version = version;
    }

    /// Save-time validation.
    pub fn validate(&self) -> Result<(), DomainError> {
        match self.price {
            None => Err(DomainError::validation("price is required")),
            Some(p) if p <= Decimal::ZERO => {
                Err(DomainError::validation("price must be positive"))
            }
            Some(_) => Ok(()),
        }
    }
}

impl AggregateRoot for Plan {
    type Id = PlanId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: fire a lifecycle event (block, activate, migrate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeState {
    pub plan_id: PlanId,
    pub transition: Transition,
    pub occurred_at: DateTime<Utc>,
}

/// Command: attach a freshly captured billable snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordBillableAudit {
    pub plan_id: PlanId,
    pub audit: BillableAudit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanCommand {
    ChangeState(ChangeState),
    RecordBillableAudit(RecordBillableAudit),
}

/// Event payload shared by every lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChanged {
    pub plan_id: PlanId,
    pub transition: Transition,
    pub from: PlanState,
    pub to: PlanState,
    /// Plan owner, the recipient of any entry notice.
    pub user_id: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BillableAudited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillableAudited {
    pub plan_id: PlanId,
    pub audit: BillableAudit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanEvent {
    Blocked(StateChanged),
    Activated(StateChanged),
    Migrated(StateChanged),
    BillableAudited(BillableAudited),
}

impl PlanEvent {
    /// Side effect owed once this event is committed.
    pub fn entry_action(&self) -> Option<EntryAction> {
        match self {
            PlanEvent::Blocked(e) | PlanEvent::Activated(e) | PlanEvent::Migrated(e) => {
                e.to.entry_action()
            }
            PlanEvent::BillableAudited(_) => None,
        }
    }
}

impl Event for PlanEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PlanEvent::Blocked(_) => "billing.plan.blocked",
            PlanEvent::Activated(_) => "billing.plan.activated",
            PlanEvent::Migrated(_) => "billing.plan.migrated",
            PlanEvent::BillableAudited(_) => "billing.plan.billable_audited",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PlanEvent::Blocked(e) | PlanEvent::Activated(e) | PlanEvent::Migrated(e) => {
                e.occurred_at
            }
            PlanEvent::BillableAudited(e) => e.audit.captured_at(),
        }
    }
}

impl Aggregate for Plan {
    type Command = PlanCommand;
    type Event = PlanEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PlanEvent::Blocked(e) | PlanEvent::Activated(e) | PlanEvent::Migrated(e) => {
                self.state = e.to;
            }
            PlanEvent::BillableAudited(e) => {
                self.billable_audit = Some(e.audit.clone());
            }
        }
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            PlanCommand::ChangeState(cmd) => self.handle_change_state(cmd),
            PlanCommand::RecordBillableAudit(cmd) => self.handle_record_audit(cmd),
        }
    }
}

impl Plan {
    fn ensure_plan_id(&self, plan_id: PlanId) -> Result<(), DomainError> {
        if self.id != plan_id {
            return Err(DomainError::invariant("plan_id mismatch"));
        }
        Ok(())
    }

    fn handle_change_state(&self, cmd: &ChangeState) -> Result<Vec<PlanEvent>, DomainError> {
        self.ensure_plan_id(cmd.plan_id)?;

        let to = cmd.transition.target_from(self.state)?;
        let changed = StateChanged {
            plan_id: cmd.plan_id,
            transition: cmd.transition,
            from: self.state,
            to,
            user_id: self.user_id,
            occurred_at: cmd.occurred_at,
        };

        Ok(vec![match cmd.transition {
            Transition::Block => PlanEvent::Blocked(changed),
            Transition::Activate => PlanEvent::Activated(changed),
            Transition::Migrate => PlanEvent::Migrated(changed),
        }])
    }

    fn handle_record_audit(
        &self,
        cmd: &RecordBillableAudit,
    ) -> Result<Vec<PlanEvent>, DomainError> {
        self.ensure_plan_id(cmd.plan_id)?;

        match self.billable {
            None => Err(DomainError::invariant("plan has no billable to audit")),
            Some(b) if b != cmd.audit.billable() => Err(DomainError::invariant(
                "audit snapshot belongs to a different billable",
            )),
            Some(_) => Ok(vec![PlanEvent::BillableAudited(BillableAudited {
                plan_id: cmd.plan_id,
                audit: cmd.audit.clone(),
            })]),
        }
    }
}
