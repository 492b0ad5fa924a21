use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use eduplan_core::{DomainError, DomainResult, ValueObject};

use crate::billable::{Billable, BillableRef};

/// Frozen projection of a billable, kept on the plan for billing disputes.
///
/// Built completely before it is attached to a plan, so a plan never holds a
/// partially serialized snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillableAudit {
    billable: BillableRef,
    captured_at: DateTime<Utc>,
    snapshot: JsonValue,
}

impl ValueObject for BillableAudit {}

impl BillableAudit {
    pub fn capture<B>(billable: &B, captured_at: DateTime<Utc>) -> DomainResult<Self>
    where
        B: Billable + ?Sized,
    {
        let snapshot = billable.serialize_projection().map_err(|e| {
            DomainError::invariant(format!("billable projection failed: {e}"))
        })?;

        Ok(Self {
            billable: billable.billable_ref(),
            captured_at,
            snapshot,
        })
    }

    pub fn billable(&self) -> BillableRef {
        self.billable
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn snapshot(&self) -> &JsonValue {
        &self.snapshot
    }
}
