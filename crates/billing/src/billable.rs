//! Billable entities: what a plan charges for.
//!
//! A plan points at its billable through a `(kind, id)` pair. Each kind knows
//! how to project itself for audit snapshots; aggregator kinds (environments)
//! include nested collections, the others only their scalar attributes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use eduplan_core::{EntityId, ValueObject};

/// Billable identifier (course or environment id).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BillableId(pub EntityId);

impl BillableId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for BillableId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BillableKind {
    Course,
    Environment,
}

impl BillableKind {
    pub fn type_name(self) -> &'static str {
        match self {
            BillableKind::Course => "Course",
            BillableKind::Environment => "Environment",
        }
    }

    /// Aggregator kinds carry nested collections in their audit projection.
    pub fn is_aggregator(self) -> bool {
        matches!(self, BillableKind::Environment)
    }
}

/// Polymorphic `(kind, id)` reference from a plan to its billable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BillableRef {
    pub kind: BillableKind,
    pub id: BillableId,
}

impl ValueObject for BillableRef {}

impl BillableRef {
    pub fn new(kind: BillableKind, id: BillableId) -> Self {
        Self { kind, id }
    }
}

/// Capability shared by everything a plan can bill for.
pub trait Billable {
    fn billable_ref(&self) -> BillableRef;

    /// Point-in-time projection of the entity's attributes for auditing.
    fn serialize_projection(&self) -> Result<JsonValue, serde_json::Error>;
}

/// A course sold on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: BillableId,
    pub name: String,
    pub path: String,
    pub environment_id: Option<BillableId>,
    /// Expected workload in hours.
    pub workload: Option<u32>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

impl Billable for Course {
    fn billable_ref(&self) -> BillableRef {
        BillableRef::new(BillableKind::Course, self.id)
    }

    fn serialize_projection(&self) -> Result<JsonValue, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Partner company billed for an environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerEnvironmentAssociation {
    pub company_name: String,
    pub cnpj: String,
    pub address: Option<String>,
}

/// An organization's environment: groups courses under one bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub id: BillableId,
    pub name: String,
    pub path: String,
    pub initials: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub courses: Vec<Course>,
    #[serde(skip)]
    pub partner_environment_association: Option<PartnerEnvironmentAssociation>,
}

impl Billable for Environment {
    fn billable_ref(&self) -> BillableRef {
        BillableRef::new(BillableKind::Environment, self.id)
    }

    fn serialize_projection(&self) -> Result<JsonValue, serde_json::Error> {
        let mut projection = serde_json::to_value(self)?;
        if let JsonValue::Object(map) = &mut projection {
            let courses = self
                .courses
                .iter()
                .map(Billable::serialize_projection)
                .collect::<Result<Vec<_>, _>>()?;
            map.insert("courses".to_string(), JsonValue::Array(courses));
            map.insert(
                "partner_environment_association".to_string(),
                serde_json::to_value(&self.partner_environment_association)?,
            );
        }
        Ok(projection)
    }
}

/// Tagged union over the billable kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillableEntity {
    Course(Course),
    Environment(Environment),
}

impl Billable for BillableEntity {
    fn billable_ref(&self) -> BillableRef {
        match self {
            BillableEntity::Course(c) => c.billable_ref(),
            BillableEntity::Environment(e) => e.billable_ref(),
        }
    }

    fn serialize_projection(&self) -> Result<JsonValue, serde_json::Error> {
        match self {
            BillableEntity::Course(c) => c.serialize_projection(),
            BillableEntity::Environment(e) => e.serialize_projection(),
        }
    }
}

impl From<Course> for BillableEntity {
    fn from(value: Course) -> Self {
        BillableEntity::Course(value)
    }
}

impl From<Environment> for BillableEntity {
    fn from(value: Environment) -> Self {
        BillableEntity::Environment(value)
    }
}
