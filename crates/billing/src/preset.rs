//! Plan variants and their preset attribute templates.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use eduplan_core::{AggregateId, ValueObject};

use crate::plan::{Plan, PlanId};

/// Concrete plan variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanKind {
    /// Fixed package of members and storage.
    Package,
    /// Charged per licensed member.
    Licensed,
}

impl PlanKind {
    /// Variant used when a requested variant name is unknown.
    pub const DEFAULT: PlanKind = PlanKind::Package;

    /// Key every variant's table must contain.
    pub const FALLBACK_PRESET: &'static str = "free";

    pub fn type_name(self) -> &'static str {
        match self {
            PlanKind::Package => "PackagePlan",
            PlanKind::Licensed => "LicensedPlan",
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "PackagePlan" => Some(PlanKind::Package),
            "LicensedPlan" => Some(PlanKind::Licensed),
            _ => None,
        }
    }

    /// Like `from_type_name`, but unknown names silently become `DEFAULT`.
    pub fn resolve(name: &str) -> Self {
        Self::from_type_name(name).unwrap_or(Self::DEFAULT)
    }

    fn presets(self) -> &'static [(&'static str, PlanTemplate)] {
        match self {
            PlanKind::Package => PACKAGE_PRESETS,
            PlanKind::Licensed => LICENSED_PRESETS,
        }
    }

    pub fn preset_keys(self) -> impl Iterator<Item = &'static str> {
        self.presets().iter().map(|(key, _)| *key)
    }

    pub fn template(self, key: &str) -> Option<&'static PlanTemplate> {
        self.presets()
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, t)| t)
    }

    /// Template for `key`, or the `free` template when `key` is absent.
    pub fn template_or_free(self, key: &str) -> &'static PlanTemplate {
        self.template(key).unwrap_or_else(|| self.free_template())
    }

    fn free_template(self) -> &'static PlanTemplate {
        // Every table starts with its `free` row.
        &self.presets()[0].1
    }
}

/// Usage limits granted by a plan. `None` means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub members_limit: Option<u32>,
    pub file_storage_limit_mb: Option<u64>,
    pub video_storage_limit_mb: Option<u64>,
}

/// Named set of default attributes for a new plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanTemplate {
    pub name: &'static str,
    pub price: Decimal,
    pub yearly_price: Decimal,
    pub limits: PlanLimits,
}

impl ValueObject for PlanTemplate {}

const PACKAGE_PRESETS: &[(&str, PlanTemplate)] = &[
    (
        "free",
        PlanTemplate {
            name: "Free",
            price: dec!(0),
            yearly_price: dec!(0),
            limits: PlanLimits {
                members_limit: Some(20),
                file_storage_limit_mb: Some(100),
                video_storage_limit_mb: Some(0),
            },
        },
    ),
    (
        "professor_lite",
        PlanTemplate {
            name: "Professor Lite",
            price: dec!(13.99),
            yearly_price: dec!(139.90),
            limits: PlanLimits {
                members_limit: Some(30),
                file_storage_limit_mb: Some(512),
                video_storage_limit_mb: Some(1024),
            },
        },
    ),
    (
        "professor_standard",
        PlanTemplate {
            name: "Professor Standard",
            price: dec!(29.99),
            yearly_price: dec!(299.90),
            limits: PlanLimits {
                members_limit: Some(60),
                file_storage_limit_mb: Some(1024),
                video_storage_limit_mb: Some(2048),
            },
        },
    ),
    (
        "professor_plus",
        PlanTemplate {
            name: "Professor Plus",
            price: dec!(49.99),
            yearly_price: dec!(499.90),
            limits: PlanLimits {
                members_limit: Some(120),
                file_storage_limit_mb: Some(2048),
                video_storage_limit_mb: Some(5120),
            },
        },
    ),
];

const LICENSED_PRESETS: &[(&str, PlanTemplate)] = &[
    (
        "free",
        PlanTemplate {
            name: "Free",
            price: dec!(0),
            yearly_price: dec!(0),
            limits: PlanLimits {
                members_limit: Some(10),
                file_storage_limit_mb: Some(100),
                video_storage_limit_mb: Some(0),
            },
        },
    ),
    (
        "licensed_basic",
        PlanTemplate {
            name: "Licensed Basic",
            price: dec!(3.00),
            yearly_price: dec!(30.00),
            limits: PlanLimits {
                members_limit: None,
                file_storage_limit_mb: Some(1024),
                video_storage_limit_mb: Some(1024),
            },
        },
    ),
    (
        "licensed_plus",
        PlanTemplate {
            name: "Licensed Plus",
            price: dec!(5.00),
            yearly_price: dec!(50.00),
            limits: PlanLimits {
                members_limit: None,
                file_storage_limit_mb: None,
                video_storage_limit_mb: Some(10240),
            },
        },
    ),
];

/// Build a new, unsaved plan of variant `kind` from the preset `key`.
///
/// Unknown variant names fall back to `PackagePlan`; unknown keys fall back to
/// the variant's `free` preset. Neither fallback is an error.
pub fn from_preset(key: &str, kind: &str) -> Plan {
    let kind = PlanKind::resolve(kind);
    let template = kind.template_or_free(key);
    Plan::from_template(PlanId::new(AggregateId::new()), kind, template)
}
