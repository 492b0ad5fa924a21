//! Plan lifecycle state machine.
//!
//! | Event    | From             | To       | Entry action        |
//! |----------|------------------|----------|---------------------|
//! | block    | active           | blocked  | send blocked notice |
//! | activate | blocked, active  | active   | -                   |
//! | migrate  | active           | migrated | -                   |
//!
//! `migrated` has no outgoing transitions.

use serde::{Deserialize, Serialize};

use eduplan_core::{DomainError, DomainResult};

/// Plan lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanState {
    Active,
    Blocked,
    Migrated,
}

impl PlanState {
    /// State of every newly constructed plan.
    pub const INITIAL: PlanState = PlanState::Active;

    pub const ALL: [PlanState; 3] = [PlanState::Active, PlanState::Blocked, PlanState::Migrated];

    pub fn as_str(self) -> &'static str {
        match self {
            PlanState::Active => "active",
            PlanState::Blocked => "blocked",
            PlanState::Migrated => "migrated",
        }
    }

    /// Side effect owed when a plan enters this state.
    pub fn entry_action(self) -> Option<EntryAction> {
        match self {
            PlanState::Blocked => Some(EntryAction::SendBlockedNotice),
            PlanState::Active | PlanState::Migrated => None,
        }
    }

    /// Events accepted from this state, in table order.
    pub fn allowed_transitions(self) -> Vec<Transition> {
        TRANSITIONS
            .iter()
            .filter(|rule| rule.from.contains(&self))
            .map(|rule| rule.transition)
            .collect()
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

impl core::fmt::Display for PlanState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle events a caller can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Block,
    Activate,
    Migrate,
}

impl Transition {
    pub const ALL: [Transition; 3] = [Transition::Block, Transition::Activate, Transition::Migrate];

    pub fn as_str(self) -> &'static str {
        match self {
            Transition::Block => "block",
            Transition::Activate => "activate",
            Transition::Migrate => "migrate",
        }
    }

    pub fn rule(self) -> &'static TransitionRule {
        match self {
            Transition::Block => &TRANSITIONS[0],
            Transition::Activate => &TRANSITIONS[1],
            Transition::Migrate => &TRANSITIONS[2],
        }
    }

    /// Resolve the target state for this event fired from `from`.
    pub fn target_from(self, from: PlanState) -> DomainResult<PlanState> {
        let rule = self.rule();
        if rule.from.contains(&from) {
            Ok(rule.to)
        } else {
            Err(DomainError::invalid_transition(self.as_str(), from.as_str()))
        }
    }
}

/// Post-transition side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryAction {
    SendBlockedNotice,
}

/// One row of the transition table.
#[derive(Debug, PartialEq, Eq)]
pub struct TransitionRule {
    pub transition: Transition,
    pub from: &'static [PlanState],
    pub to: PlanState,
}

static TRANSITIONS: [TransitionRule; 3] = [
    TransitionRule {
        transition: Transition::Block,
        from: &[PlanState::Active],
        to: PlanState::Blocked,
    },
    TransitionRule {
        transition: Transition::Activate,
        from: &[PlanState::Blocked, PlanState::Active],
        to: PlanState::Active,
    },
    TransitionRule {
        transition: Transition::Migrate,
        from: &[PlanState::Active],
        to: PlanState::Migrated,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_are_indexed_by_their_transition() {
        for t in Transition::ALL {
            assert_eq!(t.rule().transition, t);
        }
    }

    #[test]
    fn only_migrated_is_terminal() {
        assert!(!PlanState::Active.is_terminal());
        assert!(!PlanState::Blocked.is_terminal());
        assert!(PlanState::Migrated.is_terminal());
    }

    #[test]
    fn blocked_only_accepts_activate() {
        assert_eq!(
            PlanState::Blocked.allowed_transitions(),
            vec![Transition::Activate]
        );
    }

    #[test]
    fn migrate_from_blocked_is_rejected() {
        let err = Transition::Migrate
            .target_from(PlanState::Blocked)
            .unwrap_err();
        assert_eq!(err, DomainError::invalid_transition("migrate", "blocked"));
    }

    #[test]
    fn only_blocked_owes_an_entry_action() {
        assert_eq!(
            PlanState::Blocked.entry_action(),
            Some(EntryAction::SendBlockedNotice)
        );
        assert_eq!(PlanState::Active.entry_action(), None);
        assert_eq!(PlanState::Migrated.entry_action(), None);
    }
}
