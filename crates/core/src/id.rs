//! UUID-backed identifiers. Each kind is its own type so a plan id can never
//! be passed where an invoice or user id is expected.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Fresh time-ordered (v7) id.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {e}", stringify!($name))))
            }
        }
    };
}

uuid_id! {
    /// A platform user: plan owner and recipient of plan notices.
    UserId
}

uuid_id! {
    /// Aggregate roots (plans).
    AggregateId
}

uuid_id! {
    /// Rows that live beside an aggregate: invoices, courses, environments.
    EntityId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_output_parses_back() {
        let id = AggregateId::new();
        assert_eq!(id.to_string().parse::<AggregateId>().unwrap(), id);
    }

    #[test]
    fn parse_error_names_the_id_kind() {
        match "not-a-uuid".parse::<UserId>().unwrap_err() {
            DomainError::InvalidId(msg) => assert!(msg.starts_with("UserId: ")),
            other => panic!("expected InvalidId, got {other:?}"),
        }
    }
}
