//! Entity identifiers
//!
//! Every persisted resource gets its own UUID newtype so that a phase id
//! can never be passed where a task id is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier
            #[inline]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Underlying UUID
            #[inline]
            #[must_use]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

entity_id!(
    /// Root project identifier
    ProjectId
);
entity_id!(
    /// Project phase identifier
    PhaseId
);
entity_id!(
    /// Task identifier (tasks belong to phases)
    TaskId
);
entity_id!(
    /// Project member (team assignment) identifier
    MemberId
);
entity_id!(
    /// Payment schedule entry identifier
    PaymentId
);
entity_id!(
    /// Dashboard configuration identifier
    DashboardConfigId
);
entity_id!(
    /// Client identifier, owned by the client directory
    ClientId
);
entity_id!(
    /// Team profile identifier, owned by the profile directory
    ProfileId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn ids_are_unique() {
        assert_ne!(ProjectId::new(), ProjectId::new());
    }

    #[test]
    fn id_display_parses_back() {
        let id = PhaseId::new();
        let parsed = PhaseId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn id_serializes_as_bare_uuid() {
        let id = TaskId(Uuid::nil());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }
}
