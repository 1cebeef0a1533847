//! Directory records owned by collaborators outside this subsystem
//!
//! Clients and team profiles are read, never written, by provisioning.

use crate::ids::{ClientId, ProfileId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Client of the agency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub company: Option<String>,
}

/// Team or client profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: ProfileId,
    pub full_name: String,
    pub role: Role,
}

/// Caller role as recorded in the profile directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    TeamMember,
    Client,
}

impl Role {
    /// Wire name of the role
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::TeamMember => "team_member",
            Role::Client => "client",
        }
    }

    /// Agency staff; the only roles that may provision projects
    #[inline]
    #[must_use]
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::TeamMember)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "team_member" => Ok(Role::TeamMember),
            "client" => Ok(Role::Client),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Opaque caller credential (bearer token)
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token
    #[inline]
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, for directory lookups only
    #[inline]
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Admin, Role::TeamMember, Role::Client] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn only_admin_and_team_member_are_staff() {
        assert!(Role::Admin.is_staff());
        assert!(Role::TeamMember.is_staff());
        assert!(!Role::Client.is_staff());
    }

    #[test]
    fn credential_debug_is_redacted() {
        let cred = Credential::new("super-secret");
        assert!(!format!("{cred:?}").contains("secret"));
        assert_eq!(cred.expose(), "super-secret");
    }
}
