//! Authorization gate
//!
//! Resolves the caller's role through the privileged [`RoleResolver`] and
//! admits only configured staff roles. Configuration can narrow the staff
//! set but never admit a non-staff role. Runs before anything is written.

use crate::error::{AuthorizationError, ProvisionError};
use agency_model::{Credential, Role};
use agency_store::RoleResolver;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Extract the credential from an `Authorization: Bearer <token>` value
///
/// # Errors
/// `ProvisionError::Authentication` when the header is absent, uses another
/// scheme, or carries an empty token
pub fn bearer_credential(header: Option<&str>) -> Result<Credential, ProvisionError> {
    let value = header
        .ok_or_else(|| ProvisionError::Authentication("missing authorization header".into()))?;
    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or_else(|| ProvisionError::Authentication("malformed authorization header".into()))?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ProvisionError::Authentication(format!(
            "unsupported scheme '{scheme}'"
        )));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(ProvisionError::Authentication("empty bearer token".into()));
    }
    Ok(Credential::new(token))
}

pub struct AuthorizationGate {
    resolver: Arc<dyn RoleResolver>,
    allowed: BTreeSet<Role>,
}

impl fmt::Debug for AuthorizationGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationGate")
            .field("allowed", &self.allowed)
            .finish_non_exhaustive()
    }
}

impl AuthorizationGate {
    /// Non-staff roles in `allowed` are dropped
    #[must_use]
    pub fn new(resolver: Arc<dyn RoleResolver>, allowed: BTreeSet<Role>) -> Self {
        let (allowed, ignored): (BTreeSet<Role>, BTreeSet<Role>) =
            allowed.into_iter().partition(Role::is_staff);
        if !ignored.is_empty() {
            tracing::warn!(?ignored, "non-staff roles cannot be allowed to provision");
        }
        Self { resolver, allowed }
    }

    #[inline]
    #[must_use]
    pub fn allowed_roles(&self) -> &BTreeSet<Role> {
        &self.allowed
    }

    /// Resolve and check the caller's role.
    ///
    /// # Errors
    /// - `LookupFailed` when the resolver errors, including unknown tokens
    /// - `RoleNotPermitted` when the role is outside the allowed set
    pub async fn authorize(&self, credential: &Credential) -> Result<Role, AuthorizationError> {
        let role = self
            .resolver
            .resolve_role(credential)
            .await
            .map_err(AuthorizationError::LookupFailed)?;

        if self.allowed.contains(&role) {
            tracing::debug!(%role, "caller authorized");
            Ok(role)
        } else {
            tracing::warn!(%role, "caller role not permitted to provision");
            Err(AuthorizationError::RoleNotPermitted { role })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agency_store::StoreError;
    use async_trait::async_trait;
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        Resolver {}

        #[async_trait]
        impl RoleResolver for Resolver {
            async fn resolve_role(&self, credential: &Credential) -> Result<Role, StoreError>;
        }
    }

    fn staff() -> BTreeSet<Role> {
        [Role::Admin, Role::TeamMember].into_iter().collect()
    }

    fn resolving(role: Result<Role, StoreError>) -> MockResolver {
        let mut resolver = MockResolver::new();
        resolver
            .expect_resolve_role()
            .with(eq(Credential::new("tok")))
            .times(1)
            .return_once(move |_| role);
        resolver
    }

    fn gate_with(role: Result<Role, StoreError>) -> AuthorizationGate {
        AuthorizationGate::new(Arc::new(resolving(role)), staff())
    }

    #[test]
    fn bearer_parsing() {
        assert_eq!(
            bearer_credential(Some("Bearer abc")).unwrap(),
            Credential::new("abc")
        );
        assert_eq!(
            bearer_credential(Some("bearer  abc ")).unwrap(),
            Credential::new("abc")
        );
        for bad in [None, Some(""), Some("Basic abc"), Some("Bearer "), Some("abc")] {
            assert!(matches!(
                bearer_credential(bad),
                Err(ProvisionError::Authentication(_))
            ));
        }
    }

    #[tokio::test]
    async fn admin_and_team_member_pass() {
        for role in [Role::Admin, Role::TeamMember] {
            let gate = gate_with(Ok(role));
            assert_eq!(gate.authorize(&Credential::new("tok")).await.unwrap(), role);
        }
    }

    #[tokio::test]
    async fn client_is_rejected() {
        let gate = gate_with(Ok(Role::Client));
        let err = gate.authorize(&Credential::new("tok")).await.unwrap_err();
        assert!(matches!(
            err,
            AuthorizationError::RoleNotPermitted { role: Role::Client }
        ));
    }

    #[tokio::test]
    async fn lookup_failure_is_a_denial() {
        let gate = gate_with(Err(StoreError::UnknownCredential));
        let err = gate.authorize(&Credential::new("tok")).await.unwrap_err();
        assert!(matches!(
            err,
            AuthorizationError::LookupFailed(StoreError::UnknownCredential)
        ));
    }

    #[tokio::test]
    async fn configured_client_role_is_still_rejected() {
        let allowed = [Role::Admin, Role::Client].into_iter().collect();
        let gate = AuthorizationGate::new(Arc::new(resolving(Ok(Role::Client))), allowed);

        assert_eq!(gate.allowed_roles(), &BTreeSet::from([Role::Admin]));
        let err = gate.authorize(&Credential::new("tok")).await.unwrap_err();
        assert!(matches!(
            err,
            AuthorizationError::RoleNotPermitted { role: Role::Client }
        ));
    }

    #[tokio::test]
    async fn narrowed_set_rejects_team_member() {
        let allowed = [Role::Admin].into_iter().collect();
        let gate = AuthorizationGate::new(Arc::new(resolving(Ok(Role::TeamMember))), allowed);
        assert!(gate.authorize(&Credential::new("tok")).await.is_err());
    }
}
