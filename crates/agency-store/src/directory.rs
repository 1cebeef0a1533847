//! Read-only collaborators: client directory, profile directory, role lookup

use crate::error::StoreError;
use agency_model::{Client, ClientId, Credential, Profile, ProfileId, Role};
use async_trait::async_trait;
use dashmap::DashMap;

/// Client records
#[async_trait]
pub trait ClientDirectory: Send + Sync {
    async fn get_client(&self, id: ClientId) -> Result<Option<Client>, StoreError>;
}

/// Team and client profiles
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn get_profile(&self, id: ProfileId) -> Result<Option<Profile>, StoreError>;
}

/// Privileged credential-to-role lookup.
///
/// Implementations must resolve the role server-side; a role claimed by
/// the caller is never trusted.
#[async_trait]
pub trait RoleResolver: Send + Sync {
    async fn resolve_role(&self, credential: &Credential) -> Result<Role, StoreError>;
}

/// Directory backed by process memory
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    clients: DashMap<ClientId, Client>,
    profiles: DashMap<ProfileId, Profile>,
    sessions: DashMap<String, ProfileId>,
}

impl InMemoryDirectory {
    /// Create an empty directory
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client
    pub fn add_client(&self, client: Client) {
        self.clients.insert(client.id, client);
    }

    /// Register a profile without a session
    pub fn add_profile(&self, profile: Profile) {
        self.profiles.insert(profile.id, profile);
    }

    /// Register a profile reachable through a bearer token
    pub fn add_session(&self, token: impl Into<String>, profile: Profile) {
        self.sessions.insert(token.into(), profile.id);
        self.add_profile(profile);
    }

    /// Builder-style [`Self::add_client`]
    #[must_use]
    pub fn with_client(self, client: Client) -> Self {
        self.add_client(client);
        self
    }

    /// Builder-style [`Self::add_session`]
    #[must_use]
    pub fn with_session(self, token: impl Into<String>, profile: Profile) -> Self {
        self.add_session(token, profile);
        self
    }

    /// Builder-style [`Self::add_profile`]
    #[must_use]
    pub fn with_profile(self, profile: Profile) -> Self {
        self.add_profile(profile);
        self
    }
}

#[async_trait]
impl ClientDirectory for InMemoryDirectory {
    async fn get_client(&self, id: ClientId) -> Result<Option<Client>, StoreError> {
        Ok(self.clients.get(&id).map(|c| c.clone()))
    }
}

#[async_trait]
impl ProfileDirectory for InMemoryDirectory {
    async fn get_profile(&self, id: ProfileId) -> Result<Option<Profile>, StoreError> {
        Ok(self.profiles.get(&id).map(|p| p.clone()))
    }
}

#[async_trait]
impl RoleResolver for InMemoryDirectory {
    async fn resolve_role(&self, credential: &Credential) -> Result<Role, StoreError> {
        let profile_id = self
            .sessions
            .get(credential.expose())
            .map(|id| *id)
            .ok_or(StoreError::UnknownCredential)?;
        self.profiles
            .get(&profile_id)
            .map(|p| p.role)
            .ok_or_else(|| StoreError::Directory(format!("profile {profile_id} missing")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(role: Role) -> Profile {
        Profile {
            id: ProfileId::new(),
            full_name: "Ada Lovelace".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn resolves_role_from_session() {
        let dir = InMemoryDirectory::new().with_session("tok-admin", profile(Role::Admin));
        let role = dir.resolve_role(&Credential::new("tok-admin")).await.unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[tokio::test]
    async fn unknown_token_is_an_error() {
        let dir = InMemoryDirectory::new();
        let err = dir.resolve_role(&Credential::new("nope")).await.unwrap_err();
        assert_eq!(err, StoreError::UnknownCredential);
    }

    #[tokio::test]
    async fn client_lookup() {
        let client = Client {
            id: ClientId::new(),
            name: "Jane".to_string(),
            company: Some("Acme".to_string()),
        };
        let dir = InMemoryDirectory::new().with_client(client.clone());
        assert_eq!(dir.get_client(client.id).await.unwrap(), Some(client));
        assert_eq!(dir.get_client(ClientId::new()).await.unwrap(), None);
    }
}
