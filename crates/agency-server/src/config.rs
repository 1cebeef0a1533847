//! Server configuration loaded from TOML
//!
//! ```toml
//! bind = "127.0.0.1:8080"
//!
//! [provisioning]
//! dashboard_base_url = "https://portal.example.com"
//! run_timeout_secs = 30
//!
//! [[seed.clients]]
//! id = "6f0e4c1a-3f55-4d5e-9a43-0b8c4f0e2d11"
//! name = "Acme Corp"
//!
//! [[seed.profiles]]
//! full_name = "Alice Admin"
//! role = "admin"
//! token = "dev-admin-token"
//! ```

use agency_model::{Client, Profile, ProfileId, Role};
use agency_provision::ProvisioningConfig;
use agency_store::InMemoryDirectory;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub provisioning: ProvisioningConfig,
    pub seed: SeedData,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            provisioning: ProvisioningConfig::default(),
            seed: SeedData::default(),
        }
    }
}

impl ServerConfig {
    /// Load from a TOML file
    ///
    /// # Errors
    /// `ConfigError` when the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// `ConfigError::Parse` on malformed TOML or unknown values
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

/// Directory records preloaded into the in-memory directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub clients: Vec<Client>,
    pub profiles: Vec<SeedProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedProfile {
    #[serde(default)]
    pub id: Option<ProfileId>,
    pub full_name: String,
    pub role: Role,
    /// Bearer token that authenticates as this profile
    #[serde(default)]
    pub token: Option<String>,
}

impl SeedData {
    /// Build the directory these records describe
    #[must_use]
    pub fn directory(&self) -> InMemoryDirectory {
        let directory = InMemoryDirectory::new();
        for client in &self.clients {
            directory.add_client(client.clone());
        }
        for seed in &self.profiles {
            let profile = Profile {
                id: seed.id.unwrap_or_default(),
                full_name: seed.full_name.clone(),
                role: seed.role,
            };
            match &seed.token {
                Some(token) => directory.add_session(token.clone(), profile),
                None => directory.add_profile(profile),
            }
        }
        directory
    }
}
