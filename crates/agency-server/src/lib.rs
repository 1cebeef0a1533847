//! Agency Server - HTTP front end for project provisioning
//!
//! Wires an in-memory store and a seeded directory into a
//! [`Provisioner`](agency_provision::Provisioner) and exposes it over warp.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod http;

pub use config::{ConfigError, SeedData, SeedProfile, ServerConfig};
pub use http::{routes, status_for, AppState};

use agency_provision::Provisioner;
use agency_store::InMemoryStore;
use std::sync::Arc;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

impl AppState {
    /// State backed by an in-memory store and the configured seed data
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let directory = Arc::new(config.seed.directory());
        Self::new(Provisioner::new(
            config.provisioning.clone(),
            store,
            directory,
        ))
    }
}
