//! Testing utilities for the agency provisioning workspace
//!
//! Shared fixtures, seeded directories and a fault-injecting store.

#![allow(missing_docs)]

mod faulty;
mod fixtures;

pub use faulty::FaultyStore;
pub use fixtures::{
    date, minimal_blueprint, scenario_a, scenario_c, seeded_directory, Seeded, ADMIN_TOKEN,
    CLIENT_TOKEN, TEAM_TOKEN,
};
