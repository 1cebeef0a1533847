//! Provisioning configuration

use crate::audit::DEFAULT_AUDIT_CAPACITY;
use agency_model::{DashboardSettings, ProjectId, Role};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Provisioning pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    /// Base URL of the client dashboard front end, without trailing slash
    pub dashboard_base_url: String,
    /// Roles permitted to provision projects, limited to staff roles
    pub allowed_roles: BTreeSet<Role>,
    /// Upper bound on one saga run in seconds; 0 disables the deadline
    pub run_timeout_secs: u64,
    /// Audit entries kept in memory; older ones only survive in the log sink
    pub audit_capacity: usize,
    /// Baseline for dashboard sub-objects the wizard omits
    pub dashboard_defaults: DashboardSettings,
}

impl ProvisioningConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With dashboard base URL
    #[inline]
    #[must_use]
    pub fn with_dashboard_base_url(mut self, url: impl Into<String>) -> Self {
        self.dashboard_base_url = url.into();
        self
    }

    /// With the set of roles allowed to provision
    #[inline]
    #[must_use]
    pub fn with_allowed_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.allowed_roles = roles.into_iter().collect();
        self
    }

    /// With run timeout
    #[inline]
    #[must_use]
    pub fn with_run_timeout_secs(mut self, secs: u64) -> Self {
        self.run_timeout_secs = secs;
        self
    }

    /// With audit window size
    #[inline]
    #[must_use]
    pub fn with_audit_capacity(mut self, capacity: usize) -> Self {
        self.audit_capacity = capacity;
        self
    }

    /// With dashboard defaults
    #[inline]
    #[must_use]
    pub fn with_dashboard_defaults(mut self, defaults: DashboardSettings) -> Self {
        self.dashboard_defaults = defaults;
        self
    }

    /// Run timeout, `None` when disabled
    #[inline]
    #[must_use]
    pub fn run_timeout(&self) -> Option<Duration> {
        (self.run_timeout_secs > 0).then(|| Duration::from_secs(self.run_timeout_secs))
    }

    /// Client dashboard link for a project
    #[inline]
    #[must_use]
    pub fn dashboard_url(&self, project_id: ProjectId) -> String {
        dashboard_url(&self.dashboard_base_url, project_id)
    }
}

/// `{base}/client-dashboard/{project_id}`
#[must_use]
pub fn dashboard_url(base_url: &str, project_id: ProjectId) -> String {
    format!(
        "{}/client-dashboard/{}",
        base_url.trim_end_matches('/'),
        project_id
    )
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            dashboard_base_url: "http://localhost:3000".to_string(),
            allowed_roles: [Role::Admin, Role::TeamMember].into_iter().collect(),
            run_timeout_secs: 30,
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
            dashboard_defaults: DashboardSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allows_staff_only() {
        let config = ProvisioningConfig::default();
        assert!(config.allowed_roles.contains(&Role::Admin));
        assert!(config.allowed_roles.contains(&Role::TeamMember));
        assert!(!config.allowed_roles.contains(&Role::Client));
    }

    #[test]
    fn dashboard_url_strips_trailing_slash() {
        let id = ProjectId::new();
        let config = ProvisioningConfig::new().with_dashboard_base_url("https://portal.example/");
        assert_eq!(
            config.dashboard_url(id),
            format!("https://portal.example/client-dashboard/{id}")
        );
    }

    #[test]
    fn zero_timeout_disables_deadline() {
        assert_eq!(ProvisioningConfig::new().with_run_timeout_secs(0).run_timeout(), None);
        assert_eq!(
            ProvisioningConfig::new().run_timeout(),
            Some(Duration::from_secs(30))
        );
    }
}
