//! Project blueprint submitted by the admin wizard
//!
//! A blueprint is the complete description of one project to provision.
//! It is immutable for the duration of a provisioning run. Fields the
//! wizard may omit carry serde defaults so that structural problems are
//! reported by the validator rather than as opaque decode failures.

use crate::entity::{ProjectStatus, TaskPriority};
use crate::ids::{ClientId, ProfileId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// HTTP request envelope: `{ "wizardData": ProjectBlueprint }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateProjectRequest {
    pub wizard_data: ProjectBlueprint,
}

/// Complete input describing one project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectBlueprint {
    /// Existing client the project is created for
    #[serde(default)]
    pub client_reference: Option<ClientId>,
    #[serde(default)]
    pub project_info: ProjectInfo,
    /// Phases in display order; position becomes `orderIndex`
    #[serde(default)]
    pub phases: Vec<PhaseSpec>,
    #[serde(default)]
    pub team_assignments: Vec<TeamAssignmentSpec>,
    #[serde(default)]
    pub payment_schedule: Vec<PaymentSpec>,
    #[serde(default)]
    pub dashboard_config: DashboardConfigSpec,
}

impl ProjectBlueprint {
    /// Total number of tasks across all phases
    #[inline]
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.phases.iter().map(|p| p.tasks.len()).sum()
    }

    /// Number of assignments flagged as client liaison
    #[inline]
    #[must_use]
    pub fn liaison_count(&self) -> usize {
        self.team_assignments
            .iter()
            .filter(|a| a.is_client_liaison)
            .count()
    }
}

/// Root project attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub total_budget: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for ProjectInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            status: ProjectStatus::default(),
            start_date: None,
            end_date: None,
            total_budget: 0.0,
            currency: default_currency(),
        }
    }
}

/// One phase and the tasks it owns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

impl PhaseSpec {
    /// Create a phase spec with just a name
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// With tasks
    #[inline]
    #[must_use]
    pub fn with_tasks(mut self, tasks: Vec<TaskSpec>) -> Self {
        self.tasks = tasks;
        self
    }

    /// With start/end dates
    #[inline]
    #[must_use]
    pub fn with_dates(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }
}

/// Task inside a phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub estimated_hours: f64,
    #[serde(default)]
    pub priority: TaskPriority,
}

impl TaskSpec {
    /// Create a task spec with a title
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// With estimated hours
    #[inline]
    #[must_use]
    pub fn with_hours(mut self, hours: f64) -> Self {
        self.estimated_hours = hours;
        self
    }
}

/// Team member assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamAssignmentSpec {
    pub profile_reference: ProfileId,
    #[serde(default)]
    pub role: String,
    #[serde(default = "default_allocation")]
    pub allocation_percent: u32,
    #[serde(default)]
    pub is_client_liaison: bool,
}

fn default_allocation() -> u32 {
    100
}

impl TeamAssignmentSpec {
    /// Create an assignment at full allocation
    #[inline]
    #[must_use]
    pub fn new(profile_reference: ProfileId, role: impl Into<String>) -> Self {
        Self {
            profile_reference,
            role: role.into(),
            allocation_percent: default_allocation(),
            is_client_liaison: false,
        }
    }

    /// Mark as the client liaison
    #[inline]
    #[must_use]
    pub fn liaison(mut self) -> Self {
        self.is_client_liaison = true;
        self
    }
}

/// Payment schedule entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    /// Zero-based position of the linked phase in `ProjectBlueprint::phases`
    #[serde(default)]
    pub phase_index: Option<usize>,
}

impl PaymentSpec {
    /// Create a payment spec
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, amount: f64) -> Self {
        Self {
            name: name.into(),
            amount,
            ..Self::default()
        }
    }

    /// Link to a blueprint phase by position
    #[inline]
    #[must_use]
    pub fn for_phase(mut self, index: usize) -> Self {
        self.phase_index = Some(index);
        self
    }
}

/// Client dashboard configuration; every sub-object is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfigSpec {
    #[serde(default)]
    pub widgets: Option<BTreeSet<String>>,
    #[serde(default)]
    pub branding: Option<BrandingSpec>,
    #[serde(default)]
    pub permissions: Option<PermissionsSpec>,
    #[serde(default)]
    pub notifications: Option<NotificationsSpec>,
}

pub use crate::dashboard::{
    Branding as BrandingSpec, Notifications as NotificationsSpec, Permissions as PermissionsSpec,
};

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_wizard_payload() {
        let json = r#"{
            "wizardData": {
                "clientReference": "6f1c2c4e-58a4-4c5e-9f3e-3c1d9b1a7e21",
                "projectInfo": { "name": "Site", "totalBudget": 5000, "currency": "EUR" },
                "phases": [
                    { "name": "Discovery", "tasks": [ { "title": "Kickoff", "estimatedHours": 2 } ] }
                ],
                "teamAssignments": [],
                "paymentSchedule": [ { "name": "Deposit", "amount": 2500, "phaseIndex": 0 } ]
            }
        }"#;

        let request: GenerateProjectRequest = serde_json::from_str(json).unwrap();
        let bp = request.wizard_data;
        assert_eq!(bp.project_info.name, "Site");
        assert_eq!(bp.project_info.currency, "EUR");
        assert_eq!(bp.project_info.status, ProjectStatus::Planning);
        assert_eq!(bp.task_count(), 1);
        assert_eq!(bp.payment_schedule[0].phase_index, Some(0));
        assert_eq!(bp.dashboard_config, DashboardConfigSpec::default());
    }

    #[test]
    fn missing_fields_default_instead_of_failing() {
        let bp: ProjectBlueprint = serde_json::from_str("{}").unwrap();
        assert!(bp.client_reference.is_none());
        assert_eq!(bp.project_info.currency, "USD");
        assert!(bp.phases.is_empty());
    }

    #[test]
    fn liaison_count() {
        let bp = ProjectBlueprint {
            team_assignments: vec![
                TeamAssignmentSpec::new(ProfileId::new(), "pm").liaison(),
                TeamAssignmentSpec::new(ProfileId::new(), "dev"),
            ],
            ..ProjectBlueprint::default()
        };
        assert_eq!(bp.liaison_count(), 1);
    }
}
