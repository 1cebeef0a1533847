//! Persisted entities
//!
//! Each entity comes with a `New*` insert payload; the store assigns the
//! identifier. Ownership follows foreign references: a [`Project`] owns its
//! phases, members, payment entries and dashboard config; a [`Phase`] owns
//! its tasks.

use crate::dashboard::DashboardSettings;
use crate::ids::{
    ClientId, DashboardConfigId, MemberId, PaymentId, PhaseId, ProfileId, ProjectId, TaskId,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource collections written by provisioning
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Project,
    Phase,
    Task,
    ProjectMember,
    PaymentSchedule,
    DashboardConfig,
}

impl ResourceKind {
    /// All kinds, in creation order
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Project,
        ResourceKind::Phase,
        ResourceKind::Task,
        ResourceKind::ProjectMember,
        ResourceKind::PaymentSchedule,
        ResourceKind::DashboardConfig,
    ];

    /// Collection name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Project => "projects",
            ResourceKind::Phase => "project_phases",
            ResourceKind::Task => "tasks",
            ResourceKind::ProjectMember => "project_members",
            ResourceKind::PaymentSchedule => "payment_schedules",
            ResourceKind::DashboardConfig => "client_dashboard_configs",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Planning,
    Active,
    OnHold,
    Completed,
    Cancelled,
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// Root of the resource graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub client_id: ClientId,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_budget: f64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub client_id: ClientId,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_budget: f64,
    pub currency: String,
}

impl NewProject {
    /// Materialize with a store-assigned id
    #[must_use]
    pub fn into_project(self, id: ProjectId) -> Project {
        Project {
            id,
            client_id: self.client_id,
            name: self.name,
            description: self.description,
            status: self.status,
            start_date: self.start_date,
            end_date: self.end_date,
            total_budget: self.total_budget,
            currency: self.currency,
            created_at: Utc::now(),
        }
    }
}

/// Ordered phase of a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub id: PhaseId,
    pub project_id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Zero-based, unique per project
    pub order_index: u32,
}

impl Phase {
    /// Whole days from start to end, when both dates are known
    #[inline]
    #[must_use]
    pub fn duration_days(&self) -> Option<i64> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some((end - start).num_days()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPhase {
    pub project_id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub order_index: u32,
}

impl NewPhase {
    #[must_use]
    pub fn into_phase(self, id: PhaseId) -> Phase {
        Phase {
            id,
            project_id: self.project_id,
            name: self.name,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            order_index: self.order_index,
        }
    }
}

/// Unit of work inside a phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub phase_id: PhaseId,
    pub title: String,
    pub description: Option<String>,
    pub estimated_hours: f64,
    pub priority: TaskPriority,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub phase_id: PhaseId,
    pub title: String,
    pub description: Option<String>,
    pub estimated_hours: f64,
    pub priority: TaskPriority,
}

impl NewTask {
    #[must_use]
    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            phase_id: self.phase_id,
            title: self.title,
            description: self.description,
            estimated_hours: self.estimated_hours,
            priority: self.priority,
        }
    }
}

/// Team assignment on a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub id: MemberId,
    pub project_id: ProjectId,
    pub profile_id: ProfileId,
    pub role: String,
    pub allocation_percent: u32,
    pub is_client_liaison: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProjectMember {
    pub project_id: ProjectId,
    pub profile_id: ProfileId,
    pub role: String,
    pub allocation_percent: u32,
    pub is_client_liaison: bool,
}

impl NewProjectMember {
    #[must_use]
    pub fn into_member(self, id: MemberId) -> ProjectMember {
        ProjectMember {
            id,
            project_id: self.project_id,
            profile_id: self.profile_id,
            role: self.role,
            allocation_percent: self.allocation_percent,
            is_client_liaison: self.is_client_liaison,
        }
    }
}

/// Scheduled payment, optionally tied to a phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentScheduleEntry {
    pub id: PaymentId,
    pub project_id: ProjectId,
    pub phase_id: Option<PhaseId>,
    pub name: String,
    pub amount: f64,
    pub due_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub project_id: ProjectId,
    pub phase_id: Option<PhaseId>,
    pub name: String,
    pub amount: f64,
    pub due_date: Option<NaiveDate>,
    pub description: Option<String>,
}

impl NewPayment {
    #[must_use]
    pub fn into_entry(self, id: PaymentId) -> PaymentScheduleEntry {
        PaymentScheduleEntry {
            id,
            project_id: self.project_id,
            phase_id: self.phase_id,
            name: self.name,
            amount: self.amount,
            due_date: self.due_date,
            description: self.description,
        }
    }
}

/// Exactly one per project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    pub id: DashboardConfigId,
    pub project_id: ProjectId,
    pub settings: DashboardSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDashboardConfig {
    pub project_id: ProjectId,
    pub settings: DashboardSettings,
}

impl NewDashboardConfig {
    #[must_use]
    pub fn into_config(self, id: DashboardConfigId) -> DashboardConfig {
        DashboardConfig {
            id,
            project_id: self.project_id,
            settings: self.settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Phase {
        NewPhase {
            project_id: ProjectId::new(),
            name: "Build".to_string(),
            description: None,
            start_date: start,
            end_date: end,
            order_index: 0,
        }
        .into_phase(PhaseId::new())
    }

    #[test]
    fn phase_duration_in_days() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1);
        let end = NaiveDate::from_ymd_opt(2025, 1, 15);
        assert_eq!(phase(start, end).duration_days(), Some(14));
        assert_eq!(phase(start, None).duration_days(), None);
    }

    #[test]
    fn resource_kinds_are_in_creation_order() {
        assert_eq!(ResourceKind::ALL[0], ResourceKind::Project);
        assert_eq!(ResourceKind::ALL[5], ResourceKind::DashboardConfig);
        assert_eq!(ResourceKind::Task.to_string(), "tasks");
    }
}
