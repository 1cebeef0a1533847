//! Read model returned after a successful provisioning run

use crate::entity::ProjectStatus;
use crate::ids::{ClientId, MemberId, PhaseId, ProjectId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Denormalized view of a freshly provisioned project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedProjectView {
    pub id: ProjectId,
    pub name: String,
    pub client: ClientView,
    pub phases: Vec<PhaseView>,
    pub team_members: Vec<TeamMemberView>,
    pub payments: Vec<PaymentView>,
    pub dashboard_url: String,
    pub total_budget: f64,
    pub currency: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: ProjectStatus,
}

impl GeneratedProjectView {
    /// Look up a phase by name
    #[must_use]
    pub fn phase(&self, name: &str) -> Option<&PhaseView> {
        self.phases.iter().find(|p| p.name == name)
    }

    /// Sum of all scheduled payments
    #[must_use]
    pub fn scheduled_total(&self) -> f64 {
        self.payments.iter().map(|p| p.amount).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientView {
    pub id: ClientId,
    pub name: String,
    pub company: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseView {
    pub id: PhaseId,
    pub name: String,
    /// Days between start and end date
    pub duration: Option<i64>,
    pub task_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMemberView {
    pub id: MemberId,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentView {
    pub name: String,
    pub amount: f64,
    pub due_date: Option<NaiveDate>,
}
