//! Resource store capability

use crate::error::StoreError;
use agency_model::{
    DashboardConfig, DashboardConfigId, MemberId, NewDashboardConfig, NewPayment, NewPhase,
    NewProject, NewProjectMember, NewTask, PaymentId, PaymentScheduleEntry, Phase, PhaseId,
    Project, ProjectId, ProjectMember, Task, TaskId,
};
use async_trait::async_trait;

/// Typed persistence operations, grouped per resource kind.
///
/// Inserts return the stored row with its assigned id. Deletes address
/// rows by id only and succeed when the rows are already gone, so a
/// compensation may be re-run safely. Lists are scoped to their owner.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    // Project
    async fn insert_project(&self, project: NewProject) -> Result<Project, StoreError>;
    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError>;
    async fn delete_project(&self, id: ProjectId) -> Result<(), StoreError>;

    // Phase
    async fn insert_phase(&self, phase: NewPhase) -> Result<Phase, StoreError>;
    /// Phases of a project ordered by `order_index`
    async fn list_phases(&self, project: ProjectId) -> Result<Vec<Phase>, StoreError>;
    async fn delete_phases(&self, ids: &[PhaseId]) -> Result<(), StoreError>;

    // Task
    async fn insert_task(&self, task: NewTask) -> Result<Task, StoreError>;
    async fn list_tasks(&self, phases: &[PhaseId]) -> Result<Vec<Task>, StoreError>;
    async fn delete_tasks(&self, ids: &[TaskId]) -> Result<(), StoreError>;
    /// Delete every task owned by the given phases
    async fn delete_tasks_for_phases(&self, phases: &[PhaseId]) -> Result<(), StoreError>;

    // ProjectMember
    async fn insert_member(&self, member: NewProjectMember) -> Result<ProjectMember, StoreError>;
    async fn list_members(&self, project: ProjectId) -> Result<Vec<ProjectMember>, StoreError>;
    async fn delete_members(&self, ids: &[MemberId]) -> Result<(), StoreError>;

    // PaymentSchedule
    async fn insert_payment(&self, payment: NewPayment)
        -> Result<PaymentScheduleEntry, StoreError>;
    async fn list_payments(
        &self,
        project: ProjectId,
    ) -> Result<Vec<PaymentScheduleEntry>, StoreError>;
    async fn delete_payments(&self, ids: &[PaymentId]) -> Result<(), StoreError>;

    // DashboardConfig
    async fn insert_dashboard_config(
        &self,
        config: NewDashboardConfig,
    ) -> Result<DashboardConfig, StoreError>;
    async fn get_dashboard_config(
        &self,
        project: ProjectId,
    ) -> Result<Option<DashboardConfig>, StoreError>;
    async fn delete_dashboard_config(&self, id: DashboardConfigId) -> Result<(), StoreError>;
}
