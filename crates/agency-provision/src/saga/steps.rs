//! The six provisioning steps
//!
//! Tasks are part of the atomic unit: a failed task insert fails the run
//! and unwinds it like any other step. Client and profile references are
//! looked up in the directories before the rows that carry them are
//! written, so a dangling reference fails its step.

use super::{Produced, ProvisioningContext, ProvisioningStep, StepFailure, StepName};
use crate::error::StepCause;
use agency_model::{
    merge_with_defaults, NewDashboardConfig, NewPayment, NewPhase, NewProject, NewProjectMember,
    NewTask,
};
use agency_store::{ResourceStore, StoreError};
use async_trait::async_trait;

/// Insert the root project row
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateProject;

#[async_trait]
impl ProvisioningStep for CreateProject {
    fn name(&self) -> StepName {
        StepName::CreateProject
    }

    async fn apply(
        &self,
        store: &dyn ResourceStore,
        ctx: &mut ProvisioningContext<'_>,
    ) -> Result<Produced, StepFailure> {
        let blueprint = ctx.blueprint;
        let client_id = blueprint
            .client_reference
            .ok_or_else(|| StepFailure::new(StepCause::MissingDependency("client reference")))?;
        if ctx
            .references
            .clients
            .get_client(client_id)
            .await
            .map_err(StepFailure::new)?
            .is_none()
        {
            return Err(StepFailure::new(StepCause::unknown("client", client_id)));
        }
        let info = &blueprint.project_info;

        let project = store
            .insert_project(NewProject {
                client_id,
                name: info.name.clone(),
                description: info.description.clone(),
                status: info.status,
                start_date: info.start_date,
                end_date: info.end_date,
                total_budget: info.total_budget,
                currency: info.currency.clone(),
            })
            .await
            .map_err(StepFailure::new)?;

        ctx.project_id = Some(project.id);
        Ok(Produced::Project(project.id))
    }

    async fn compensate(
        &self,
        store: &dyn ResourceStore,
        produced: &Produced,
    ) -> Result<(), StoreError> {
        match produced {
            Produced::Project(id) => store.delete_project(*id).await,
            _ => Ok(()),
        }
    }
}

/// Insert phases in blueprint order, `order_index` = array position
#[derive(Debug, Clone, Copy, Default)]
pub struct CreatePhases;

#[async_trait]
impl ProvisioningStep for CreatePhases {
    fn name(&self) -> StepName {
        StepName::CreatePhases
    }

    async fn apply(
        &self,
        store: &dyn ResourceStore,
        ctx: &mut ProvisioningContext<'_>,
    ) -> Result<Produced, StepFailure> {
        let project_id = ctx.require_project()?;
        let mut ids = Vec::with_capacity(ctx.blueprint.phases.len());

        for (position, spec) in ctx.blueprint.phases.iter().enumerate() {
            if let Err(cause) = ctx.control.checkpoint() {
                return Err(StepFailure::partial(cause, Produced::Phases(ids)));
            }
            let Ok(order_index) = u32::try_from(position) else {
                return Err(StepFailure::partial(
                    StepCause::MissingDependency("phase order index"),
                    Produced::Phases(ids),
                ));
            };
            let inserted = store
                .insert_phase(NewPhase {
                    project_id,
                    name: spec.name.clone(),
                    description: spec.description.clone(),
                    start_date: spec.start_date,
                    end_date: spec.end_date,
                    order_index,
                })
                .await;
            match inserted {
                Ok(phase) => ids.push(phase.id),
                Err(e) => return Err(StepFailure::partial(e, Produced::Phases(ids))),
            }
        }

        ctx.phase_ids.clone_from(&ids);
        Ok(Produced::Phases(ids))
    }

    /// Phases own their tasks, so their tasks go first
    async fn compensate(
        &self,
        store: &dyn ResourceStore,
        produced: &Produced,
    ) -> Result<(), StoreError> {
        match produced {
            Produced::Phases(ids) if !ids.is_empty() => {
                store.delete_tasks_for_phases(ids).await?;
                store.delete_phases(ids).await
            }
            _ => Ok(()),
        }
    }
}

/// Insert every phase's tasks, keyed by the matching phase id
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateTasks;

#[async_trait]
impl ProvisioningStep for CreateTasks {
    fn name(&self) -> StepName {
        StepName::CreateTasks
    }

    async fn apply(
        &self,
        store: &dyn ResourceStore,
        ctx: &mut ProvisioningContext<'_>,
    ) -> Result<Produced, StepFailure> {
        if ctx.phase_ids.len() != ctx.blueprint.phases.len() {
            return Err(StepFailure::new(StepCause::MissingDependency("phase ids")));
        }
        let mut ids = Vec::with_capacity(ctx.blueprint.task_count());

        for (spec, phase_id) in ctx.blueprint.phases.iter().zip(&ctx.phase_ids) {
            for task in &spec.tasks {
                if let Err(cause) = ctx.control.checkpoint() {
                    return Err(StepFailure::partial(cause, Produced::Tasks(ids)));
                }
                let inserted = store
                    .insert_task(NewTask {
                        phase_id: *phase_id,
                        title: task.title.clone(),
                        description: task.description.clone(),
                        estimated_hours: task.estimated_hours,
                        priority: task.priority,
                    })
                    .await;
                match inserted {
                    Ok(task) => ids.push(task.id),
                    Err(e) => return Err(StepFailure::partial(e, Produced::Tasks(ids))),
                }
            }
        }

        Ok(Produced::Tasks(ids))
    }

    async fn compensate(
        &self,
        store: &dyn ResourceStore,
        produced: &Produced,
    ) -> Result<(), StoreError> {
        match produced {
            Produced::Tasks(ids) if !ids.is_empty() => store.delete_tasks(ids).await,
            _ => Ok(()),
        }
    }
}

/// Insert project members; no-op for an empty team
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateTeamAssignments;

#[async_trait]
impl ProvisioningStep for CreateTeamAssignments {
    fn name(&self) -> StepName {
        StepName::CreateTeamAssignments
    }

    async fn apply(
        &self,
        store: &dyn ResourceStore,
        ctx: &mut ProvisioningContext<'_>,
    ) -> Result<Produced, StepFailure> {
        let project_id = ctx.require_project()?;
        let assignments = &ctx.blueprint.team_assignments;
        if assignments.is_empty() {
            tracing::debug!("no team assignments; skipping");
            return Ok(Produced::Members(Vec::new()));
        }

        let mut ids = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            if let Err(cause) = ctx.control.checkpoint() {
                return Err(StepFailure::partial(cause, Produced::Members(ids)));
            }
            let profile_id = assignment.profile_reference;
            match ctx.references.profiles.get_profile(profile_id).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    return Err(StepFailure::partial(
                        StepCause::unknown("profile", profile_id),
                        Produced::Members(ids),
                    ))
                }
                Err(e) => return Err(StepFailure::partial(e, Produced::Members(ids))),
            }
            let inserted = store
                .insert_member(NewProjectMember {
                    project_id,
                    profile_id,
                    role: assignment.role.clone(),
                    allocation_percent: assignment.allocation_percent,
                    is_client_liaison: assignment.is_client_liaison,
                })
                .await;
            match inserted {
                Ok(member) => ids.push(member.id),
                Err(e) => return Err(StepFailure::partial(e, Produced::Members(ids))),
            }
        }

        Ok(Produced::Members(ids))
    }

    async fn compensate(
        &self,
        store: &dyn ResourceStore,
        produced: &Produced,
    ) -> Result<(), StoreError> {
        match produced {
            Produced::Members(ids) if !ids.is_empty() => store.delete_members(ids).await,
            _ => Ok(()),
        }
    }
}

/// Insert payment schedule entries; no-op for an empty schedule
#[derive(Debug, Clone, Copy, Default)]
pub struct CreatePaymentSchedule;

#[async_trait]
impl ProvisioningStep for CreatePaymentSchedule {
    fn name(&self) -> StepName {
        StepName::CreatePaymentSchedule
    }

    async fn apply(
        &self,
        store: &dyn ResourceStore,
        ctx: &mut ProvisioningContext<'_>,
    ) -> Result<Produced, StepFailure> {
        let project_id = ctx.require_project()?;
        let schedule = &ctx.blueprint.payment_schedule;
        if schedule.is_empty() {
            tracing::debug!("no payment schedule; skipping");
            return Ok(Produced::Payments(Vec::new()));
        }

        let mut ids = Vec::with_capacity(schedule.len());
        for payment in schedule {
            if let Err(cause) = ctx.control.checkpoint() {
                return Err(StepFailure::partial(cause, Produced::Payments(ids)));
            }
            let phase_id = match payment.phase_index {
                None => None,
                Some(index) => match ctx.phase_ids.get(index) {
                    Some(id) => Some(*id),
                    None => {
                        return Err(StepFailure::partial(
                            StepCause::MissingDependency("linked phase"),
                            Produced::Payments(ids),
                        ))
                    }
                },
            };
            let inserted = store
                .insert_payment(NewPayment {
                    project_id,
                    phase_id,
                    name: payment.name.clone(),
                    amount: payment.amount,
                    due_date: payment.due_date,
                    description: payment.description.clone(),
                })
                .await;
            match inserted {
                Ok(entry) => ids.push(entry.id),
                Err(e) => return Err(StepFailure::partial(e, Produced::Payments(ids))),
            }
        }

        Ok(Produced::Payments(ids))
    }

    async fn compensate(
        &self,
        store: &dyn ResourceStore,
        produced: &Produced,
    ) -> Result<(), StoreError> {
        match produced {
            Produced::Payments(ids) if !ids.is_empty() => store.delete_payments(ids).await,
            _ => Ok(()),
        }
    }
}

/// Insert the single dashboard config, defaults merged in
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateDashboardConfig;

#[async_trait]
impl ProvisioningStep for CreateDashboardConfig {
    fn name(&self) -> StepName {
        StepName::CreateDashboardConfig
    }

    async fn apply(
        &self,
        store: &dyn ResourceStore,
        ctx: &mut ProvisioningContext<'_>,
    ) -> Result<Produced, StepFailure> {
        let project_id = ctx.require_project()?;
        let settings = merge_with_defaults(&ctx.blueprint.dashboard_config, ctx.dashboard_defaults);

        let config = store
            .insert_dashboard_config(NewDashboardConfig {
                project_id,
                settings,
            })
            .await
            .map_err(StepFailure::new)?;

        Ok(Produced::DashboardConfig(config.id))
    }

    async fn compensate(
        &self,
        store: &dyn ResourceStore,
        produced: &Produced,
    ) -> Result<(), StoreError> {
        match produced {
            Produced::DashboardConfig(id) => store.delete_dashboard_config(*id).await,
            _ => Ok(()),
        }
    }
}
