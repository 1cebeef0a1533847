//! Provisioning pipeline facade
//!
//! `authorize -> validate -> saga -> assemble`. The first three stages
//! either complete or leave the store exactly as they found it.

use crate::assemble::ResponseAssembler;
use crate::audit::{AuditAction, AuditLog};
use crate::config::ProvisioningConfig;
use crate::control::RunControl;
use crate::error::{AssemblyError, ProvisionError};
use crate::gate::AuthorizationGate;
use crate::saga::{ProvisioningContext, References, SagaOrchestrator, SagaReport};
use crate::validate::BlueprintValidator;
use agency_model::{Credential, GeneratedProjectView, ProjectBlueprint, ProjectId};
use agency_store::{ClientDirectory, ProfileDirectory, ResourceStore, RoleResolver};
use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;

/// Successful run; the view may still have failed to assemble
#[derive(Debug)]
pub struct ProvisionOutcome {
    pub project_id: ProjectId,
    pub report: SagaReport,
    pub view: Result<GeneratedProjectView, AssemblyError>,
}

impl ProvisionOutcome {
    /// The assembled view
    ///
    /// # Errors
    /// The assembly error, if read-back failed
    pub fn into_view(self) -> Result<GeneratedProjectView, AssemblyError> {
        self.view
    }
}

/// Runs the whole pipeline for one blueprint at a time
pub struct Provisioner {
    config: ProvisioningConfig,
    store: Arc<dyn ResourceStore>,
    clients: Arc<dyn ClientDirectory>,
    profiles: Arc<dyn ProfileDirectory>,
    gate: AuthorizationGate,
    validator: BlueprintValidator,
    saga: SagaOrchestrator,
    assembler: ResponseAssembler,
    audit: Arc<AuditLog>,
}

impl fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provisioner")
            .field("config", &self.config)
            .field("gate", &self.gate)
            .field("saga", &self.saga)
            .field("assembler", &self.assembler)
            .finish_non_exhaustive()
    }
}

impl Provisioner {
    /// Build from a store plus one directory serving clients, profiles and roles
    #[must_use]
    pub fn new<D>(
        config: ProvisioningConfig,
        store: Arc<dyn ResourceStore>,
        directory: Arc<D>,
    ) -> Self
    where
        D: ClientDirectory + ProfileDirectory + RoleResolver + 'static,
    {
        Self::from_parts(
            config,
            store,
            directory.clone(),
            directory.clone(),
            directory,
        )
    }

    /// Build from individual capabilities
    #[must_use]
    pub fn from_parts(
        config: ProvisioningConfig,
        store: Arc<dyn ResourceStore>,
        clients: Arc<dyn ClientDirectory>,
        profiles: Arc<dyn ProfileDirectory>,
        roles: Arc<dyn RoleResolver>,
    ) -> Self {
        let gate = AuthorizationGate::new(roles, config.allowed_roles.clone());
        let audit = Arc::new(AuditLog::with_capacity(config.audit_capacity));
        let assembler = ResponseAssembler::new(
            store.clone(),
            clients.clone(),
            profiles.clone(),
            config.dashboard_base_url.clone(),
        );
        Self {
            config,
            store,
            clients,
            profiles,
            gate,
            validator: BlueprintValidator::new(),
            saga: SagaOrchestrator::provisioning(),
            assembler,
            audit,
        }
    }

    /// Replace the step list
    #[must_use]
    pub fn with_saga(mut self, saga: SagaOrchestrator) -> Self {
        self.saga = saga;
        self
    }

    /// Share an audit log with other components
    #[must_use]
    pub fn with_audit_log(mut self, audit: Arc<AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ProvisioningConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn audit_log(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    /// Provision one project, all or nothing.
    ///
    /// # Errors
    /// - `Authorization` / `Validation`: nothing was written
    /// - `Provisioning`: every compensation has been attempted
    pub async fn provision(
        &self,
        credential: &Credential,
        blueprint: &ProjectBlueprint,
        control: &RunControl,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        let role = match self.gate.authorize(credential).await {
            Ok(role) => role,
            Err(e) => {
                self.audit
                    .append(credential, AuditAction::AccessDenied, None, e.to_string());
                return Err(e.into());
            }
        };
        self.audit
            .append(credential, AuditAction::AccessGranted, None, role.as_str());

        if let Err(e) = self.validator.validate(blueprint) {
            self.audit.append(
                credential,
                AuditAction::BlueprintRejected,
                None,
                format!("{} violation(s)", e.violations.len()),
            );
            return Err(e.into());
        }

        let control = self.bounded(control);
        let references = References::new(&*self.clients, &*self.profiles);
        let mut ctx = ProvisioningContext::new(
            blueprint,
            &self.config.dashboard_defaults,
            &control,
            references,
        );
        tracing::info!(
            %role,
            project = %blueprint.project_info.name,
            phases = blueprint.phases.len(),
            tasks = blueprint.task_count(),
            "provisioning project"
        );

        let report = match self.saga.run(&*self.store, &mut ctx).await {
            Ok(report) => report,
            Err(e) => {
                let action = if e.compensation.is_complete() {
                    AuditAction::ProjectRolledBack
                } else {
                    AuditAction::RollbackIncomplete
                };
                self.audit
                    .append(credential, action, ctx.project_id, e.to_string());
                return Err(e.into());
            }
        };

        let project_id = report.project_id;
        self.audit.append(
            credential,
            AuditAction::ProjectCommitted,
            Some(project_id),
            format!("{} step(s)", report.completed.len()),
        );
        tracing::info!(%project_id, "project provisioned");

        let view = self.assembler.assemble(project_id).await;
        if let Err(e) = &view {
            tracing::warn!(%project_id, error = %e, "project created but view assembly failed");
        }

        Ok(ProvisionOutcome {
            project_id,
            report,
            view,
        })
    }

    /// Caller control, tightened to the configured run timeout
    fn bounded(&self, control: &RunControl) -> RunControl {
        let Some(timeout) = self.config.run_timeout() else {
            return control.clone();
        };
        let configured = Instant::now() + timeout;
        match control.deadline() {
            Some(deadline) if deadline <= configured => control.clone(),
            _ => control.clone().with_deadline(configured),
        }
    }
}
