//! Provisioning saga
//!
//! The store offers no multi-resource transaction, so creation runs as an
//! ordered list of steps, each paired with a compensation. Steps run
//! strictly in order; every completed step is pushed onto a stack together
//! with the ids it produced. On the first failure:
//!
//! 1. The failing step is not retried
//! 2. Rows the failing step created before it broke are removed
//! 3. The stack is unwound LIFO, each compensation deleting exactly its
//!    own produced ids
//! 4. Compensation failures are logged and collected, never allowed to
//!    replace the triggering error
//!
//! A run is single-attempt and cannot be resumed.

mod steps;

pub use steps::{
    CreateDashboardConfig, CreatePaymentSchedule, CreatePhases, CreateProject, CreateTasks,
    CreateTeamAssignments,
};

use crate::control::RunControl;
use crate::error::{CompensationError, CompensationOutcome, ProvisioningStepError, StepCause};
use agency_model::{
    DashboardConfigId, DashboardSettings, MemberId, PaymentId, PhaseId, ProjectBlueprint,
    ProjectId, ResourceKind, TaskId,
};
use agency_store::{ClientDirectory, ProfileDirectory, ResourceStore, StoreError};
use async_trait::async_trait;
use std::fmt;

/// Names of the provisioning steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepName {
    CreateProject,
    CreatePhases,
    CreateTasks,
    CreateTeamAssignments,
    CreatePaymentSchedule,
    CreateDashboardConfig,
}

impl StepName {
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::CreateProject => "CreateProject",
            StepName::CreatePhases => "CreatePhases",
            StepName::CreateTasks => "CreateTasks",
            StepName::CreateTeamAssignments => "CreateTeamAssignments",
            StepName::CreatePaymentSchedule => "CreatePaymentSchedule",
            StepName::CreateDashboardConfig => "CreateDashboardConfig",
        }
    }

    /// Collection the step writes to
    #[inline]
    #[must_use]
    pub fn resource_kind(&self) -> ResourceKind {
        match self {
            StepName::CreateProject => ResourceKind::Project,
            StepName::CreatePhases => ResourceKind::Phase,
            StepName::CreateTasks => ResourceKind::Task,
            StepName::CreateTeamAssignments => ResourceKind::ProjectMember,
            StepName::CreatePaymentSchedule => ResourceKind::PaymentSchedule,
            StepName::CreateDashboardConfig => ResourceKind::DashboardConfig,
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ids a step created; the exact input to its compensation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Produced {
    Nothing,
    Project(ProjectId),
    Phases(Vec<PhaseId>),
    Tasks(Vec<TaskId>),
    Members(Vec<MemberId>),
    Payments(Vec<PaymentId>),
    DashboardConfig(DashboardConfigId),
}

impl Produced {
    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Produced::Nothing => 0,
            Produced::Project(_) | Produced::DashboardConfig(_) => 1,
            Produced::Phases(ids) => ids.len(),
            Produced::Tasks(ids) => ids.len(),
            Produced::Members(ids) => ids.len(),
            Produced::Payments(ids) => ids.len(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Failure of a single step, with whatever it created before breaking
#[derive(Debug)]
pub struct StepFailure {
    pub cause: StepCause,
    pub partial: Produced,
}

impl StepFailure {
    /// Failure with no rows created
    #[inline]
    pub fn new(cause: impl Into<StepCause>) -> Self {
        Self {
            cause: cause.into(),
            partial: Produced::Nothing,
        }
    }

    /// Failure after some rows were created
    #[inline]
    pub fn partial(cause: impl Into<StepCause>, partial: Produced) -> Self {
        Self {
            cause: cause.into(),
            partial,
        }
    }
}

/// Directories blueprint references are resolved against
#[derive(Clone, Copy)]
pub struct References<'a> {
    pub clients: &'a dyn ClientDirectory,
    pub profiles: &'a dyn ProfileDirectory,
}

impl<'a> References<'a> {
    #[must_use]
    pub fn new(clients: &'a dyn ClientDirectory, profiles: &'a dyn ProfileDirectory) -> Self {
        Self { clients, profiles }
    }
}

impl fmt::Debug for References<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("References").finish_non_exhaustive()
    }
}

/// State threaded through the steps of one run
#[derive(Debug)]
pub struct ProvisioningContext<'a> {
    pub blueprint: &'a ProjectBlueprint,
    pub dashboard_defaults: &'a DashboardSettings,
    pub control: &'a RunControl,
    pub references: References<'a>,
    /// Set by `CreateProject`
    pub project_id: Option<ProjectId>,
    /// Set by `CreatePhases`, aligned 1:1 with `blueprint.phases`
    pub phase_ids: Vec<PhaseId>,
}

impl<'a> ProvisioningContext<'a> {
    #[must_use]
    pub fn new(
        blueprint: &'a ProjectBlueprint,
        dashboard_defaults: &'a DashboardSettings,
        control: &'a RunControl,
        references: References<'a>,
    ) -> Self {
        Self {
            blueprint,
            dashboard_defaults,
            control,
            references,
            project_id: None,
            phase_ids: Vec::new(),
        }
    }

    /// Project id, or a missing-dependency failure
    ///
    /// # Errors
    /// `StepFailure` when `CreateProject` has not run
    pub fn require_project(&self) -> Result<ProjectId, StepFailure> {
        self.project_id
            .ok_or_else(|| StepFailure::new(StepCause::MissingDependency("project id")))
    }
}

/// One ordered unit of work with its inverse
#[async_trait]
pub trait ProvisioningStep: Send + Sync {
    fn name(&self) -> StepName;

    /// Create this step's rows
    async fn apply(
        &self,
        store: &dyn ResourceStore,
        ctx: &mut ProvisioningContext<'_>,
    ) -> Result<Produced, StepFailure>;

    /// Delete exactly the rows in `produced`
    async fn compensate(
        &self,
        store: &dyn ResourceStore,
        produced: &Produced,
    ) -> Result<(), StoreError>;
}

/// A step that finished, with what it produced
#[derive(Debug, Clone)]
pub struct CompletedStep {
    pub name: StepName,
    pub produced: Produced,
}

/// Successful run summary
#[derive(Debug, Clone)]
pub struct SagaReport {
    pub project_id: ProjectId,
    pub completed: Vec<CompletedStep>,
}

impl SagaReport {
    /// What a given step produced
    #[must_use]
    pub fn produced_by(&self, name: StepName) -> Option<&Produced> {
        self.completed
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.produced)
    }
}

/// Executes steps in order and unwinds on failure
pub struct SagaOrchestrator {
    steps: Vec<Box<dyn ProvisioningStep>>,
}

impl fmt::Debug for SagaOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SagaOrchestrator")
            .field("steps", &self.step_names())
            .finish()
    }
}

impl SagaOrchestrator {
    /// Orchestrator over an explicit step list
    #[must_use]
    pub fn new(steps: Vec<Box<dyn ProvisioningStep>>) -> Self {
        Self { steps }
    }

    /// The six provisioning steps in their fixed order
    #[must_use]
    pub fn provisioning() -> Self {
        let steps: Vec<Box<dyn ProvisioningStep>> = vec![
            Box::new(CreateProject),
            Box::new(CreatePhases),
            Box::new(CreateTasks),
            Box::new(CreateTeamAssignments),
            Box::new(CreatePaymentSchedule),
            Box::new(CreateDashboardConfig),
        ];
        Self::new(steps)
    }

    #[must_use]
    pub fn step_names(&self) -> Vec<StepName> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step, or none.
    ///
    /// # Errors
    /// `ProvisioningStepError` naming the first failed step. By the time it
    /// is returned every compensation has been attempted.
    pub async fn run(
        &self,
        store: &dyn ResourceStore,
        ctx: &mut ProvisioningContext<'_>,
    ) -> Result<SagaReport, ProvisioningStepError> {
        let mut completed: Vec<(usize, Produced)> = Vec::with_capacity(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let name = step.name();
            let outcome = match ctx.control.checkpoint() {
                Ok(()) => {
                    tracing::debug!(step = %name, "applying step");
                    step.apply(store, ctx).await
                }
                Err(cause) => Err(StepFailure::new(cause)),
            };

            match outcome {
                Ok(produced) => {
                    tracing::info!(step = %name, rows = produced.len(), "step completed");
                    completed.push((index, produced));
                }
                Err(failure) => {
                    tracing::warn!(
                        step = %name,
                        cause = %failure.cause,
                        partial_rows = failure.partial.len(),
                        "step failed; unwinding"
                    );
                    let StepFailure { cause, partial } = failure;
                    let compensation = self
                        .unwind(store, (index, partial), completed, &cause)
                        .await;
                    return Err(ProvisioningStepError {
                        failed_step: name,
                        cause,
                        compensation,
                    });
                }
            }
        }

        let project_id = ctx.project_id.ok_or_else(|| ProvisioningStepError {
            failed_step: StepName::CreateProject,
            cause: StepCause::MissingDependency("project id"),
            compensation: CompensationOutcome::default(),
        })?;

        Ok(SagaReport {
            project_id,
            completed: completed
                .into_iter()
                .map(|(index, produced)| CompletedStep {
                    name: self.steps[index].name(),
                    produced,
                })
                .collect(),
        })
    }

    /// Undo the failing step's partial rows, then every completed step in
    /// reverse order.
    async fn unwind(
        &self,
        store: &dyn ResourceStore,
        failed: (usize, Produced),
        mut completed: Vec<(usize, Produced)>,
        original: &StepCause,
    ) -> CompensationOutcome {
        let mut outcome = CompensationOutcome::default();

        if !failed.1.is_empty() {
            self.compensate_one(store, failed, original, &mut outcome)
                .await;
        }
        while let Some(entry) = completed.pop() {
            self.compensate_one(store, entry, original, &mut outcome)
                .await;
        }

        if outcome.is_complete() {
            tracing::info!(steps = outcome.compensated.len(), "rollback complete");
        } else {
            tracing::error!(
                failures = outcome.failures.len(),
                "rollback incomplete; manual cleanup required"
            );
        }
        outcome
    }

    async fn compensate_one(
        &self,
        store: &dyn ResourceStore,
        (index, produced): (usize, Produced),
        original: &StepCause,
        outcome: &mut CompensationOutcome,
    ) {
        let step = &self.steps[index];
        let name = step.name();
        match step.compensate(store, &produced).await {
            Ok(()) => {
                tracing::warn!(step = %name, rows = produced.len(), "compensated");
                outcome.compensated.push(name);
            }
            Err(source) => {
                tracing::error!(
                    step = %name,
                    produced = ?produced,
                    original = %original,
                    error = %source,
                    "compensation failed"
                );
                outcome.failures.push(CompensationError {
                    step: name,
                    produced,
                    source,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agency_store::{InMemoryDirectory, InMemoryStore};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    /// Step double that records calls into a shared journal
    struct Recorder {
        name: StepName,
        fail: bool,
        journal: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ProvisioningStep for Recorder {
        fn name(&self) -> StepName {
            self.name
        }

        async fn apply(
            &self,
            _store: &dyn ResourceStore,
            ctx: &mut ProvisioningContext<'_>,
        ) -> Result<Produced, StepFailure> {
            self.journal.lock().push(format!("apply {}", self.name));
            if self.fail {
                return Err(StepFailure::new(StepCause::MissingDependency("scripted failure")));
            }
            if self.name == StepName::CreateProject {
                ctx.project_id = Some(ProjectId::new());
            }
            Ok(Produced::Nothing)
        }

        async fn compensate(
            &self,
            _store: &dyn ResourceStore,
            _produced: &Produced,
        ) -> Result<(), StoreError> {
            self.journal.lock().push(format!("undo {}", self.name));
            Ok(())
        }
    }

    fn recorders(fail_at: Option<StepName>, journal: &Arc<Mutex<Vec<String>>>) -> SagaOrchestrator {
        let names = [
            StepName::CreateProject,
            StepName::CreatePhases,
            StepName::CreateTasks,
        ];
        SagaOrchestrator::new(
            names
                .into_iter()
                .map(|name| {
                    Box::new(Recorder {
                        name,
                        fail: Some(name) == fail_at,
                        journal: journal.clone(),
                    }) as Box<dyn ProvisioningStep>
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn unwinds_in_reverse_order_and_never_retries() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let saga = recorders(Some(StepName::CreateTasks), &journal);
        let store = InMemoryStore::new();
        let blueprint = ProjectBlueprint::default();
        let defaults = DashboardSettings::default();
        let control = RunControl::new();
        let dir = InMemoryDirectory::new();
        let mut ctx =
            ProvisioningContext::new(&blueprint, &defaults, &control, References::new(&dir, &dir));

        let err = saga.run(&store, &mut ctx).await.unwrap_err();
        assert_eq!(err.failed_step, StepName::CreateTasks);
        assert_eq!(
            *journal.lock(),
            vec![
                "apply CreateProject",
                "apply CreatePhases",
                "apply CreateTasks",
                "undo CreatePhases",
                "undo CreateProject",
            ]
        );
        assert_eq!(
            err.compensation.compensated,
            vec![StepName::CreatePhases, StepName::CreateProject]
        );
    }

    #[tokio::test]
    async fn first_step_failure_compensates_nothing() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let saga = recorders(Some(StepName::CreateProject), &journal);
        let store = InMemoryStore::new();
        let blueprint = ProjectBlueprint::default();
        let defaults = DashboardSettings::default();
        let control = RunControl::new();
        let dir = InMemoryDirectory::new();
        let mut ctx =
            ProvisioningContext::new(&blueprint, &defaults, &control, References::new(&dir, &dir));

        let err = saga.run(&store, &mut ctx).await.unwrap_err();
        assert_eq!(err.failed_step, StepName::CreateProject);
        assert!(err.compensation.compensated.is_empty());
        assert_eq!(journal.lock().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_before_start_runs_nothing() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let saga = recorders(None, &journal);
        let store = InMemoryStore::new();
        let blueprint = ProjectBlueprint::default();
        let defaults = DashboardSettings::default();
        let control = RunControl::new();
        control.cancel();
        let dir = InMemoryDirectory::new();
        let mut ctx =
            ProvisioningContext::new(&blueprint, &defaults, &control, References::new(&dir, &dir));

        let err = saga.run(&store, &mut ctx).await.unwrap_err();
        assert_eq!(err.cause, StepCause::Cancelled);
        assert!(journal.lock().is_empty());
    }

    #[test]
    fn default_order_is_fixed() {
        assert_eq!(
            SagaOrchestrator::provisioning().step_names(),
            vec![
                StepName::CreateProject,
                StepName::CreatePhases,
                StepName::CreateTasks,
                StepName::CreateTeamAssignments,
                StepName::CreatePaymentSchedule,
                StepName::CreateDashboardConfig,
            ]
        );
    }

    #[test]
    fn produced_len() {
        assert_eq!(Produced::Nothing.len(), 0);
        assert_eq!(Produced::Project(ProjectId::new()).len(), 1);
        assert_eq!(Produced::Tasks(vec![TaskId::new(), TaskId::new()]).len(), 2);
        assert!(Produced::Members(vec![]).is_empty());
    }
}
