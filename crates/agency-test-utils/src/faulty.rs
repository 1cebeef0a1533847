use agency_model::{
    DashboardConfig, DashboardConfigId, MemberId, NewDashboardConfig, NewPayment, NewPhase,
    NewProject, NewProjectMember, NewTask, PaymentId, PaymentScheduleEntry, Phase, PhaseId,
    Project, ProjectId, ProjectMember, ResourceKind, Task, TaskId,
};
use agency_store::{InMemoryStore, ResourceStore, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
struct Hold {
    at: usize,
    reached: Arc<Notify>,
    release: Arc<Notify>,
}

#[derive(Debug, Default)]
struct Faults {
    inserts_of: BTreeSet<ResourceKind>,
    nth_insert: Option<usize>,
    deletes_of: BTreeSet<ResourceKind>,
    reads_of: BTreeSet<ResourceKind>,
    cancel_after: Option<(usize, CancellationToken)>,
    hold_after: Option<Hold>,
}

/// Wraps an [`InMemoryStore`] and fails selected operations
#[derive(Debug)]
pub struct FaultyStore {
    inner: Arc<InMemoryStore>,
    faults: Mutex<Faults>,
    inserts: AtomicUsize,
}

impl FaultyStore {
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            faults: Mutex::new(Faults::default()),
            inserts: AtomicUsize::new(0),
        }
    }

    /// Every insert into `kind` fails
    pub fn fail_inserts_of(self, kind: ResourceKind) -> Self {
        self.faults.lock().inserts_of.insert(kind);
        self
    }

    /// The `n`th insert (1-based, any kind) fails
    pub fn fail_nth_insert(self, n: usize) -> Self {
        self.faults.lock().nth_insert = Some(n);
        self
    }

    /// Every delete from `kind` fails
    pub fn fail_deletes_of(self, kind: ResourceKind) -> Self {
        self.faults.lock().deletes_of.insert(kind);
        self
    }

    /// Every read of `kind` fails; the saga never reads, assembly does
    pub fn fail_reads_of(self, kind: ResourceKind) -> Self {
        self.faults.lock().reads_of.insert(kind);
        self
    }

    /// Cancel `token` right after the `n`th successful insert
    pub fn cancel_after_inserts(self, n: usize, token: CancellationToken) -> Self {
        self.faults.lock().cancel_after = Some((n, token));
        self
    }

    /// Park the `n`th successful insert: `reached` is notified, and the
    /// insert only returns once `release` is notified
    pub fn hold_after_inserts(self, n: usize, reached: Arc<Notify>, release: Arc<Notify>) -> Self {
        self.faults.lock().hold_after = Some(Hold {
            at: n,
            reached,
            release,
        });
        self
    }

    pub fn inner(&self) -> &Arc<InMemoryStore> {
        &self.inner
    }

    /// Inserts attempted so far
    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    fn before_insert(&self, kind: ResourceKind) -> Result<(), StoreError> {
        let n = self.inserts.fetch_add(1, Ordering::SeqCst) + 1;
        let faults = self.faults.lock();
        if faults.inserts_of.contains(&kind) || faults.nth_insert == Some(n) {
            return Err(StoreError::unavailable(kind, format!("injected fault on insert #{n}")));
        }
        Ok(())
    }

    async fn after_insert<T>(&self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        if result.is_ok() {
            let n = self.inserts();
            let hold = {
                let faults = self.faults.lock();
                if let Some((at, token)) = &faults.cancel_after {
                    if n == *at {
                        token.cancel();
                    }
                }
                faults.hold_after.clone().filter(|hold| hold.at == n)
            };
            if let Some(hold) = hold {
                hold.reached.notify_one();
                hold.release.notified().await;
            }
        }
        result
    }

    fn before_read(&self, kind: ResourceKind) -> Result<(), StoreError> {
        if self.faults.lock().reads_of.contains(&kind) {
            return Err(StoreError::unavailable(kind, "injected fault on read"));
        }
        Ok(())
    }

    fn before_delete(&self, kind: ResourceKind) -> Result<(), StoreError> {
        if self.faults.lock().deletes_of.contains(&kind) {
            return Err(StoreError::unavailable(kind, "injected fault on delete"));
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceStore for FaultyStore {
    async fn insert_project(&self, project: NewProject) -> Result<Project, StoreError> {
        self.before_insert(ResourceKind::Project)?;
        let result = self.inner.insert_project(project).await;
        self.after_insert(result).await
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        self.before_read(ResourceKind::Project)?;
        self.inner.get_project(id).await
    }

    async fn delete_project(&self, id: ProjectId) -> Result<(), StoreError> {
        self.before_delete(ResourceKind::Project)?;
        self.inner.delete_project(id).await
    }

    async fn insert_phase(&self, phase: NewPhase) -> Result<Phase, StoreError> {
        self.before_insert(ResourceKind::Phase)?;
        let result = self.inner.insert_phase(phase).await;
        self.after_insert(result).await
    }

    async fn list_phases(&self, project: ProjectId) -> Result<Vec<Phase>, StoreError> {
        self.before_read(ResourceKind::Phase)?;
        self.inner.list_phases(project).await
    }

    async fn delete_phases(&self, ids: &[PhaseId]) -> Result<(), StoreError> {
        self.before_delete(ResourceKind::Phase)?;
        self.inner.delete_phases(ids).await
    }

    async fn insert_task(&self, task: NewTask) -> Result<Task, StoreError> {
        self.before_insert(ResourceKind::Task)?;
        let result = self.inner.insert_task(task).await;
        self.after_insert(result).await
    }

    async fn list_tasks(&self, phases: &[PhaseId]) -> Result<Vec<Task>, StoreError> {
        self.before_read(ResourceKind::Task)?;
        self.inner.list_tasks(phases).await
    }

    async fn delete_tasks(&self, ids: &[TaskId]) -> Result<(), StoreError> {
        self.before_delete(ResourceKind::Task)?;
        self.inner.delete_tasks(ids).await
    }

    async fn delete_tasks_for_phases(&self, phases: &[PhaseId]) -> Result<(), StoreError> {
        self.before_delete(ResourceKind::Task)?;
        self.inner.delete_tasks_for_phases(phases).await
    }

    async fn insert_member(&self, member: NewProjectMember) -> Result<ProjectMember, StoreError> {
        self.before_insert(ResourceKind::ProjectMember)?;
        let result = self.inner.insert_member(member).await;
        self.after_insert(result).await
    }

    async fn list_members(&self, project: ProjectId) -> Result<Vec<ProjectMember>, StoreError> {
        self.before_read(ResourceKind::ProjectMember)?;
        self.inner.list_members(project).await
    }

    async fn delete_members(&self, ids: &[MemberId]) -> Result<(), StoreError> {
        self.before_delete(ResourceKind::ProjectMember)?;
        self.inner.delete_members(ids).await
    }

    async fn insert_payment(
        &self,
        payment: NewPayment,
    ) -> Result<PaymentScheduleEntry, StoreError> {
        self.before_insert(ResourceKind::PaymentSchedule)?;
        let result = self.inner.insert_payment(payment).await;
        self.after_insert(result).await
    }

    async fn list_payments(
        &self,
        project: ProjectId,
    ) -> Result<Vec<PaymentScheduleEntry>, StoreError> {
        self.before_read(ResourceKind::PaymentSchedule)?;
        self.inner.list_payments(project).await
    }

    async fn delete_payments(&self, ids: &[PaymentId]) -> Result<(), StoreError> {
        self.before_delete(ResourceKind::PaymentSchedule)?;
        self.inner.delete_payments(ids).await
    }

    async fn insert_dashboard_config(
        &self,
        config: NewDashboardConfig,
    ) -> Result<DashboardConfig, StoreError> {
        self.before_insert(ResourceKind::DashboardConfig)?;
        let result = self.inner.insert_dashboard_config(config).await;
        self.after_insert(result).await
    }

    async fn get_dashboard_config(
        &self,
        project: ProjectId,
    ) -> Result<Option<DashboardConfig>, StoreError> {
        self.before_read(ResourceKind::DashboardConfig)?;
        self.inner.get_dashboard_config(project).await
    }

    async fn delete_dashboard_config(&self, id: DashboardConfigId) -> Result<(), StoreError> {
        self.before_delete(ResourceKind::DashboardConfig)?;
        self.inner.delete_dashboard_config(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agency_model::{ClientId, ProjectStatus};

    fn project() -> NewProject {
        NewProject {
            client_id: ClientId::new(),
            name: "p".to_string(),
            description: None,
            status: ProjectStatus::Planning,
            start_date: None,
            end_date: None,
            total_budget: 1.0,
            currency: "USD".to_string(),
        }
    }

    #[tokio::test]
    async fn nth_insert_fails_once() {
        let store = FaultyStore::new(Arc::new(InMemoryStore::new())).fail_nth_insert(2);
        assert!(store.insert_project(project()).await.is_ok());
        assert!(store.insert_project(project()).await.is_err());
        assert!(store.insert_project(project()).await.is_ok());
        assert_eq!(store.inner().counts().projects, 2);
    }

    #[tokio::test]
    async fn cancel_after_inserts_trips_token() {
        let token = CancellationToken::new();
        let store = FaultyStore::new(Arc::new(InMemoryStore::new()))
            .cancel_after_inserts(1, token.clone());
        store.insert_project(project()).await.unwrap();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn read_faults_leave_writes_alone() {
        let store = FaultyStore::new(Arc::new(InMemoryStore::new()))
            .fail_reads_of(ResourceKind::Project);
        let project = store.insert_project(project()).await.unwrap();
        assert!(store.get_project(project.id).await.is_err());
        assert!(store.inner().get_project(project.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn held_insert_waits_for_release() {
        let reached = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let store = Arc::new(FaultyStore::new(Arc::new(InMemoryStore::new())).hold_after_inserts(
            1,
            reached.clone(),
            release.clone(),
        ));

        let insert = tokio::spawn({
            let store = store.clone();
            async move { store.insert_project(project()).await }
        });
        reached.notified().await;
        assert!(!insert.is_finished());
        assert_eq!(store.inner().counts().projects, 1);

        release.notify_one();
        assert!(insert.await.unwrap().is_ok());
    }
}
