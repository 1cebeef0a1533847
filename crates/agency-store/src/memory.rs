//! In-memory resource store
//!
//! Concurrent maps per collection, with a single write lock so that
//! check-then-insert constraint enforcement is atomic. Lists come back in
//! insertion order.

use crate::error::StoreError;
use crate::resource::ResourceStore;
use agency_model::{
    DashboardConfig, DashboardConfigId, MemberId, NewDashboardConfig, NewPayment, NewPhase,
    NewProject, NewProjectMember, NewTask, PaymentId, PaymentScheduleEntry, Phase, PhaseId,
    Project, ProjectId, ProjectMember, ResourceKind, Task, TaskId,
};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

/// Row counts per collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub projects: usize,
    pub phases: usize,
    pub tasks: usize,
    pub members: usize,
    pub payments: usize,
    pub dashboard_configs: usize,
}

impl ResourceCounts {
    /// Rows across all collections
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.projects
            + self.phases
            + self.tasks
            + self.members
            + self.payments
            + self.dashboard_configs
    }

    /// Count for one kind
    #[inline]
    #[must_use]
    pub fn of(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Project => self.projects,
            ResourceKind::Phase => self.phases,
            ResourceKind::Task => self.tasks,
            ResourceKind::ProjectMember => self.members,
            ResourceKind::PaymentSchedule => self.payments,
            ResourceKind::DashboardConfig => self.dashboard_configs,
        }
    }
}

/// One collection; rows remember their insertion sequence
#[derive(Debug)]
struct Table<K, V>
where
    K: Eq + Hash,
{
    rows: DashMap<K, (u64, V)>,
}

impl<K, V> Default for Table<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }
}

impl<K, V> Table<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn insert(&self, seq: u64, key: K, row: V) {
        self.rows.insert(key, (seq, row));
    }

    fn get(&self, key: &K) -> Option<V> {
        self.rows.get(key).map(|r| r.value().1.clone())
    }

    fn contains(&self, key: &K) -> bool {
        self.rows.contains_key(key)
    }

    fn remove(&self, key: &K) -> bool {
        self.rows.remove(key).is_some()
    }

    fn any(&self, pred: impl Fn(&V) -> bool) -> bool {
        self.rows.iter().any(|r| pred(&r.value().1))
    }

    /// Matching rows in insertion order
    fn select(&self, pred: impl Fn(&V) -> bool) -> Vec<V> {
        let mut rows: Vec<(u64, V)> = self
            .rows
            .iter()
            .filter(|r| pred(&r.value().1))
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        rows.into_iter().map(|(_, row)| row).collect()
    }

    /// Remove matching rows, returning how many went
    fn remove_where(&self, pred: impl Fn(&V) -> bool) -> usize {
        let before = self.rows.len();
        self.rows.retain(|_, (_, row)| !pred(row));
        before - self.rows.len()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Store backed by process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    projects: Table<ProjectId, Project>,
    phases: Table<PhaseId, Phase>,
    tasks: Table<TaskId, Task>,
    members: Table<MemberId, ProjectMember>,
    payments: Table<PaymentId, PaymentScheduleEntry>,
    dashboards: Table<DashboardConfigId, DashboardConfig>,
    write_lock: Mutex<()>,
    sequence: AtomicU64,
    writes: AtomicU64,
}

impl InMemoryStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current row counts
    #[must_use]
    pub fn counts(&self) -> ResourceCounts {
        ResourceCounts {
            projects: self.projects.len(),
            phases: self.phases.len(),
            tasks: self.tasks.len(),
            members: self.members.len(),
            payments: self.payments.len(),
            dashboard_configs: self.dashboards.len(),
        }
    }

    /// Number of successful mutating operations (inserts and deletes)
    #[inline]
    #[must_use]
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    fn next_seq(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    fn record_removals(&self, removed: usize) {
        if removed > 0 {
            self.record_write();
        }
    }

    fn require_project(&self, kind: ResourceKind, id: ProjectId) -> Result<(), StoreError> {
        if self.projects.contains(&id) {
            Ok(())
        } else {
            Err(StoreError::constraint(
                kind,
                format!("project {id} does not exist"),
            ))
        }
    }
}

#[async_trait]
impl ResourceStore for InMemoryStore {
    async fn insert_project(&self, project: NewProject) -> Result<Project, StoreError> {
        let _guard = self.write_lock.lock();
        let project = project.into_project(ProjectId::new());
        self.projects.insert(self.next_seq(), project.id, project.clone());
        self.record_write();
        Ok(project)
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        Ok(self.projects.get(&id))
    }

    async fn delete_project(&self, id: ProjectId) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let referenced = self.phases.any(|p| p.project_id == id)
            || self.members.any(|m| m.project_id == id)
            || self.payments.any(|p| p.project_id == id)
            || self.dashboards.any(|d| d.project_id == id);
        if referenced {
            return Err(StoreError::constraint(
                ResourceKind::Project,
                format!("project {id} is still referenced"),
            ));
        }
        if self.projects.remove(&id) {
            self.record_write();
        }
        Ok(())
    }

    async fn insert_phase(&self, phase: NewPhase) -> Result<Phase, StoreError> {
        let _guard = self.write_lock.lock();
        self.require_project(ResourceKind::Phase, phase.project_id)?;
        let duplicate = self
            .phases
            .any(|p| p.project_id == phase.project_id && p.order_index == phase.order_index);
        if duplicate {
            return Err(StoreError::constraint(
                ResourceKind::Phase,
                format!("order index {} already used", phase.order_index),
            ));
        }
        let phase = phase.into_phase(PhaseId::new());
        self.phases.insert(self.next_seq(), phase.id, phase.clone());
        self.record_write();
        Ok(phase)
    }

    async fn list_phases(&self, project: ProjectId) -> Result<Vec<Phase>, StoreError> {
        let mut phases = self.phases.select(|p| p.project_id == project);
        phases.sort_by_key(|p| p.order_index);
        Ok(phases)
    }

    async fn delete_phases(&self, ids: &[PhaseId]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let referenced = self.tasks.any(|t| ids.contains(&t.phase_id))
            || self
                .payments
                .any(|p| p.phase_id.is_some_and(|id| ids.contains(&id)));
        if referenced {
            return Err(StoreError::constraint(
                ResourceKind::Phase,
                "phase is still referenced by tasks or payments",
            ));
        }
        let removed = self.phases.remove_where(|p| ids.contains(&p.id));
        self.record_removals(removed);
        Ok(())
    }

    async fn insert_task(&self, task: NewTask) -> Result<Task, StoreError> {
        let _guard = self.write_lock.lock();
        if !self.phases.contains(&task.phase_id) {
            return Err(StoreError::constraint(
                ResourceKind::Task,
                format!("phase {} does not exist", task.phase_id),
            ));
        }
        let task = task.into_task(TaskId::new());
        self.tasks.insert(self.next_seq(), task.id, task.clone());
        self.record_write();
        Ok(task)
    }

    async fn list_tasks(&self, phases: &[PhaseId]) -> Result<Vec<Task>, StoreError> {
        Ok(self.tasks.select(|t| phases.contains(&t.phase_id)))
    }

    async fn delete_tasks(&self, ids: &[TaskId]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let removed = self.tasks.remove_where(|t| ids.contains(&t.id));
        self.record_removals(removed);
        Ok(())
    }

    async fn delete_tasks_for_phases(&self, phases: &[PhaseId]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let removed = self.tasks.remove_where(|t| phases.contains(&t.phase_id));
        self.record_removals(removed);
        Ok(())
    }

    async fn insert_member(&self, member: NewProjectMember) -> Result<ProjectMember, StoreError> {
        let _guard = self.write_lock.lock();
        self.require_project(ResourceKind::ProjectMember, member.project_id)?;
        let member = member.into_member(MemberId::new());
        self.members.insert(self.next_seq(), member.id, member.clone());
        self.record_write();
        Ok(member)
    }

    async fn list_members(&self, project: ProjectId) -> Result<Vec<ProjectMember>, StoreError> {
        Ok(self.members.select(|m| m.project_id == project))
    }

    async fn delete_members(&self, ids: &[MemberId]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let removed = self.members.remove_where(|m| ids.contains(&m.id));
        self.record_removals(removed);
        Ok(())
    }

    async fn insert_payment(
        &self,
        payment: NewPayment,
    ) -> Result<PaymentScheduleEntry, StoreError> {
        let _guard = self.write_lock.lock();
        self.require_project(ResourceKind::PaymentSchedule, payment.project_id)?;
        if let Some(phase_id) = payment.phase_id {
            if !self.phases.contains(&phase_id) {
                return Err(StoreError::constraint(
                    ResourceKind::PaymentSchedule,
                    format!("phase {phase_id} does not exist"),
                ));
            }
        }
        let entry = payment.into_entry(PaymentId::new());
        self.payments.insert(self.next_seq(), entry.id, entry.clone());
        self.record_write();
        Ok(entry)
    }

    async fn list_payments(
        &self,
        project: ProjectId,
    ) -> Result<Vec<PaymentScheduleEntry>, StoreError> {
        Ok(self.payments.select(|p| p.project_id == project))
    }

    async fn delete_payments(&self, ids: &[PaymentId]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let removed = self.payments.remove_where(|p| ids.contains(&p.id));
        self.record_removals(removed);
        Ok(())
    }

    async fn insert_dashboard_config(
        &self,
        config: NewDashboardConfig,
    ) -> Result<DashboardConfig, StoreError> {
        let _guard = self.write_lock.lock();
        self.require_project(ResourceKind::DashboardConfig, config.project_id)?;
        if self.dashboards.any(|d| d.project_id == config.project_id) {
            return Err(StoreError::constraint(
                ResourceKind::DashboardConfig,
                "project already has a dashboard config",
            ));
        }
        let config = config.into_config(DashboardConfigId::new());
        self.dashboards.insert(self.next_seq(), config.id, config.clone());
        self.record_write();
        Ok(config)
    }

    async fn get_dashboard_config(
        &self,
        project: ProjectId,
    ) -> Result<Option<DashboardConfig>, StoreError> {
        Ok(self
            .dashboards
            .select(|d| d.project_id == project)
            .into_iter()
            .next())
    }

    async fn delete_dashboard_config(&self, id: DashboardConfigId) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        if self.dashboards.remove(&id) {
            self.record_write();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agency_model::{ClientId, ProjectStatus, TaskPriority};
    use pretty_assertions::assert_eq;

    fn new_project() -> NewProject {
        NewProject {
            client_id: ClientId::new(),
            name: "Rebrand".to_string(),
            description: None,
            status: ProjectStatus::Planning,
            start_date: None,
            end_date: None,
            total_budget: 1000.0,
            currency: "USD".to_string(),
        }
    }

    fn new_phase(project_id: ProjectId, order_index: u32) -> NewPhase {
        NewPhase {
            project_id,
            name: format!("phase-{order_index}"),
            description: None,
            start_date: None,
            end_date: None,
            order_index,
        }
    }

    #[tokio::test]
    async fn phases_list_in_order_index_order() {
        let store = InMemoryStore::new();
        let project = store.insert_project(new_project()).await.unwrap();
        store.insert_phase(new_phase(project.id, 1)).await.unwrap();
        store.insert_phase(new_phase(project.id, 0)).await.unwrap();

        let phases = store.list_phases(project.id).await.unwrap();
        let order: Vec<u32> = phases.iter().map(|p| p.order_index).collect();
        assert_eq!(order, vec![0, 1]);
    }

    #[tokio::test]
    async fn duplicate_order_index_is_rejected() {
        let store = InMemoryStore::new();
        let project = store.insert_project(new_project()).await.unwrap();
        store.insert_phase(new_phase(project.id, 0)).await.unwrap();

        let err = store.insert_phase(new_phase(project.id, 0)).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint { kind: ResourceKind::Phase, .. }));
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let store = InMemoryStore::new();
        let err = store.insert_phase(new_phase(ProjectId::new(), 0)).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint { .. }));

        let err = store
            .insert_task(NewTask {
                phase_id: PhaseId::new(),
                title: "orphan".to_string(),
                description: None,
                estimated_hours: 1.0,
                priority: TaskPriority::Low,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint { kind: ResourceKind::Task, .. }));
        assert_eq!(store.counts().total(), 0);
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn referenced_rows_cannot_be_deleted() {
        let store = InMemoryStore::new();
        let project = store.insert_project(new_project()).await.unwrap();
        let phase = store.insert_phase(new_phase(project.id, 0)).await.unwrap();
        store
            .insert_task(NewTask {
                phase_id: phase.id,
                title: "t".to_string(),
                description: None,
                estimated_hours: 1.0,
                priority: TaskPriority::Medium,
            })
            .await
            .unwrap();

        assert!(store.delete_project(project.id).await.is_err());
        assert!(store.delete_phases(&[phase.id]).await.is_err());

        store.delete_tasks_for_phases(&[phase.id]).await.unwrap();
        store.delete_phases(&[phase.id]).await.unwrap();
        store.delete_project(project.id).await.unwrap();
        assert_eq!(store.counts(), ResourceCounts::default());
    }

    #[tokio::test]
    async fn deletes_are_idempotent() {
        let store = InMemoryStore::new();
        let project = store.insert_project(new_project()).await.unwrap();
        store.delete_project(project.id).await.unwrap();
        let writes = store.writes();

        store.delete_project(project.id).await.unwrap();
        assert_eq!(store.writes(), writes);
    }

    #[tokio::test]
    async fn one_dashboard_per_project() {
        let store = InMemoryStore::new();
        let project = store.insert_project(new_project()).await.unwrap();
        let config = NewDashboardConfig {
            project_id: project.id,
            settings: agency_model::DashboardSettings::default(),
        };
        store.insert_dashboard_config(config.clone()).await.unwrap();
        assert!(store.insert_dashboard_config(config).await.is_err());
        assert_eq!(store.counts().of(ResourceKind::DashboardConfig), 1);
    }
}
