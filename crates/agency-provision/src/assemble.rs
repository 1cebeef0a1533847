//! Post-commit read-back into [`GeneratedProjectView`]
//!
//! Runs only after every step succeeded. A failure here is reported next
//! to the project id; the committed rows are kept.

use crate::config::dashboard_url;
use crate::error::AssemblyError;
use agency_model::{
    ClientView, GeneratedProjectView, PaymentView, PhaseId, PhaseView, ProjectId, TeamMemberView,
};
use agency_store::{ClientDirectory, ProfileDirectory, ResourceStore};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub struct ResponseAssembler {
    store: Arc<dyn ResourceStore>,
    clients: Arc<dyn ClientDirectory>,
    profiles: Arc<dyn ProfileDirectory>,
    dashboard_base_url: String,
}

impl fmt::Debug for ResponseAssembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseAssembler")
            .field("dashboard_base_url", &self.dashboard_base_url)
            .finish_non_exhaustive()
    }
}

impl ResponseAssembler {
    #[must_use]
    pub fn new(
        store: Arc<dyn ResourceStore>,
        clients: Arc<dyn ClientDirectory>,
        profiles: Arc<dyn ProfileDirectory>,
        dashboard_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            clients,
            profiles,
            dashboard_base_url: dashboard_base_url.into(),
        }
    }

    /// Read the project and its children back
    ///
    /// # Errors
    /// `AssemblyError` when a read fails or a referenced record is absent
    pub async fn assemble(
        &self,
        project_id: ProjectId,
    ) -> Result<GeneratedProjectView, AssemblyError> {
        let project = self
            .store
            .get_project(project_id)
            .await?
            .ok_or(AssemblyError::ProjectMissing(project_id))?;

        let client = self
            .clients
            .get_client(project.client_id)
            .await?
            .ok_or(AssemblyError::ClientMissing(project.client_id))?;

        let phases = self.store.list_phases(project_id).await?;
        let phase_ids: Vec<PhaseId> = phases.iter().map(|p| p.id).collect();
        let mut task_counts: HashMap<PhaseId, usize> = HashMap::new();
        for task in self.store.list_tasks(&phase_ids).await? {
            *task_counts.entry(task.phase_id).or_default() += 1;
        }

        let mut team_members = Vec::new();
        for member in self.store.list_members(project_id).await? {
            let profile = self
                .profiles
                .get_profile(member.profile_id)
                .await?
                .ok_or(AssemblyError::ProfileMissing(member.profile_id))?;
            team_members.push(TeamMemberView {
                id: member.id,
                name: profile.full_name,
                role: member.role,
            });
        }

        let payments = self
            .store
            .list_payments(project_id)
            .await?
            .into_iter()
            .map(|p| PaymentView {
                name: p.name,
                amount: p.amount,
                due_date: p.due_date,
            })
            .collect();

        Ok(GeneratedProjectView {
            id: project.id,
            name: project.name,
            client: ClientView {
                id: client.id,
                name: client.name,
                company: client.company,
            },
            phases: phases
                .iter()
                .map(|phase| PhaseView {
                    id: phase.id,
                    name: phase.name.clone(),
                    duration: phase.duration_days(),
                    task_count: task_counts.get(&phase.id).copied().unwrap_or(0),
                })
                .collect(),
            team_members,
            payments,
            dashboard_url: dashboard_url(&self.dashboard_base_url, project.id),
            total_budget: project.total_budget,
            currency: project.currency,
            start_date: project.start_date,
            end_date: project.end_date,
            status: project.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agency_model::{Client, ClientId, NewProject, ProjectStatus};
    use agency_store::{InMemoryDirectory, InMemoryStore};

    #[tokio::test]
    async fn missing_project_is_reported() {
        let directory = Arc::new(InMemoryDirectory::new());
        let assembler = ResponseAssembler::new(
            Arc::new(InMemoryStore::new()),
            directory.clone(),
            directory,
            "http://localhost:3000",
        );
        let id = ProjectId::new();
        assert!(matches!(
            assembler.assemble(id).await,
            Err(AssemblyError::ProjectMissing(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn bare_project_assembles_with_empty_children() {
        let store = Arc::new(InMemoryStore::new());
        let client = Client {
            id: ClientId::new(),
            name: "Ada".to_string(),
            company: Some("Analytical Ltd".to_string()),
        };
        let directory = Arc::new(InMemoryDirectory::new().with_client(client.clone()));
        let project = store
            .insert_project(NewProject {
                client_id: client.id,
                name: "Engine".to_string(),
                description: None,
                status: ProjectStatus::Planning,
                start_date: None,
                end_date: None,
                total_budget: 10.0,
                currency: "EUR".to_string(),
            })
            .await
            .unwrap();

        let assembler =
            ResponseAssembler::new(store, directory.clone(), directory, "https://portal.test");
        let view = assembler.assemble(project.id).await.unwrap();
        assert_eq!(view.client.company.as_deref(), Some("Analytical Ltd"));
        assert!(view.phases.is_empty());
        assert!(view.team_members.is_empty());
        assert_eq!(
            view.dashboard_url,
            format!("https://portal.test/client-dashboard/{}", project.id)
        );
    }
}
