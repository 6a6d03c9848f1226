//! Project and stage plumbing: listing and minimal creation.

use std::sync::Arc;

use serde::Deserialize;

use snag_core::{Error, Project, ProjectId, Result, Stage, Timestamp};
use snag_query::{Page, Paged};
use snag_store::{ProjectStore, StageStore};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectInput {
    pub name: String,
    #[serde(default)]
    pub customer: Option<String>,
}

pub struct ProjectService {
    projects: Arc<dyn ProjectStore>,
    stages: Arc<dyn StageStore>,
}

impl ProjectService {
    pub fn new(projects: Arc<dyn ProjectStore>, stages: Arc<dyn StageStore>) -> Self {
        Self { projects, stages }
    }

    /// Projects newest first, optionally name-filtered.
    pub async fn list(
        &self,
        q: Option<&str>,
        limit: Option<&str>,
        offset: Option<&str>,
    ) -> Result<Paged<Project>> {
        let q = q.map(str::trim).filter(|q| !q.is_empty());
        let page = Page::from_raw(limit, offset);
        self.projects.list_projects(q, page).await
    }

    pub async fn create(&self, input: CreateProjectInput) -> Result<Project> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::validation("project name is required"));
        }
        let now = Timestamp::now();
        let project = Project {
            id: ProjectId::new(),
            name,
            customer: input.customer,
            created_at: now,
            updated_at: now,
        };
        self.projects.insert_project(project.clone()).await?;
        Ok(project)
    }

    /// Stages of a project, by name.
    pub async fn list_stages(
        &self,
        project_id: ProjectId,
        limit: Option<&str>,
        offset: Option<&str>,
    ) -> Result<Paged<Stage>> {
        if self.projects.get_project(project_id).await?.is_none() {
            return Err(Error::not_found("project"));
        }
        let page = Page::from_raw(limit, offset);
        self.stages.list_stages(project_id, page).await
    }
}
