//! Defect operations: listing, creation, field updates, the status
//! transition, deletion, export, and reporting.

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use snag_core::{
    model::{DESCRIPTION_MAX, TITLE_MAX},
    Caller, Defect, DefectId, Error, Priority, ProjectId, Result, StageId, Timestamp, UserId,
};
use snag_policy::{Action, PermissionMatrix};
use snag_query::{
    DefectFilter, Page, Paged, QueryPlan, RawDefectFilter, RawStatsFilter, Sort, StatsFilter,
    StatsSummary, StatusCount,
};
use snag_state::WorkflowPolicy;
use snag_store::{DefectStore, ProjectStore};

/// Raw listing parameters as one wire shape: filters plus sort plus
/// pagination, all optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListDefectsParams {
    #[serde(flatten)]
    pub filter: RawDefectFilter,
    pub sort: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Input for defect creation. Status is not an input; every defect is
/// born `new`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDefectInput {
    pub title: String,
    pub project_id: Uuid,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
    #[serde(default)]
    pub due_date: Option<chrono::NaiveDate>,
}

/// Partial field update. Fields left out stay untouched; the status
/// field is rejected outright, it has its own operation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDefectInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
    #[serde(default)]
    pub stage_id: Option<Uuid>,
    #[serde(default)]
    pub due_date: Option<chrono::NaiveDate>,
    /// Present only to reject attempts to smuggle a status change through
    /// the field update path.
    #[serde(default)]
    pub status: Option<serde_json::Value>,
}

pub struct DefectService {
    store: Arc<dyn DefectStore>,
    projects: Arc<dyn ProjectStore>,
    workflow: Arc<WorkflowPolicy>,
    matrix: Arc<PermissionMatrix>,
}

impl DefectService {
    pub fn new(
        store: Arc<dyn DefectStore>,
        projects: Arc<dyn ProjectStore>,
        workflow: Arc<WorkflowPolicy>,
        matrix: Arc<PermissionMatrix>,
    ) -> Self {
        Self {
            store,
            projects,
            workflow,
            matrix,
        }
    }

    /// Paginated listing. Shares its predicate and ordering construction
    /// with [`DefectService::export`]; only the page differs.
    pub async fn list(&self, params: &ListDefectsParams) -> Result<Paged<Defect>> {
        let plan = QueryPlan::build(
            DefectFilter::from_raw(&params.filter)?,
            Sort::parse(params.sort.as_deref())?,
            Some(Page::from_raw(
                params.limit.as_deref(),
                params.offset.as_deref(),
            )),
        );
        self.store.query_defects(&plan).await
    }

    pub async fn get(&self, id: DefectId) -> Result<Defect> {
        self.store
            .get_defect(id)
            .await?
            .ok_or_else(|| Error::not_found("defect"))
    }

    /// Create a defect. Status is forced to `new` and priority defaults
    /// to `med`.
    pub async fn create(&self, input: CreateDefectInput) -> Result<DefectId> {
        let title = validate_title(&input.title)?;
        if let Some(description) = &input.description {
            validate_description(description)?;
        }
        let project_id = ProjectId::from(input.project_id);
        if self.projects.get_project(project_id).await?.is_none() {
            return Err(Error::not_found("project"));
        }

        let now = Timestamp::now();
        let defect = Defect {
            id: DefectId::new(),
            project_id,
            stage_id: None,
            title,
            description: input.description,
            priority: input.priority.unwrap_or_default(),
            assignee_id: input.assignee_id.map(UserId::from),
            status: snag_core::DefectStatus::New,
            due_date: input.due_date,
            created_at: now,
            updated_at: now,
        };
        let id = defect.id;
        self.store.insert_defect(defect).await?;
        tracing::info!(defect_id = %id, "defect created");
        Ok(id)
    }

    /// Apply a partial field update. Never touches status.
    pub async fn update_fields(&self, id: DefectId, input: UpdateDefectInput) -> Result<Defect> {
        if input.status.is_some() {
            return Err(Error::validation(
                "status cannot be changed through a field update; use the status transition",
            ));
        }

        let mut defect = self.get(id).await?;
        if let Some(title) = &input.title {
            defect.title = validate_title(title)?;
        }
        if let Some(description) = input.description {
            validate_description(&description)?;
            defect.description = Some(description);
        }
        if let Some(priority) = input.priority {
            defect.priority = priority;
        }
        if let Some(assignee_id) = input.assignee_id {
            defect.assignee_id = Some(UserId::from(assignee_id));
        }
        if let Some(stage_id) = input.stage_id {
            defect.stage_id = Some(StageId::from(stage_id));
        }
        if let Some(due_date) = input.due_date {
            defect.due_date = Some(due_date);
        }
        defect.updated_at = Timestamp::now();

        self.store.update_defect(defect.clone()).await?;
        Ok(defect)
    }

    /// Execute a status transition for the caller.
    ///
    /// Reads the defect, lets the workflow policy decide (structure first,
    /// then authorization), and writes conditionally against the status it
    /// read; a concurrent transition surfaces as a conflict rather than a
    /// silent overwrite.
    pub async fn transition(
        &self,
        id: DefectId,
        target_raw: &str,
        caller: &Caller,
    ) -> Result<Defect> {
        let defect = self.get(id).await?;
        let target = self
            .workflow
            .plan(defect.status, target_raw.trim(), &caller.roles)?;
        let updated = self
            .store
            .transition_defect(id, defect.status, target, Timestamp::now())
            .await?;
        tracing::info!(
            defect_id = %id,
            from = %defect.status,
            to = %target,
            "defect status transitioned"
        );
        Ok(updated)
    }

    pub async fn delete(&self, id: DefectId, caller: &Caller) -> Result<()> {
        self.matrix
            .authorize(caller, &Action::DeleteDefect)
            .require()?;
        if !self.store.delete_defect(id).await? {
            return Err(Error::not_found("defect"));
        }
        tracing::info!(defect_id = %id, "defect deleted");
        Ok(())
    }

    /// The complete filtered, ordered defect set for an export renderer.
    ///
    /// The role gate runs before any filter is parsed or any plan built; a
    /// denied caller causes no query work at all. Never truncates.
    pub async fn export(
        &self,
        filter: &RawDefectFilter,
        sort: Option<&str>,
        caller: &Caller,
    ) -> Result<Vec<Defect>> {
        self.matrix
            .authorize(caller, &Action::ExportDefects)
            .require()?;
        let plan = QueryPlan::build(
            DefectFilter::from_raw(filter)?,
            Sort::parse(sort)?,
            None,
        );
        Ok(self.store.query_defects(&plan).await?.items)
    }

    pub async fn stats_summary(&self, raw: &RawStatsFilter) -> Result<StatsSummary> {
        let filter = StatsFilter::from_raw(raw)?;
        self.store.stats_summary(&filter).await
    }

    pub async fn status_distribution(&self, raw: &RawStatsFilter) -> Result<Vec<StatusCount>> {
        let filter = StatsFilter::from_raw(raw)?;
        self.store.status_distribution(&filter).await
    }
}

fn validate_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(Error::validation("title is required"));
    }
    if title.chars().count() > TITLE_MAX {
        return Err(Error::validation(format!(
            "title exceeds {TITLE_MAX} characters"
        )));
    }
    Ok(title.to_string())
}

fn validate_description(description: &str) -> Result<()> {
    if description.chars().count() > DESCRIPTION_MAX {
        return Err(Error::validation(format!(
            "description exceeds {DESCRIPTION_MAX} characters"
        )));
    }
    Ok(())
}
