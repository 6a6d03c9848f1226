//! Repository traits, one per aggregate.
//!
//! All methods return the workspace error taxonomy; implementations map
//! driver failures to `Error::Storage` and never leak driver detail
//! upward. Deletion methods return whether a record was removed so the
//! service can surface `NotFound` uniformly.

use async_trait::async_trait;

use snag_core::{
    Attachment, AttachmentId, Comment, CommentId, Defect, DefectId, DefectStatus, Project,
    ProjectId, Result, Stage, StageId, Timestamp, User, UserId,
};
use snag_query::{Page, Paged, QueryPlan, StatsFilter, StatsSummary, StatusCount};

/// Defect persistence, including the conditional status write and the
/// reporting aggregates.
#[async_trait]
pub trait DefectStore: Send + Sync {
    async fn insert_defect(&self, defect: Defect) -> Result<()>;

    async fn get_defect(&self, id: DefectId) -> Result<Option<Defect>>;

    /// Execute a query plan. With a page, items are the window and total
    /// is the full matching count; without one, items are the complete
    /// filtered ordered set.
    async fn query_defects(&self, plan: &QueryPlan) -> Result<Paged<Defect>>;

    /// Persist a full-field update (everything except status).
    async fn update_defect(&self, defect: Defect) -> Result<()>;

    /// Compare-and-swap status write: succeeds only if the stored status
    /// still equals `expected`, setting `status = target` and
    /// `updated_at = now` and returning the updated record. Fails with
    /// `NotFound` if the defect is gone and `Conflict` if the status
    /// moved since it was read.
    async fn transition_defect(
        &self,
        id: DefectId,
        expected: DefectStatus,
        target: DefectStatus,
        now: Timestamp,
    ) -> Result<Defect>;

    /// Returns whether a record was deleted.
    async fn delete_defect(&self, id: DefectId) -> Result<bool>;

    async fn stats_summary(&self, filter: &StatsFilter) -> Result<StatsSummary>;

    async fn status_distribution(&self, filter: &StatsFilter) -> Result<Vec<StatusCount>>;
}

/// Comment persistence. Append and delete only.
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn insert_comment(&self, comment: Comment) -> Result<()>;

    async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>>;

    /// Comments for a defect, oldest first.
    async fn list_comments(&self, defect_id: DefectId, page: Page) -> Result<Paged<Comment>>;

    async fn delete_comment(&self, id: CommentId) -> Result<bool>;
}

/// Attachment metadata persistence. Append and delete only; the bytes
/// live in the blob store.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn insert_attachment(&self, attachment: Attachment) -> Result<()>;

    async fn get_attachment(&self, id: AttachmentId) -> Result<Option<Attachment>>;

    /// Attachments for a defect, oldest first.
    async fn list_attachments(&self, defect_id: DefectId) -> Result<Vec<Attachment>>;

    async fn delete_attachment(&self, id: AttachmentId) -> Result<bool>;
}

/// User persistence, including role memberships.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: User) -> Result<()>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// All users, newest first.
    async fn list_users(&self) -> Result<Vec<User>>;

    async fn delete_user(&self, id: UserId) -> Result<bool>;
}

/// Project persistence.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn insert_project(&self, project: Project) -> Result<()>;

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>>;

    /// Projects newest first, optionally name-filtered (case-insensitive
    /// substring).
    async fn list_projects(&self, q: Option<&str>, page: Page) -> Result<Paged<Project>>;
}

/// Stage persistence.
#[async_trait]
pub trait StageStore: Send + Sync {
    async fn insert_stage(&self, stage: Stage) -> Result<()>;

    async fn get_stage(&self, id: StageId) -> Result<Option<Stage>>;

    /// Stages of a project, by name.
    async fn list_stages(&self, project_id: ProjectId, page: Page) -> Result<Paged<Stage>>;
}
