//! PostgreSQL store over sqlx.
//!
//! All SQL is runtime-checked (`sqlx::query`, not `sqlx::query!`) so the
//! workspace builds without a database. Row structs derive `FromRow` and
//! convert into the domain records, parsing the status/priority text
//! columns through the same `FromStr` ingress every other input uses.
//!
//! The WHERE and ORDER BY of a defect read are rendered from the shared
//! `QueryPlan` by one function pair, used by the row query, the count
//! query, and the export path alike.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use snag_core::{
    Attachment, AttachmentId, Comment, CommentId, Defect, DefectId, DefectStatus, Error, Priority,
    Project, ProjectId, Result, Role, RoleSet, Stage, StageId, Timestamp, User, UserId,
};
use snag_query::{
    DefectFilter, Page, Paged, QueryPlan, SortDir, SortKey, StatsFilter, StatsSummary, StatusCount,
};

use crate::traits::{
    AttachmentStore, CommentStore, DefectStore, ProjectStore, StageStore, UserStore,
};

/// PostgreSQL-backed store. Cheap to clone; wraps the connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Storage(e.to_string()))
    }
}

fn db_err(e: sqlx::Error) -> Error {
    Error::Storage(e.to_string())
}

fn corrupt(column: &str, value: &str) -> Error {
    Error::Storage(format!("corrupt {column} column: {value:?}"))
}

// ─── Row types ───────────────────────────────────────────────────────

const DEFECT_COLUMNS: &str = "id, project_id, stage_id, title, description, priority, \
     assignee_id, status, due_date, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct DefectRow {
    id: Uuid,
    project_id: Uuid,
    stage_id: Option<Uuid>,
    title: String,
    description: Option<String>,
    priority: String,
    assignee_id: Option<Uuid>,
    status: String,
    due_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DefectRow> for Defect {
    type Error = Error;

    fn try_from(row: DefectRow) -> Result<Self> {
        Ok(Defect {
            id: DefectId::from(row.id),
            project_id: ProjectId::from(row.project_id),
            stage_id: row.stage_id.map(StageId::from),
            title: row.title,
            description: row.description,
            priority: Priority::from_str(&row.priority)
                .map_err(|_| corrupt("priority", &row.priority))?,
            assignee_id: row.assignee_id.map(UserId::from),
            status: DefectStatus::from_str(&row.status)
                .map_err(|_| corrupt("status", &row.status))?,
            due_date: row.due_date,
            created_at: Timestamp::from_utc(row.created_at),
            updated_at: Timestamp::from_utc(row.updated_at),
        })
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    defect_id: Uuid,
    author_id: Uuid,
    text: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: CommentId::from(row.id),
            defect_id: DefectId::from(row.defect_id),
            author_id: UserId::from(row.author_id),
            text: row.text,
            created_at: Timestamp::from_utc(row.created_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct AttachmentRow {
    id: Uuid,
    defect_id: Uuid,
    author_id: Uuid,
    file_name: String,
    mime_type: String,
    size_bytes: i64,
    storage_path: String,
    created_at: DateTime<Utc>,
}

impl From<AttachmentRow> for Attachment {
    fn from(row: AttachmentRow) -> Self {
        Attachment {
            id: AttachmentId::from(row.id),
            defect_id: DefectId::from(row.defect_id),
            author_id: UserId::from(row.author_id),
            file_name: row.file_name,
            mime_type: row.mime_type,
            size_bytes: row.size_bytes,
            storage_path: row.storage_path,
            created_at: Timestamp::from_utc(row.created_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    full_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: Uuid,
    name: String,
    customer: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: ProjectId::from(row.id),
            name: row.name,
            customer: row.customer,
            created_at: Timestamp::from_utc(row.created_at),
            updated_at: Timestamp::from_utc(row.updated_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct StageRow {
    id: Uuid,
    project_id: Uuid,
    name: String,
    status: String,
}

impl From<StageRow> for Stage {
    fn from(row: StageRow) -> Self {
        Stage {
            id: StageId::from(row.id),
            project_id: ProjectId::from(row.project_id),
            name: row.name,
            status: row.status,
        }
    }
}

// ─── Plan rendering ──────────────────────────────────────────────────

fn and(qb: &mut QueryBuilder<'_, Postgres>, first: &mut bool) {
    if *first {
        qb.push(" WHERE ");
        *first = false;
    } else {
        qb.push(" AND ");
    }
}

/// Escape LIKE metacharacters; the default Postgres escape is backslash.
fn like_pattern(q: &str) -> String {
    let escaped = q
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Render the filter predicates. This is the one rendering of the plan's
/// predicates; the row, count, and export queries all call it.
fn push_defect_where(qb: &mut QueryBuilder<'_, Postgres>, filter: &DefectFilter) {
    let mut first = true;
    if let Some(status) = filter.status {
        and(qb, &mut first);
        qb.push("status = ").push_bind(status.as_str());
    }
    if let Some(priority) = filter.priority {
        and(qb, &mut first);
        qb.push("priority = ").push_bind(priority.as_str());
    }
    if let Some(project_id) = filter.project_id {
        and(qb, &mut first);
        qb.push("project_id = ").push_bind(*project_id.as_uuid());
    }
    if let Some(assignee_id) = filter.assignee_id {
        and(qb, &mut first);
        qb.push("assignee_id = ").push_bind(*assignee_id.as_uuid());
    }
    if let Some(q) = &filter.q {
        let pattern = like_pattern(q);
        and(qb, &mut first);
        qb.push("(title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Render the plan's ordering. Postgres defaults (NULLS LAST ascending,
/// NULLS FIRST descending) match `QueryPlan::compare`; the id tie-break
/// keeps pagination windows disjoint.
fn push_defect_order(qb: &mut QueryBuilder<'_, Postgres>, plan: &QueryPlan) {
    let column = match plan.sort.key {
        SortKey::CreatedAt => "created_at",
        SortKey::DueDate => "due_date",
    };
    let dir = match plan.sort.dir {
        SortDir::Asc => "ASC",
        SortDir::Desc => "DESC",
    };
    qb.push(" ORDER BY ")
        .push(column)
        .push(" ")
        .push(dir)
        .push(", id ASC");
}

/// Returns whether any predicate (and therefore a WHERE) was emitted.
fn push_stats_where(
    qb: &mut QueryBuilder<'_, Postgres>,
    filter: &StatsFilter,
    with_period: bool,
) -> bool {
    let mut first = true;
    if let Some(project_id) = filter.project_id {
        and(qb, &mut first);
        qb.push("project_id = ").push_bind(*project_id.as_uuid());
    }
    if let Some(assignee_id) = filter.assignee_id {
        and(qb, &mut first);
        qb.push("assignee_id = ").push_bind(*assignee_id.as_uuid());
    }
    if with_period {
        if let Some(from) = filter.from {
            and(qb, &mut first);
            qb.push("created_at >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            and(qb, &mut first);
            qb.push("created_at < (").push_bind(to).push(" + interval '1 day')");
        }
    }
    !first
}

// ─── DefectStore ─────────────────────────────────────────────────────

#[async_trait]
impl DefectStore for PgStore {
    async fn insert_defect(&self, defect: Defect) -> Result<()> {
        sqlx::query(
            "INSERT INTO defects (id, project_id, stage_id, title, description, priority, \
             assignee_id, status, due_date, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(*defect.id.as_uuid())
        .bind(*defect.project_id.as_uuid())
        .bind(defect.stage_id.map(|s| *s.as_uuid()))
        .bind(&defect.title)
        .bind(&defect.description)
        .bind(defect.priority.as_str())
        .bind(defect.assignee_id.map(|a| *a.as_uuid()))
        .bind(defect.status.as_str())
        .bind(defect.due_date)
        .bind(*defect.created_at.as_datetime())
        .bind(*defect.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_defect(&self, id: DefectId) -> Result<Option<Defect>> {
        let row = sqlx::query_as::<_, DefectRow>(&format!(
            "SELECT {DEFECT_COLUMNS} FROM defects WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(Defect::try_from).transpose()
    }

    async fn query_defects(&self, plan: &QueryPlan) -> Result<Paged<Defect>> {
        let mut qb = QueryBuilder::new(format!("SELECT {DEFECT_COLUMNS} FROM defects"));
        push_defect_where(&mut qb, &plan.filter);
        push_defect_order(&mut qb, plan);
        if let Some(page) = plan.page {
            qb.push(" LIMIT ")
                .push_bind(page.limit)
                .push(" OFFSET ")
                .push_bind(page.offset);
        }
        let rows: Vec<DefectRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        let items: Vec<Defect> = rows
            .into_iter()
            .map(Defect::try_from)
            .collect::<Result<_>>()?;

        let total = if plan.page.is_some() {
            let mut count = QueryBuilder::new("SELECT COUNT(*) FROM defects");
            push_defect_where(&mut count, &plan.filter);
            count
                .build_query_scalar::<i64>()
                .fetch_one(&self.pool)
                .await
                .map_err(db_err)?
        } else {
            items.len() as i64
        };
        Ok(Paged::new(items, total))
    }

    async fn update_defect(&self, defect: Defect) -> Result<()> {
        let result = sqlx::query(
            "UPDATE defects SET stage_id = $1, title = $2, description = $3, priority = $4, \
             assignee_id = $5, due_date = $6, updated_at = $7 WHERE id = $8",
        )
        .bind(defect.stage_id.map(|s| *s.as_uuid()))
        .bind(&defect.title)
        .bind(&defect.description)
        .bind(defect.priority.as_str())
        .bind(defect.assignee_id.map(|a| *a.as_uuid()))
        .bind(defect.due_date)
        .bind(*defect.updated_at.as_datetime())
        .bind(*defect.id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(Error::not_found("defect"));
        }
        Ok(())
    }

    async fn transition_defect(
        &self,
        id: DefectId,
        expected: DefectStatus,
        target: DefectStatus,
        now: Timestamp,
    ) -> Result<Defect> {
        let row = sqlx::query_as::<_, DefectRow>(&format!(
            "UPDATE defects SET status = $1, updated_at = $2 \
             WHERE id = $3 AND status = $4 RETURNING {DEFECT_COLUMNS}"
        ))
        .bind(target.as_str())
        .bind(*now.as_datetime())
        .bind(*id.as_uuid())
        .bind(expected.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => row.try_into(),
            None => {
                // Distinguish a vanished defect from a lost race.
                let current: Option<String> =
                    sqlx::query_scalar("SELECT status FROM defects WHERE id = $1")
                        .bind(*id.as_uuid())
                        .fetch_optional(&self.pool)
                        .await
                        .map_err(db_err)?;
                match current {
                    None => Err(Error::not_found("defect")),
                    Some(status) => Err(Error::Conflict(format!(
                        "defect status changed to {status} since it was read"
                    ))),
                }
            }
        }
    }

    async fn delete_defect(&self, id: DefectId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM defects WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn stats_summary(&self, filter: &StatsFilter) -> Result<StatsSummary> {
        fn and_or_where(has_where: bool, predicate: &str) -> String {
            let keyword = if has_where { "AND" } else { "WHERE" };
            format!(" {keyword} {predicate}")
        }

        let mut created_q = QueryBuilder::new("SELECT COUNT(*) FROM defects");
        push_stats_where(&mut created_q, filter, true);
        let created: i64 = created_q
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        let mut closed_q = QueryBuilder::new("SELECT COUNT(*) FROM defects");
        let has_where = push_stats_where(&mut closed_q, filter, true);
        closed_q.push(and_or_where(has_where, "status = 'closed'"));
        let closed_in_period: i64 = closed_q
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        let mut open_q = QueryBuilder::new("SELECT COUNT(*) FROM defects");
        let has_where = push_stats_where(&mut open_q, filter, false);
        open_q.push(and_or_where(
            has_where,
            "status NOT IN ('closed', 'canceled')",
        ));
        let open_now: i64 = open_q
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        let mut lead_q = QueryBuilder::new(
            "SELECT AVG(EXTRACT(EPOCH FROM (updated_at - created_at)))::float8 FROM defects",
        );
        let has_where = push_stats_where(&mut lead_q, filter, true);
        lead_q.push(and_or_where(has_where, "status = 'closed'"));
        let avg_lead_time_sec: Option<f64> = lead_q
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        let close_rate = if created > 0 {
            Some(closed_in_period as f64 / created as f64)
        } else {
            None
        };
        Ok(StatsSummary {
            created,
            closed_in_period,
            open_now,
            avg_lead_time_sec,
            close_rate,
        })
    }

    async fn status_distribution(&self, filter: &StatsFilter) -> Result<Vec<StatusCount>> {
        let mut qb = QueryBuilder::new("SELECT status, COUNT(*) FROM defects");
        push_stats_where(&mut qb, filter, false);
        qb.push(" GROUP BY status ORDER BY status");
        let rows: Vec<(String, i64)> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter()
            .map(|(status, count)| {
                Ok(StatusCount {
                    status: DefectStatus::from_str(&status)
                        .map_err(|_| corrupt("status", &status))?,
                    count,
                })
            })
            .collect()
    }
}

// ─── CommentStore ────────────────────────────────────────────────────

#[async_trait]
impl CommentStore for PgStore {
    async fn insert_comment(&self, comment: Comment) -> Result<()> {
        sqlx::query(
            "INSERT INTO comments (id, defect_id, author_id, text, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(*comment.id.as_uuid())
        .bind(*comment.defect_id.as_uuid())
        .bind(*comment.author_id.as_uuid())
        .bind(&comment.text)
        .bind(*comment.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>> {
        let row = sqlx::query_as::<_, CommentRow>(
            "SELECT id, defect_id, author_id, text, created_at FROM comments WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(Comment::from))
    }

    async fn list_comments(&self, defect_id: DefectId, page: Page) -> Result<Paged<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            "SELECT id, defect_id, author_id, text, created_at FROM comments \
             WHERE defect_id = $1 ORDER BY created_at ASC, id ASC LIMIT $2 OFFSET $3",
        )
        .bind(*defect_id.as_uuid())
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE defect_id = $1")
            .bind(*defect_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(Paged::new(rows.into_iter().map(Comment::from).collect(), total))
    }

    async fn delete_comment(&self, id: CommentId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}

// ─── AttachmentStore ─────────────────────────────────────────────────

#[async_trait]
impl AttachmentStore for PgStore {
    async fn insert_attachment(&self, attachment: Attachment) -> Result<()> {
        sqlx::query(
            "INSERT INTO attachments (id, defect_id, author_id, file_name, mime_type, \
             size_bytes, storage_path, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(*attachment.id.as_uuid())
        .bind(*attachment.defect_id.as_uuid())
        .bind(*attachment.author_id.as_uuid())
        .bind(&attachment.file_name)
        .bind(&attachment.mime_type)
        .bind(attachment.size_bytes)
        .bind(&attachment.storage_path)
        .bind(*attachment.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_attachment(&self, id: AttachmentId) -> Result<Option<Attachment>> {
        let row = sqlx::query_as::<_, AttachmentRow>(
            "SELECT id, defect_id, author_id, file_name, mime_type, size_bytes, storage_path, \
             created_at FROM attachments WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(Attachment::from))
    }

    async fn list_attachments(&self, defect_id: DefectId) -> Result<Vec<Attachment>> {
        let rows = sqlx::query_as::<_, AttachmentRow>(
            "SELECT id, defect_id, author_id, file_name, mime_type, size_bytes, storage_path, \
             created_at FROM attachments WHERE defect_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(*defect_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(Attachment::from).collect())
    }

    async fn delete_attachment(&self, id: AttachmentId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM attachments WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}

// ─── UserStore ───────────────────────────────────────────────────────

impl PgStore {
    async fn roles_for_user(&self, id: Uuid) -> Result<RoleSet> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT r.name FROM user_roles ur JOIN roles r ON r.id = ur.role_id \
             WHERE ur.user_id = $1 ORDER BY r.name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(names
            .iter()
            .filter_map(|name| name.parse::<Role>().ok())
            .collect())
    }

    async fn hydrate_user(&self, row: UserRow) -> Result<User> {
        let roles = self.roles_for_user(row.id).await?;
        Ok(User {
            id: UserId::from(row.id),
            email: row.email,
            full_name: row.full_name,
            roles,
            created_at: Timestamp::from_utc(row.created_at),
            updated_at: Timestamp::from_utc(row.updated_at),
        })
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: User) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query(
            "INSERT INTO users (id, email, full_name, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(*user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(*user.created_at.as_datetime())
        .bind(*user.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        for role in user.roles.iter() {
            sqlx::query(
                "INSERT INTO user_roles (user_id, role_id) \
                 SELECT $1, id FROM roles WHERE name = $2",
            )
            .bind(*user.id.as_uuid())
            .bind(role.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, full_name, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        match row {
            Some(row) => Ok(Some(self.hydrate_user(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, full_name, created_at, updated_at FROM users \
             WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        match row {
            Some(row) => Ok(Some(self.hydrate_user(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, full_name, created_at, updated_at FROM users \
             ORDER BY created_at DESC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            users.push(self.hydrate_user(row).await?);
        }
        Ok(users)
    }

    async fn delete_user(&self, id: UserId) -> Result<bool> {
        // user_roles rows go with the user via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}

// ─── ProjectStore / StageStore ───────────────────────────────────────

#[async_trait]
impl ProjectStore for PgStore {
    async fn insert_project(&self, project: Project) -> Result<()> {
        sqlx::query(
            "INSERT INTO projects (id, name, customer, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(*project.id.as_uuid())
        .bind(&project.name)
        .bind(&project.customer)
        .bind(*project.created_at.as_datetime())
        .bind(*project.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>> {
        let row = sqlx::query_as::<_, ProjectRow>(
            "SELECT id, name, customer, created_at, updated_at FROM projects WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(Project::from))
    }

    async fn list_projects(&self, q: Option<&str>, page: Page) -> Result<Paged<Project>> {
        let mut qb = QueryBuilder::new(
            "SELECT id, name, customer, created_at, updated_at FROM projects",
        );
        if let Some(q) = q {
            qb.push(" WHERE name ILIKE ").push_bind(like_pattern(q));
        }
        qb.push(" ORDER BY created_at DESC, id ASC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);
        let rows: Vec<ProjectRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM projects");
        if let Some(q) = q {
            count.push(" WHERE name ILIKE ").push_bind(like_pattern(q));
        }
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(Paged::new(rows.into_iter().map(Project::from).collect(), total))
    }
}

#[async_trait]
impl StageStore for PgStore {
    async fn insert_stage(&self, stage: Stage) -> Result<()> {
        sqlx::query(
            "INSERT INTO stages (id, project_id, name, status) VALUES ($1, $2, $3, $4)",
        )
        .bind(*stage.id.as_uuid())
        .bind(*stage.project_id.as_uuid())
        .bind(&stage.name)
        .bind(&stage.status)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_stage(&self, id: StageId) -> Result<Option<Stage>> {
        let row = sqlx::query_as::<_, StageRow>(
            "SELECT id, project_id, name, status FROM stages WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(Stage::from))
    }

    async fn list_stages(&self, project_id: ProjectId, page: Page) -> Result<Paged<Stage>> {
        let rows = sqlx::query_as::<_, StageRow>(
            "SELECT id, project_id, name, status FROM stages \
             WHERE project_id = $1 ORDER BY name ASC, id ASC LIMIT $2 OFFSET $3",
        )
        .bind(*project_id.as_uuid())
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stages WHERE project_id = $1")
            .bind(*project_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(Paged::new(rows.into_iter().map(Stage::from).collect(), total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("50%_done"), "%50\\%\\_done%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
        assert_eq!(like_pattern("login"), "%login%");
    }
}
