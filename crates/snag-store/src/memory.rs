//! In-memory store. Backs the test suites and local demos; implements
//! every repository trait with the same observable behavior as the
//! PostgreSQL store, including the conditional transition write.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use snag_core::{
    Attachment, AttachmentId, Comment, CommentId, Defect, DefectId, DefectStatus, Error, Project,
    ProjectId, Result, Stage, StageId, Timestamp, User, UserId,
};
use snag_query::{Page, Paged, QueryPlan, StatsFilter, StatsSummary, StatusCount};

use crate::traits::{
    AttachmentStore, CommentStore, DefectStore, ProjectStore, StageStore, UserStore,
};

/// Hash-map backed store guarded by per-aggregate locks. Locks are held
/// only across synchronous sections, never across awaits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    defects: RwLock<HashMap<DefectId, Defect>>,
    comments: RwLock<HashMap<CommentId, Comment>>,
    attachments: RwLock<HashMap<AttachmentId, Attachment>>,
    users: RwLock<HashMap<UserId, User>>,
    projects: RwLock<HashMap<ProjectId, Project>>,
    stages: RwLock<HashMap<StageId, Stage>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// A poisoned lock only means another test thread panicked mid-write;
// recover the guard rather than cascading the panic.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn window<T: Clone>(mut items: Vec<T>, page: Option<Page>) -> Paged<T> {
    let total = items.len() as i64;
    if let Some(page) = page {
        let start = (page.offset as usize).min(items.len());
        let end = (start + page.limit as usize).min(items.len());
        items = items[start..end].to_vec();
    }
    Paged::new(items, total)
}

fn stats_matches(defect: &Defect, filter: &StatsFilter, with_period: bool) -> bool {
    if let Some(project_id) = filter.project_id {
        if defect.project_id != project_id {
            return false;
        }
    }
    if let Some(assignee_id) = filter.assignee_id {
        if defect.assignee_id != Some(assignee_id) {
            return false;
        }
    }
    if with_period {
        let created = defect.created_at.as_datetime().date_naive();
        if let Some(from) = filter.from {
            if created < from {
                return false;
            }
        }
        if let Some(to) = filter.to {
            if created > to {
                return false;
            }
        }
    }
    true
}

#[async_trait]
impl DefectStore for MemoryStore {
    async fn insert_defect(&self, defect: Defect) -> Result<()> {
        write(&self.defects).insert(defect.id, defect);
        Ok(())
    }

    async fn get_defect(&self, id: DefectId) -> Result<Option<Defect>> {
        Ok(read(&self.defects).get(&id).cloned())
    }

    async fn query_defects(&self, plan: &QueryPlan) -> Result<Paged<Defect>> {
        let mut items: Vec<Defect> = read(&self.defects)
            .values()
            .filter(|d| plan.matches(d))
            .cloned()
            .collect();
        items.sort_by(|a, b| plan.compare(a, b));
        Ok(window(items, plan.page))
    }

    async fn update_defect(&self, defect: Defect) -> Result<()> {
        let mut defects = write(&self.defects);
        if !defects.contains_key(&defect.id) {
            return Err(Error::not_found("defect"));
        }
        defects.insert(defect.id, defect);
        Ok(())
    }

    async fn transition_defect(
        &self,
        id: DefectId,
        expected: DefectStatus,
        target: DefectStatus,
        now: Timestamp,
    ) -> Result<Defect> {
        let mut defects = write(&self.defects);
        let defect = defects.get_mut(&id).ok_or_else(|| Error::not_found("defect"))?;
        if defect.status != expected {
            return Err(Error::Conflict(format!(
                "defect status changed to {} since it was read",
                defect.status
            )));
        }
        defect.status = target;
        defect.updated_at = now;
        Ok(defect.clone())
    }

    async fn delete_defect(&self, id: DefectId) -> Result<bool> {
        Ok(write(&self.defects).remove(&id).is_some())
    }

    async fn stats_summary(&self, filter: &StatsFilter) -> Result<StatsSummary> {
        let defects = read(&self.defects);
        let in_period: Vec<&Defect> = defects
            .values()
            .filter(|d| stats_matches(d, filter, true))
            .collect();
        let created = in_period.len() as i64;
        let closed: Vec<&&Defect> = in_period
            .iter()
            .filter(|d| d.status == DefectStatus::Closed)
            .collect();
        let closed_in_period = closed.len() as i64;
        let open_now = defects
            .values()
            .filter(|d| stats_matches(d, filter, false) && !d.status.is_terminal())
            .count() as i64;
        let avg_lead_time_sec = if closed.is_empty() {
            None
        } else {
            let total: i64 = closed
                .iter()
                .map(|d| {
                    (*d.updated_at.as_datetime() - *d.created_at.as_datetime()).num_seconds()
                })
                .sum();
            Some(total as f64 / closed.len() as f64)
        };
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
        let defects = read(&self.defects);
        let mut counts: Vec<StatusCount> = DefectStatus::all()
            .iter()
            .map(|status| StatusCount {
                status: *status,
                count: 0,
            })
            .collect();
        for defect in defects.values().filter(|d| stats_matches(d, filter, false)) {
            if let Some(bucket) = counts.iter_mut().find(|c| c.status == defect.status) {
                bucket.count += 1;
            }
        }
        counts.retain(|c| c.count > 0);
        Ok(counts)
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn insert_comment(&self, comment: Comment) -> Result<()> {
        write(&self.comments).insert(comment.id, comment);
        Ok(())
    }

    async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>> {
        Ok(read(&self.comments).get(&id).cloned())
    }

    async fn list_comments(&self, defect_id: DefectId, page: Page) -> Result<Paged<Comment>> {
        let mut items: Vec<Comment> = read(&self.comments)
            .values()
            .filter(|c| c.defect_id == defect_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        Ok(window(items, Some(page)))
    }

    async fn delete_comment(&self, id: CommentId) -> Result<bool> {
        Ok(write(&self.comments).remove(&id).is_some())
    }
}

#[async_trait]
impl AttachmentStore for MemoryStore {
    async fn insert_attachment(&self, attachment: Attachment) -> Result<()> {
        write(&self.attachments).insert(attachment.id, attachment);
        Ok(())
    }

    async fn get_attachment(&self, id: AttachmentId) -> Result<Option<Attachment>> {
        Ok(read(&self.attachments).get(&id).cloned())
    }

    async fn list_attachments(&self, defect_id: DefectId) -> Result<Vec<Attachment>> {
        let mut items: Vec<Attachment> = read(&self.attachments)
            .values()
            .filter(|a| a.defect_id == defect_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        Ok(items)
    }

    async fn delete_attachment(&self, id: AttachmentId) -> Result<bool> {
        Ok(write(&self.attachments).remove(&id).is_some())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: User) -> Result<()> {
        write(&self.users).insert(user.id, user);
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(read(&self.users).get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(read(&self.users)
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = read(&self.users).values().cloned().collect();
        users.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        Ok(users)
    }

    async fn delete_user(&self, id: UserId) -> Result<bool> {
        Ok(write(&self.users).remove(&id).is_some())
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn insert_project(&self, project: Project) -> Result<()> {
        write(&self.projects).insert(project.id, project);
        Ok(())
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>> {
        Ok(read(&self.projects).get(&id).cloned())
    }

    async fn list_projects(&self, q: Option<&str>, page: Page) -> Result<Paged<Project>> {
        let needle = q.map(str::to_lowercase);
        let mut items: Vec<Project> = read(&self.projects)
            .values()
            .filter(|p| match &needle {
                Some(needle) => p.name.to_lowercase().contains(needle),
                None => true,
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        Ok(window(items, Some(page)))
    }
}

#[async_trait]
impl StageStore for MemoryStore {
    async fn insert_stage(&self, stage: Stage) -> Result<()> {
        write(&self.stages).insert(stage.id, stage);
        Ok(())
    }

    async fn get_stage(&self, id: StageId) -> Result<Option<Stage>> {
        Ok(read(&self.stages).get(&id).cloned())
    }

    async fn list_stages(&self, project_id: ProjectId, page: Page) -> Result<Paged<Stage>> {
        let mut items: Vec<Stage> = read(&self.stages)
            .values()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        Ok(window(items, Some(page)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snag_core::Priority;
    use snag_query::{DefectFilter, Sort};

    fn defect(status: DefectStatus, created: &str) -> Defect {
        Defect {
            id: DefectId::new(),
            project_id: ProjectId::new(),
            stage_id: None,
            title: "a defect".to_string(),
            description: None,
            priority: Priority::Med,
            assignee_id: None,
            status,
            due_date: None,
            created_at: Timestamp::parse(created).unwrap(),
            updated_at: Timestamp::parse(created).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_transition_cas_succeeds_on_expected_status() {
        let store = MemoryStore::new();
        let d = defect(DefectStatus::New, "2026-01-01T00:00:00Z");
        let id = d.id;
        store.insert_defect(d).await.unwrap();

        let now = Timestamp::parse("2026-01-02T00:00:00Z").unwrap();
        let updated = store
            .transition_defect(id, DefectStatus::New, DefectStatus::InWork, now)
            .await
            .unwrap();
        assert_eq!(updated.status, DefectStatus::InWork);
        assert_eq!(updated.updated_at, now);
    }

    #[tokio::test]
    async fn test_transition_cas_conflicts_on_stale_read() {
        let store = MemoryStore::new();
        let d = defect(DefectStatus::New, "2026-01-01T00:00:00Z");
        let id = d.id;
        store.insert_defect(d).await.unwrap();
        let now = Timestamp::now();

        // First writer wins.
        store
            .transition_defect(id, DefectStatus::New, DefectStatus::InWork, now)
            .await
            .unwrap();
        // Second writer validated against the stale status and must not
        // overwrite silently.
        let err = store
            .transition_defect(id, DefectStatus::New, DefectStatus::InWork, now)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "conflict");
    }

    #[tokio::test]
    async fn test_transition_missing_defect_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .transition_defect(
                DefectId::new(),
                DefectStatus::New,
                DefectStatus::InWork,
                Timestamp::now(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_query_windows_tile_the_full_set() {
        let store = MemoryStore::new();
        for day in 1..=5 {
            store
                .insert_defect(defect(
                    DefectStatus::New,
                    &format!("2026-01-0{day}T00:00:00Z"),
                ))
                .await
                .unwrap();
        }

        let plan_page = |offset| {
            QueryPlan::build(
                DefectFilter::default(),
                Sort::default(),
                Some(Page { limit: 2, offset }),
            )
        };
        let mut seen = Vec::new();
        for offset in [0, 2, 4] {
            let page = store.query_defects(&plan_page(offset)).await.unwrap();
            assert_eq!(page.total, 5);
            seen.extend(page.items.into_iter().map(|d| d.id));
        }
        let export = store
            .query_defects(&QueryPlan::build(DefectFilter::default(), Sort::default(), None))
            .await
            .unwrap();
        assert_eq!(export.total, 5);
        let export_ids: Vec<DefectId> = export.items.into_iter().map(|d| d.id).collect();
        assert_eq!(seen, export_ids);
    }

    #[tokio::test]
    async fn test_stats_summary_counts() {
        let store = MemoryStore::new();
        store
            .insert_defect(defect(DefectStatus::New, "2026-01-01T00:00:00Z"))
            .await
            .unwrap();
        let mut closed = defect(DefectStatus::Closed, "2026-01-02T00:00:00Z");
        closed.updated_at = Timestamp::parse("2026-01-03T00:00:00Z").unwrap();
        store.insert_defect(closed).await.unwrap();

        let summary = store.stats_summary(&StatsFilter::default()).await.unwrap();
        assert_eq!(summary.created, 2);
        assert_eq!(summary.closed_in_period, 1);
        assert_eq!(summary.open_now, 1);
        assert_eq!(summary.avg_lead_time_sec, Some(86_400.0));
        assert_eq!(summary.close_rate, Some(0.5));
    }

    #[tokio::test]
    async fn test_status_distribution_buckets() {
        let store = MemoryStore::new();
        for _ in 0..3 {
            store
                .insert_defect(defect(DefectStatus::InWork, "2026-01-01T00:00:00Z"))
                .await
                .unwrap();
        }
        store
            .insert_defect(defect(DefectStatus::Closed, "2026-01-01T00:00:00Z"))
            .await
            .unwrap();

        let dist = store
            .status_distribution(&StatsFilter::default())
            .await
            .unwrap();
        let in_work = dist.iter().find(|c| c.status == DefectStatus::InWork).unwrap();
        assert_eq!(in_work.count, 3);
        assert!(!dist.iter().any(|c| c.status == DefectStatus::Review));
    }
}
