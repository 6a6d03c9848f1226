//! The shared query plan and its in-process evaluation.

use std::cmp::Ordering;

use snag_core::Defect;

use crate::filter::DefectFilter;
use crate::page::Page;
use crate::sort::{Sort, SortDir, SortKey};

/// The complete descriptor of a defect read: predicates, ordering, and an
/// optional pagination window.
///
/// Listing and export both construct their plan here; the only difference
/// between the two paths is whether `page` is present. Export never
/// truncates.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub filter: DefectFilter,
    pub sort: Sort,
    pub page: Option<Page>,
}

impl QueryPlan {
    /// Compose a plan. This is the single constructor used by both the
    /// paginated listing path and the unpaginated export path.
    pub fn build(filter: DefectFilter, sort: Sort, page: Option<Page>) -> Self {
        Self { filter, sort, page }
    }

    /// Whether a defect satisfies every predicate (conjunctive).
    pub fn matches(&self, defect: &Defect) -> bool {
        let f = &self.filter;
        if let Some(status) = f.status {
            if defect.status != status {
                return false;
            }
        }
        if let Some(priority) = f.priority {
            if defect.priority != priority {
                return false;
            }
        }
        if let Some(project_id) = f.project_id {
            if defect.project_id != project_id {
                return false;
            }
        }
        if let Some(assignee_id) = f.assignee_id {
            if defect.assignee_id != Some(assignee_id) {
                return false;
            }
        }
        if let Some(q) = &f.q {
            let needle = q.to_lowercase();
            let in_title = defect.title.to_lowercase().contains(&needle);
            let in_description = defect
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_title && !in_description {
                return false;
            }
        }
        true
    }

    /// Total order over defects for this plan.
    ///
    /// Missing due dates sort after present ones ascending and before them
    /// descending, matching the SQL rendering of the same plan. Ties break
    /// on the id so that pagination windows tile without overlap.
    pub fn compare(&self, a: &Defect, b: &Defect) -> Ordering {
        let primary = match self.sort.key {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::DueDate => cmp_nulls_last(&a.due_date, &b.due_date),
        };
        let primary = match self.sort.dir {
            SortDir::Asc => primary,
            SortDir::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
    }
}

fn cmp_nulls_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use snag_core::{DefectId, DefectStatus, Priority, ProjectId, Timestamp, UserId};

    fn defect(title: &str, description: Option<&str>, status: DefectStatus) -> Defect {
        Defect {
            id: DefectId::new(),
            project_id: ProjectId::new(),
            stage_id: None,
            title: title.to_string(),
            description: description.map(str::to_string),
            priority: Priority::Med,
            assignee_id: None,
            status,
            due_date: None,
            created_at: Timestamp::parse("2026-01-15T12:00:00Z").unwrap(),
            updated_at: Timestamp::parse("2026-01-15T12:00:00Z").unwrap(),
        }
    }

    fn plan_with(filter: DefectFilter) -> QueryPlan {
        QueryPlan::build(filter, Sort::default(), None)
    }

    // ── Predicates ───────────────────────────────────────────────────

    #[test]
    fn test_empty_filter_matches_everything() {
        let plan = plan_with(DefectFilter::default());
        assert!(plan.matches(&defect("anything", None, DefectStatus::New)));
    }

    #[test]
    fn test_status_and_q_are_conjunctive() {
        // Both conditions must hold; matching only one excludes the row.
        let plan = plan_with(DefectFilter {
            status: Some(DefectStatus::InWork),
            q: Some("login".to_string()),
            ..Default::default()
        });

        let both = defect("Login fails on submit", None, DefectStatus::InWork);
        let status_only = defect("Crash on start", None, DefectStatus::InWork);
        let q_only = defect("Login fails on submit", None, DefectStatus::New);

        assert!(plan.matches(&both));
        assert!(!plan.matches(&status_only));
        assert!(!plan.matches(&q_only));
    }

    #[test]
    fn test_q_is_case_insensitive_over_title_or_description() {
        let plan = plan_with(DefectFilter {
            q: Some("LOGIN".to_string()),
            ..Default::default()
        });
        assert!(plan.matches(&defect("login broken", None, DefectStatus::New)));
        assert!(plan.matches(&defect("broken", Some("fails at Login step"), DefectStatus::New)));
        assert!(!plan.matches(&defect("broken", None, DefectStatus::New)));
    }

    #[test]
    fn test_assignee_filter_excludes_unassigned() {
        let assignee = UserId::new();
        let plan = plan_with(DefectFilter {
            assignee_id: Some(assignee),
            ..Default::default()
        });
        let mut assigned = defect("a", None, DefectStatus::New);
        assigned.assignee_id = Some(assignee);
        let unassigned = defect("b", None, DefectStatus::New);

        assert!(plan.matches(&assigned));
        assert!(!plan.matches(&unassigned));
    }

    #[test]
    fn test_project_filter_is_exact() {
        let project = ProjectId::new();
        let plan = plan_with(DefectFilter {
            project_id: Some(project),
            ..Default::default()
        });
        let mut inside = defect("a", None, DefectStatus::New);
        inside.project_id = project;
        assert!(plan.matches(&inside));
        assert!(!plan.matches(&defect("a", None, DefectStatus::New)));
    }

    // ── Ordering ─────────────────────────────────────────────────────

    #[test]
    fn test_created_at_desc_orders_newest_first() {
        let plan = QueryPlan::build(DefectFilter::default(), Sort::default(), None);
        let mut older = defect("old", None, DefectStatus::New);
        older.created_at = Timestamp::parse("2026-01-01T00:00:00Z").unwrap();
        let mut newer = defect("new", None, DefectStatus::New);
        newer.created_at = Timestamp::parse("2026-02-01T00:00:00Z").unwrap();

        assert_eq!(plan.compare(&newer, &older), Ordering::Less);
    }

    #[test]
    fn test_due_date_asc_puts_missing_last() {
        let plan = QueryPlan::build(
            DefectFilter::default(),
            Sort::parse(Some("due_date:asc")).unwrap(),
            None,
        );
        let mut dated = defect("dated", None, DefectStatus::New);
        dated.due_date = NaiveDate::from_ymd_opt(2026, 3, 1);
        let dateless = defect("dateless", None, DefectStatus::New);

        assert_eq!(plan.compare(&dated, &dateless), Ordering::Less);
    }

    #[test]
    fn test_due_date_desc_puts_missing_first() {
        let plan = QueryPlan::build(
            DefectFilter::default(),
            Sort::parse(Some("due_date:desc")).unwrap(),
            None,
        );
        let mut dated = defect("dated", None, DefectStatus::New);
        dated.due_date = NaiveDate::from_ymd_opt(2026, 3, 1);
        let dateless = defect("dateless", None, DefectStatus::New);

        assert_eq!(plan.compare(&dateless, &dated), Ordering::Less);
    }

    #[test]
    fn test_ties_break_on_id_for_stable_windows() {
        let plan = QueryPlan::build(DefectFilter::default(), Sort::default(), None);
        let a = defect("same instant", None, DefectStatus::New);
        let b = defect("same instant", None, DefectStatus::New);
        let forward = plan.compare(&a, &b);
        assert_ne!(forward, Ordering::Equal);
        assert_eq!(plan.compare(&b, &a), forward.reverse());
    }

    // ── Shared construction ──────────────────────────────────────────

    #[test]
    fn test_listing_and_export_plans_differ_only_in_page() {
        let filter = DefectFilter {
            status: Some(DefectStatus::Review),
            ..Default::default()
        };
        let sort = Sort::parse(Some("created_at:asc")).unwrap();

        let listing = QueryPlan::build(filter.clone(), sort, Some(Page::default()));
        let export = QueryPlan::build(filter, sort, None);

        assert_eq!(listing.filter, export.filter);
        assert_eq!(listing.sort, export.sort);
        assert!(listing.page.is_some());
        assert!(export.page.is_none());
    }
}
