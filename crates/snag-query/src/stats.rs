//! Reporting filters and result shapes for the stats surface.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use snag_core::{DefectStatus, Error, ProjectId, UserId};

/// Raw reporting filter as it arrives on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStatsFilter {
    pub project_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    /// Inclusive period start, `YYYY-MM-DD`.
    pub from: Option<String>,
    /// Inclusive period end, `YYYY-MM-DD`.
    pub to: Option<String>,
}

/// Validated reporting filter. All predicates conjunctive, like the
/// defect filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsFilter {
    pub project_id: Option<ProjectId>,
    pub assignee_id: Option<UserId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl StatsFilter {
    /// Validate raw reporting input; malformed dates fail validation.
    pub fn from_raw(raw: &RawStatsFilter) -> Result<Self, Error> {
        Ok(Self {
            project_id: raw.project_id.map(ProjectId::from),
            assignee_id: raw.assignee_id.map(UserId::from),
            from: parse_date(raw.from.as_deref())?,
            to: parse_date(raw.to.as_deref())?,
        })
    }
}

fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>, Error> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| Error::Validation(format!("invalid date: {value:?}"))),
    }
}

/// Summary KPIs for defects within a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSummary {
    /// Defects created in the period.
    pub created: i64,
    /// Defects currently closed among those created in the period.
    pub closed_in_period: i64,
    /// Defects currently open (neither closed nor canceled), period-free.
    pub open_now: i64,
    /// Mean seconds between creation and last update of closed defects.
    pub avg_lead_time_sec: Option<f64>,
    /// closed_in_period / created, when any were created.
    pub close_rate: Option<f64>,
}

/// One bucket of the current status distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: DefectStatus,
    pub count: i64,
}
