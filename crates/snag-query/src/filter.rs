//! Defect filters: the raw wire shape and its validated form.

use std::str::FromStr;

use serde::Deserialize;
use uuid::Uuid;

use snag_core::{DefectStatus, Error, Priority, ProjectId, UserId};

/// The filter parameters as they arrive on the wire, untrusted.
///
/// Identifier fields deserialize as UUIDs directly (a malformed UUID is a
/// deserialization failure at the transport); enum fields stay strings so
/// that validation happens here, in one place, with one error shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDefectFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub project_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub q: Option<String>,
}

/// A validated, conjunctive defect filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefectFilter {
    pub status: Option<DefectStatus>,
    pub priority: Option<Priority>,
    pub project_id: Option<ProjectId>,
    pub assignee_id: Option<UserId>,
    /// Case-insensitive substring over title OR description. Stored
    /// trimmed; matching lowercases both sides.
    pub q: Option<String>,
}

impl DefectFilter {
    /// Validate raw filter input.
    ///
    /// Unknown `status`/`priority` values fail with a validation error.
    /// Whitespace-only values are treated as absent, matching what the
    /// original form encoding produced for cleared fields.
    pub fn from_raw(raw: &RawDefectFilter) -> Result<Self, Error> {
        Ok(Self {
            status: parse_opt::<DefectStatus>(raw.status.as_deref())?,
            priority: parse_opt::<Priority>(raw.priority.as_deref())?,
            project_id: raw.project_id.map(ProjectId::from),
            assignee_id: raw.assignee_id.map(UserId::from),
            q: raw
                .q
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
        })
    }
}

fn parse_opt<T: FromStr<Err = Error>>(raw: Option<&str>) -> Result<Option<T>, Error> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some),
    }
}
