//! # Domain Records
//!
//! The persisted record types of the tracker. These are plain data: all
//! workflow rules (who may mutate what, which status edges exist) live in
//! `snag-state` and `snag-policy`, and all mutation goes through the
//! service layer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::id::{AttachmentId, CommentId, DefectId, ProjectId, StageId, UserId};
use crate::role::RoleSet;
use crate::status::{DefectStatus, Priority};
use crate::temporal::Timestamp;

/// The authenticated caller of an operation: the resolved identity plus
/// the normalized set of roles it holds. Built once per request at the
/// ingress boundary; every authorization decision consumes this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caller {
    pub id: UserId,
    pub roles: RoleSet,
}

impl Caller {
    pub fn new(id: UserId, roles: RoleSet) -> Self {
        Self { id, roles }
    }
}

/// Maximum defect title length in characters.
pub const TITLE_MAX: usize = 120;
/// Maximum defect description length in characters.
pub const DESCRIPTION_MAX: usize = 4000;
/// Maximum comment text length in characters.
pub const COMMENT_MAX: usize = 4000;

/// A tracked defect.
///
/// Created with status `new`; thereafter mutated only through partial
/// field updates (which never touch status) or the dedicated status
/// transition operation (which touches status and `updated_at` only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defect {
    pub id: DefectId,
    pub project_id: ProjectId,
    pub stage_id: Option<StageId>,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub assignee_id: Option<UserId>,
    pub status: DefectStatus,
    pub due_date: Option<NaiveDate>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A comment on a defect. Immutable except deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub defect_id: DefectId,
    pub author_id: UserId,
    pub text: String,
    pub created_at: Timestamp,
}

/// File evidence attached to a defect. The bytes live in the blob store
/// under `storage_path`; this record is the metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub defect_id: DefectId,
    pub author_id: UserId,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub storage_path: String,
    pub created_at: Timestamp,
}

/// A user account with its resolved role memberships.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    pub roles: RoleSet,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A project grouping defects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub customer: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A stage within a project that defects may reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub project_id: ProjectId,
    pub name: String,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defect_serde_wire_names() {
        let defect = Defect {
            id: DefectId::new(),
            project_id: ProjectId::new(),
            stage_id: None,
            title: "Login fails".to_string(),
            description: None,
            priority: Priority::Med,
            assignee_id: None,
            status: DefectStatus::InWork,
            due_date: None,
            created_at: Timestamp::parse("2026-01-15T12:00:00Z").unwrap(),
            updated_at: Timestamp::parse("2026-01-15T12:00:00Z").unwrap(),
        };
        let json = serde_json::to_value(&defect).unwrap();
        assert_eq!(json["status"], "in_work");
        assert_eq!(json["priority"], "med");
        assert!(json["stage_id"].is_null());
    }
}
