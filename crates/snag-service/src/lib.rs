//! # snag-service — Tracker Operations
//!
//! The transport-agnostic service layer. Every exposed operation follows
//! the same shape: normalize and validate input, consult the permission
//! matrix or the workflow policy, then perform the persistence call. No
//! HTTP types appear here and no business rule lives anywhere else.
//!
//! ## Services
//!
//! - [`DefectService`] — listing, creation, field updates, the status
//!   transition, deletion, export, and reporting.
//! - [`CommentService`] — commentary on defects, with moderated deletion.
//! - [`AttachmentService`] — file evidence: metadata plus blob bytes.
//! - [`UserService`] — role-gated user administration.
//! - [`ProjectService`] — project and stage plumbing.
//!
//! ## Crate Policy
//!
//! - Policies (`WorkflowPolicy`, `PermissionMatrix`) are injected at
//!   construction and shared; no service builds its own copy.
//! - All failures are the `snag_core::Error` taxonomy; nothing is
//!   downgraded or swallowed.

pub mod attachments;
pub mod comments;
pub mod defects;
pub mod identity;
pub mod projects;
pub mod users;

use std::sync::Arc;

use snag_policy::PermissionMatrix;
use snag_state::WorkflowPolicy;
use snag_store::{
    AttachmentStore, BlobStore, CommentStore, DefectStore, ProjectStore, StageStore, UserStore,
};

pub use attachments::{AttachmentDeletion, AttachmentService, AttachmentUpload};
pub use comments::{CommentService, CreateCommentInput};
pub use defects::{CreateDefectInput, DefectService, ListDefectsParams, UpdateDefectInput};
pub use identity::{IdentityResolver, StaticTokenResolver};
pub use projects::{CreateProjectInput, ProjectService};
pub use users::{CreateUserInput, UserService};

/// The assembled service layer.
pub struct Services {
    pub defects: DefectService,
    pub comments: CommentService,
    pub attachments: AttachmentService,
    pub users: UserService,
    pub projects: ProjectService,
    pub identity: Arc<dyn IdentityResolver>,
}

impl Services {
    /// Wire every service against one store implementation, the canonical
    /// policies, and the given blob store and identity resolver.
    pub fn new<S>(
        store: Arc<S>,
        blobs: Arc<dyn BlobStore>,
        identity: Arc<dyn IdentityResolver>,
    ) -> Self
    where
        S: DefectStore
            + CommentStore
            + AttachmentStore
            + UserStore
            + ProjectStore
            + StageStore
            + 'static,
    {
        Self::with_policies(
            store,
            blobs,
            identity,
            Arc::new(WorkflowPolicy::canonical()),
            Arc::new(PermissionMatrix::canonical()),
        )
    }

    /// Like [`Services::new`] but with explicit policy tables.
    pub fn with_policies<S>(
        store: Arc<S>,
        blobs: Arc<dyn BlobStore>,
        identity: Arc<dyn IdentityResolver>,
        workflow: Arc<WorkflowPolicy>,
        matrix: Arc<PermissionMatrix>,
    ) -> Self
    where
        S: DefectStore
            + CommentStore
            + AttachmentStore
            + UserStore
            + ProjectStore
            + StageStore
            + 'static,
    {
        let defects = DefectService::new(
            store.clone(),
            store.clone(),
            workflow.clone(),
            matrix.clone(),
        );
        let comments = CommentService::new(store.clone(), store.clone(), matrix.clone());
        let attachments =
            AttachmentService::new(store.clone(), store.clone(), blobs, matrix.clone());
        let users = UserService::new(store.clone(), matrix);
        let projects = ProjectService::new(store.clone(), store);
        Self {
            defects,
            comments,
            attachments,
            users,
            projects,
            identity,
        }
    }
}
