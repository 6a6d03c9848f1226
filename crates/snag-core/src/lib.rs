//! # snag-core — Foundational Types for the Snag Defect Tracker
//!
//! This crate is the bedrock of the Snag workspace. It defines the
//! type-system primitives that the workflow engine is built on. Every other
//! crate in the workspace depends on `snag-core`; it depends on nothing
//! internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain identifiers.** `DefectId`, `ProjectId`,
//!    `UserId`, `CommentId`, `AttachmentId`, `StageId` are all UUID newtypes.
//!    No bare strings or bare UUIDs for identifiers across module boundaries.
//!
//! 2. **Validated enums for workflow values.** `DefectStatus`, `Priority`,
//!    and `Role` parse through `FromStr` and fail loudly on unknown input.
//!    There is no code path that coerces an unrecognized value to a default.
//!
//! 3. **`RoleSet` is the only caller-role representation.** Loosely shaped
//!    role input (string, comma-delimited string, array, absent) is resolved
//!    once at the ingress boundary by `RoleSet::normalize`. Business logic
//!    never sees a string-or-array union.
//!
//! 4. **UTC-only timestamps.** `Timestamp` truncates to seconds precision
//!    so that stored, listed, and exported records render identically.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `snag-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod error;
pub mod id;
pub mod model;
pub mod role;
pub mod status;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use error::{Error, Result};
pub use id::{AttachmentId, CommentId, DefectId, ProjectId, StageId, UserId};
pub use model::{Attachment, Caller, Comment, Defect, Project, Stage, User};
pub use role::{RawRoles, Role, RoleSet};
pub use status::{DefectStatus, Priority};
pub use temporal::Timestamp;
