//! # snag-policy — Permission Matrix
//!
//! Table-driven authorization for every gated action that is not a status
//! transition (those have their own table in `snag-state`). One canonical
//! matrix is shared by every layer of the system; there is no separate
//! route-level variant that could drift from the service-level rules.
//!
//! ## Properties
//!
//! - [`PermissionMatrix::authorize`] is a total function of the caller and
//!   the action. Resource lookups (a comment's author, a target user's
//!   roles) happen before the call; the matrix itself does no I/O and
//!   reads no ambient state, which makes the whole decision space
//!   exhaustively table-testable.
//! - Deny reasons name the action and, where helpful, the roles that would
//!   suffice.
//! - The matrix is an immutable value injected at construction, not a
//!   module-level constant; tests can substitute alternate tables.
//!
//! ## The attachment asymmetry
//!
//! Comment deletion is open to the author or any moderator role.
//! Attachment deletion is moderator-only: an Engineer cannot delete an
//! attachment even as its author. This is a deliberate, separately tested
//! rule, not an oversight to unify away.

pub mod matrix;

pub use matrix::{Action, Decision, PermissionMatrix};
