//! # snag-api — Axum HTTP Surface
//!
//! The thin HTTP layer over `snag-service`, built on Axum/Tower/Tokio.
//!
//! ## Routes
//!
//! - `/api/defects` — listing, creation, field updates, deletion
//! - `/api/defects/{id}/status` — the status transition operation
//! - `/api/defects/export` — unpaginated filtered export
//! - `/api/defects/{id}/comments`, `/api/comments/{id}` — commentary
//! - `/api/defects/{id}/attachments`, `/api/attachments/{id}` — evidence
//! - `/api/users` — role-gated user administration
//! - `/api/projects`, `/api/projects/{id}/stages` — project plumbing
//! - `/api/stats/*` — reporting
//! - `/health` — liveness probe (unauthenticated)
//!
//! ## Crate Policy
//!
//! - No business logic in route handlers; everything delegates to the
//!   service layer.
//! - All errors map to structured HTTP responses via `AppError`, carrying
//!   the stable error kind; storage detail never leaves the process.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use state::AppState;
