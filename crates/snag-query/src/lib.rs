//! # snag-query — Query/Filter Composer
//!
//! Builds the predicate/ordering/pagination descriptor shared by the
//! defect listing and export paths. The two paths went out of sync more
//! than once in this system's history; the [`QueryPlan`] type exists to
//! make that divergence impossible. Listing builds a plan with a page,
//! export builds a plan without one, and everything else about the plan
//! comes from the same code.
//!
//! ## Validation rules
//!
//! - `status`, `priority`, and `sort` reject unknown values before any
//!   predicate is built. An invalid enum is never coerced to "no filter".
//! - `limit`/`offset` are the one place defaulting is allowed: missing or
//!   non-numeric input falls back to the defaults (20 / 0), `limit` clamps
//!   to 1..=100, `offset` clamps to >= 0.
//! - free-text `q` matches case-insensitively as a substring against the
//!   title or the description; all filters combine conjunctively.

pub mod filter;
pub mod page;
pub mod plan;
pub mod sort;
pub mod stats;

pub use filter::{DefectFilter, RawDefectFilter};
pub use page::{Page, Paged};
pub use plan::QueryPlan;
pub use sort::{Sort, SortDir, SortKey};
pub use stats::{RawStatsFilter, StatsFilter, StatsSummary, StatusCount};
