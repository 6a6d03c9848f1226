//! # snag-store — Persistence Boundary
//!
//! Repository traits for every aggregate plus two implementations: an
//! in-memory store (tests, demos) and a PostgreSQL store over sqlx with
//! runtime-checked queries. The attachment blob store lives here too,
//! behind its own trait with a filesystem backend.
//!
//! ## The conditional transition write
//!
//! `DefectStore::transition_defect` is a compare-and-swap keyed on the
//! expected prior status. The service validates against the status it
//! read; if another writer got there first, the store reports a conflict
//! instead of silently applying a last-writer-wins overwrite. Both
//! implementations honor this contract: the Postgres store with a single
//! conditional UPDATE, the memory store under its write lock.
//!
//! ## Query execution
//!
//! Both implementations execute the same `QueryPlan` value from
//! `snag-query`. The memory store applies `matches`/`compare` directly;
//! the Postgres store renders the plan into one parameterized WHERE and
//! ORDER BY through a single rendering function used by the row query and
//! the count query alike. Neither path re-derives predicates on its own.

pub mod blob;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use blob::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use traits::{
    AttachmentStore, CommentStore, DefectStore, ProjectStore, StageStore, UserStore,
};
