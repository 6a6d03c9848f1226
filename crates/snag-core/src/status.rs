//! # Workflow Enums — Status and Priority
//!
//! `DefectStatus` and `Priority` are the two enumerated workflow values on
//! a defect. Both are always one of their enumerated values, never null;
//! `FromStr` is the only ingress for raw strings and rejects unknown input
//! rather than coercing it.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;

// ─── DefectStatus ────────────────────────────────────────────────────

/// The lifecycle status of a defect.
///
/// Status only moves along the fixed graph owned by the workflow policy:
/// new → in_work → review → closed | canceled. `Closed` and `Canceled`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectStatus {
    /// Freshly reported, not yet picked up.
    New,
    /// Being worked by an engineer.
    InWork,
    /// Fix ready, awaiting review.
    Review,
    /// Verified and closed (terminal).
    Closed,
    /// Abandoned without a fix (terminal).
    Canceled,
}

impl DefectStatus {
    /// All statuses in canonical order.
    pub fn all() -> &'static [DefectStatus] {
        &[
            Self::New,
            Self::InWork,
            Self::Review,
            Self::Closed,
            Self::Canceled,
        ]
    }

    /// Whether this status has no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Canceled)
    }

    /// The wire name for this status. Matches the serde representation
    /// and the values stored in the status column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InWork => "in_work",
            Self::Review => "review",
            Self::Closed => "closed",
            Self::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for DefectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DefectStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "in_work" => Ok(Self::InWork),
            "review" => Ok(Self::Review),
            "closed" => Ok(Self::Closed),
            "canceled" => Ok(Self::Canceled),
            other => Err(Error::Validation(format!("unknown status: {other:?}"))),
        }
    }
}

// ─── Priority ────────────────────────────────────────────────────────

/// Defect priority. Defaults to `Med` when omitted at creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Cosmetic or minor.
    Low,
    /// Normal backlog priority.
    #[default]
    Med,
    /// Should be picked up next.
    High,
    /// Blocks a release or a customer.
    Critical,
}

impl Priority {
    /// All priorities in ascending order of urgency.
    pub fn all() -> &'static [Priority] {
        &[Self::Low, Self::Med, Self::High, Self::Critical]
    }

    /// The wire name for this priority.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Med => "med",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "med" => Ok(Self::Med),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(Error::Validation(format!("unknown priority: {other:?}"))),
        }
    }
}
