//! Sort parsing: `field` or `field:dir`, defaulting to newest-first.

use serde::{Deserialize, Serialize};

use snag_core::Error;

/// The sortable defect columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    CreatedAt,
    DueDate,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::DueDate => "due_date",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// A validated sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub key: SortKey,
    pub dir: SortDir,
}

impl Default for Sort {
    /// Newest first.
    fn default() -> Self {
        Self {
            key: SortKey::CreatedAt,
            dir: SortDir::Desc,
        }
    }
}

impl Sort {
    /// Parse the wire form `field` or `field:dir`, e.g. `created_at:desc`.
    ///
    /// Missing or blank input yields the default (created_at descending); a
    /// bare field sorts ascending; an unknown field or direction fails
    /// validation rather than being ignored.
    pub fn parse(raw: Option<&str>) -> Result<Self, Error> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(Self::default()),
            Some(raw) => raw,
        };

        let (field, dir) = match raw.split_once(':') {
            Some((field, dir)) => (field.trim(), Some(dir.trim())),
            None => (raw, None),
        };

        let key = match field {
            "created_at" => SortKey::CreatedAt,
            "due_date" => SortKey::DueDate,
            other => {
                return Err(Error::Validation(format!("unknown sort field: {other:?}")))
            }
        };
        let dir = match dir {
            None | Some("asc") => SortDir::Asc,
            Some("desc") => SortDir::Desc,
            Some(other) => {
                return Err(Error::Validation(format!(
                    "unknown sort direction: {other:?}"
                )))
            }
        };

        Ok(Self { key, dir })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_created_at_desc() {
        let sort = Sort::parse(None).unwrap();
        assert_eq!(sort.key, SortKey::CreatedAt);
        assert_eq!(sort.dir, SortDir::Desc);
        assert_eq!(Sort::parse(Some("")).unwrap(), Sort::default());
    }

    #[test]
    fn test_field_and_direction() {
        let sort = Sort::parse(Some("due_date:desc")).unwrap();
        assert_eq!(sort.key, SortKey::DueDate);
        assert_eq!(sort.dir, SortDir::Desc);
    }

    #[test]
    fn test_bare_field_sorts_ascending() {
        let sort = Sort::parse(Some("due_date")).unwrap();
        assert_eq!(sort.key, SortKey::DueDate);
        assert_eq!(sort.dir, SortDir::Asc);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(Sort::parse(Some("priority")).is_err());
        assert!(Sort::parse(Some("title:asc")).is_err());
    }

    #[test]
    fn test_unknown_direction_rejected() {
        assert!(Sort::parse(Some("created_at:down")).is_err());
    }
}
