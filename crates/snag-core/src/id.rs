//! # Domain Identity Newtypes
//!
//! Newtype wrappers for all domain identifiers in the tracker. These
//! prevent accidental identifier confusion: you cannot pass a `CommentId`
//! where a `DefectId` is expected, and a moderation check on the wrong
//! aggregate is a compile error rather than a data bug.
//!
//! All identifiers serialize as plain UUID strings on the wire.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a tracked defect.
    DefectId
);
uuid_id!(
    /// Unique identifier for a project.
    ProjectId
);
uuid_id!(
    /// Unique identifier for a project stage.
    StageId
);
uuid_id!(
    /// Unique identifier for a user account.
    UserId
);
uuid_id!(
    /// Unique identifier for a defect comment.
    CommentId
);
uuid_id!(
    /// Unique identifier for a defect attachment.
    AttachmentId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_distinct_per_generation() {
        assert_ne!(DefectId::new(), DefectId::new());
    }

    #[test]
    fn test_display_is_plain_uuid() {
        let uuid = Uuid::new_v4();
        let id = DefectId::from(uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = UserId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
        let parsed: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
