//! Identity types for FlowBoard entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// FlowBoard entity IDs are opaque strings assigned by the server.
/// The client never mints one; it only carries them between calls.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

define_id!(
    /// Identifier of a board.
    BoardId
);
define_id!(
    /// Identifier of a list within a board.
    ListId
);
define_id!(
    /// Identifier of a task within a list.
    TaskId
);
define_id!(
    /// Identifier of a comment on a task.
    CommentId
);
define_id!(
    /// Identifier of a board membership record.
    MemberId
);
define_id!(
    /// Identifier of a user account.
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_round_trip() {
        let id = BoardId::new("665f1c2a9b3e4d0012ab34cd");
        assert_eq!(id.as_str(), "665f1c2a9b3e4d0012ab34cd");
        assert_eq!(id.to_string(), "665f1c2a9b3e4d0012ab34cd");
        assert_eq!(id.clone().into_string(), "665f1c2a9b3e4d0012ab34cd");
    }

    #[test]
    fn test_id_serde_transparent() {
        let id = TaskId::new("abc123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc123\"");
        let back: TaskId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
