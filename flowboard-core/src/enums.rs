//! Enum types for FlowBoard entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entity kind discriminator, used to address cache keys and declare
/// what a mutation writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Board,
    List,
    Task,
    Comment,
    Member,
}

/// Authentication status derived from the credential store.
///
/// `Unknown` exists only between process start and the first gate
/// resolution; it is never revisited afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SessionStatus {
    #[default]
    Unknown,
    Authenticated,
    Unauthenticated,
}

impl SessionStatus {
    /// True once the gate has settled to either terminal status.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// Role a user holds on a board they are a member of.
///
/// This is closed on the input side only; member records observed from
/// the server keep the raw string, since the server owns that value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Member,
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => f.write_str("admin"),
            Self::Member => f.write_str("member"),
        }
    }
}

impl FromStr for MemberRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            other => Err(format!("unknown member role: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_status_resolution() {
        assert!(!SessionStatus::Unknown.is_resolved());
        assert!(SessionStatus::Authenticated.is_resolved());
        assert!(SessionStatus::Unauthenticated.is_resolved());
        assert!(SessionStatus::Authenticated.is_authenticated());
        assert!(!SessionStatus::Unauthenticated.is_authenticated());
    }

    #[test]
    fn test_member_role_round_trip() {
        assert_eq!("admin".parse::<MemberRole>().unwrap(), MemberRole::Admin);
        assert_eq!("member".parse::<MemberRole>().unwrap(), MemberRole::Member);
        assert!("owner".parse::<MemberRole>().is_err());
        assert_eq!(MemberRole::Admin.to_string(), "admin");
        assert_eq!(
            serde_json::to_string(&MemberRole::Member).unwrap(),
            "\"member\""
        );
    }
}
