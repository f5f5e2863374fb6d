//! Core entity structures
//!
//! Field names follow the FlowBoard REST API wire format; serde renames
//! bridge the server's mixed snake/camel conventions to Rust names.

use crate::{BoardId, CommentId, ListId, MemberId, TaskId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Owner summary embedded in a board record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardOwner {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub firstname: String,
    pub email: String,
}

/// Board - top-level container for lists of tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    #[serde(rename = "_id")]
    pub id: BoardId,
    pub title: String,
    pub bg_color: String,
    pub user: BoardOwner,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// List - ordered column of tasks within a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardList {
    pub id: ListId,
    pub title: String,
    pub position: i64,
    /// Server-owned status string (e.g. "active").
    pub status: String,
    #[serde(rename = "boardId")]
    pub board_id: BoardId,
}

/// Task - unit of work within a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    /// Server-owned priority string (e.g. "low", "medium", "high").
    pub priority: String,
    pub position: i64,
    /// Due date as the server sends it; not necessarily a full RFC 3339
    /// instant, so it stays a string.
    #[serde(rename = "dueDate")]
    pub due_date: String,
    #[serde(rename = "listId")]
    pub list_id: ListId,
}

/// Comment on a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    #[serde(rename = "createdAt")]
    pub created_at: Timestamp,
    #[serde(rename = "updatedAt")]
    pub updated_at: Timestamp,
}

/// User summary embedded in a membership record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberUser {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub firstname: String,
    pub email: String,
}

/// Membership of a user on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardMember {
    #[serde(rename = "memberId")]
    pub member_id: MemberId,
    #[serde(rename = "boardId")]
    pub board_id: BoardId,
    pub user: MemberUser,
    /// Server-owned role string.
    pub role: String,
    #[serde(rename = "boardOwnerUserId")]
    pub board_owner_user_id: UserId,
}

/// Minimal profile of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub email: String,
    pub firstname: String,
}

/// The credential payload persisted for an authenticated session:
/// the bearer token plus the minimal profile the UI needs offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub token: String,
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub email: String,
    pub firstname: String,
    #[serde(default, rename = "expiresAt")]
    pub expires_at: Option<Timestamp>,
}

impl SessionUser {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            user_id: self.user_id.clone(),
            email: self.email.clone(),
            firstname: self.firstname.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_wire_format() {
        let json = r##"{
            "_id": "b1",
            "title": "Launch plan",
            "bg_color": "#1f6feb",
            "user": {"_id": "u1", "firstname": "Ada", "email": "ada@example.com"},
            "created_at": "2025-06-01T10:00:00Z",
            "updated_at": "2025-06-02T11:30:00Z"
        }"##;
        let board: Board = serde_json::from_str(json).unwrap();
        assert_eq!(board.id.as_str(), "b1");
        assert_eq!(board.user.firstname, "Ada");
        assert_eq!(board.bg_color, "#1f6feb");
    }

    #[test]
    fn test_task_wire_format() {
        let json = r#"{
            "id": "t1",
            "title": "Write tests",
            "description": "cover the cache",
            "priority": "high",
            "position": 2,
            "dueDate": "2025-07-01",
            "listId": "l1"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.list_id.as_str(), "l1");
        assert_eq!(task.position, 2);
        assert_eq!(task.due_date, "2025-07-01");
    }

    #[test]
    fn test_session_user_round_trip() {
        let user = SessionUser {
            token: "tok".into(),
            user_id: UserId::new("u1"),
            email: "ada@example.com".into(),
            firstname: "Ada".into(),
            expires_at: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        let back: SessionUser = serde_json::from_str(&json).unwrap();
        assert_eq!(back, user);
        assert_eq!(back.profile().user_id, user.user_id);
    }
}
