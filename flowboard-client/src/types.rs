//! Wire types for the FlowBoard REST API.
//!
//! The server answers every call with a `{success, message, ...}`
//! envelope; the payload field is named after the entity. Inputs carry
//! their own `validate()` so a bad value never reaches the network.

use serde::{Deserialize, Serialize};

use crate::validation::{
    validate_email, validate_hex_color, validate_password, ValidateLength, ValidateNonEmpty,
};
use flowboard_core::{
    Board, BoardId, BoardList, BoardMember, Comment, CommentId, ListId, MemberId, MemberRole, Task,
    TaskId, UserId, ValidationError,
};

// ----------------------------------------------------------------------------
// Response envelopes
// ----------------------------------------------------------------------------

/// Envelope for calls whose payload the client does not consume.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusEnvelope {
    pub success: bool,
    pub message: String,
}

/// User summary returned by the auth endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub firstname: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginEnvelope {
    pub success: bool,
    pub message: String,
    pub token: Option<String>,
    pub user: Option<AuthUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardsEnvelope {
    pub success: bool,
    pub message: String,
    pub boards: Option<Vec<Board>>,
}

/// Board shape echoed by create/update (no owner or timestamps).
#[derive(Debug, Clone, Deserialize)]
pub struct BoardSummary {
    pub id: BoardId,
    pub title: String,
    pub bg_color: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardEnvelope {
    pub success: bool,
    pub message: String,
    pub board: Option<BoardSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListsEnvelope {
    pub success: bool,
    pub message: String,
    pub lists: Option<Vec<BoardList>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListEnvelope {
    pub success: bool,
    pub message: String,
    pub list: Option<BoardList>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TasksEnvelope {
    pub success: bool,
    pub message: String,
    pub tasks: Option<Vec<Task>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskEnvelope {
    pub success: bool,
    pub message: String,
    pub task: Option<Task>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentsEnvelope {
    pub success: bool,
    pub message: String,
    pub comments: Option<Vec<Comment>>,
    pub count: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MembersEnvelope {
    pub success: bool,
    pub message: String,
    pub members: Option<Vec<BoardMember>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberEnvelope {
    pub success: bool,
    pub message: String,
    pub member: Option<BoardMember>,
}

// ----------------------------------------------------------------------------
// Auth inputs
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl LoginInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email("email", &self.email)?;
        validate_password("password", &self.password)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterInput {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub password: String,
}

impl RegisterInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.firstname.validate_non_empty("firstname")?;
        self.lastname.validate_non_empty("lastname")?;
        validate_email("email", &self.email)?;
        validate_password("password", &self.password)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordInput {
    pub email: String,
}

impl ForgotPasswordInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email("email", &self.email)
    }
}

// ----------------------------------------------------------------------------
// Board inputs
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CreateBoardInput {
    pub title: String,
    pub bg_color: String,
}

impl CreateBoardInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.title.validate_non_empty("title")?;
        self.title.validate_length("title", 1, 100)?;
        validate_hex_color("bg_color", &self.bg_color)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateBoardInput {
    /// Sent in the request path, not the body.
    #[serde(skip)]
    pub id: BoardId,
    pub title: String,
    pub bg_color: String,
}

impl UpdateBoardInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.id.as_str().validate_non_empty("id")?;
        self.title.validate_non_empty("title")?;
        self.title.validate_length("title", 1, 100)?;
        validate_hex_color("bg_color", &self.bg_color)
    }
}

// ----------------------------------------------------------------------------
// List inputs
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CreateListInput {
    #[serde(skip)]
    pub board_id: BoardId,
    pub title: String,
    pub position: i64,
    pub status: String,
}

impl CreateListInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.board_id.as_str().validate_non_empty("board_id")?;
        self.title.validate_non_empty("title")?;
        self.title.validate_length("title", 2, 100)?;
        self.status.validate_non_empty("status")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateListInput {
    #[serde(skip)]
    pub list_id: ListId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl UpdateListInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.list_id.as_str().validate_non_empty("list_id")?;
        if let Some(title) = &self.title {
            title.validate_non_empty("title")?;
            title.validate_length("title", 2, 100)?;
        }
        if let Some(status) = &self.status {
            status.validate_non_empty("status")?;
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Task inputs
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CreateTaskInput {
    #[serde(skip)]
    pub list_id: ListId,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub position: i64,
    #[serde(rename = "dueDate")]
    pub due_date: String,
}

impl CreateTaskInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.list_id.as_str().validate_non_empty("list_id")?;
        self.title.validate_non_empty("title")?;
        self.title.validate_length("title", 1, 100)?;
        self.priority.validate_non_empty("priority")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateTaskInput {
    #[serde(skip)]
    pub task_id: TaskId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(rename = "dueDate", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl UpdateTaskInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.task_id.as_str().validate_non_empty("task_id")?;
        if let Some(title) = &self.title {
            title.validate_non_empty("title")?;
            title.validate_length("title", 1, 100)?;
        }
        if let Some(priority) = &self.priority {
            priority.validate_non_empty("priority")?;
        }
        Ok(())
    }

    /// Minimal patch from a baseline snapshot and the current edit
    /// buffer: only fields that actually changed are sent.
    pub fn diff(baseline: &Task, edited: &Task) -> Self {
        Self {
            task_id: edited.id.clone(),
            title: (baseline.title != edited.title).then(|| edited.title.clone()),
            description: (baseline.description != edited.description)
                .then(|| edited.description.clone()),
            priority: (baseline.priority != edited.priority).then(|| edited.priority.clone()),
            position: (baseline.position != edited.position).then_some(edited.position),
            due_date: (baseline.due_date != edited.due_date).then(|| edited.due_date.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.position.is_none()
            && self.due_date.is_none()
    }
}

// ----------------------------------------------------------------------------
// Comment inputs
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CreateCommentInput {
    #[serde(skip)]
    pub task_id: TaskId,
    pub content: String,
}

impl CreateCommentInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.task_id.as_str().validate_non_empty("task_id")?;
        self.content.validate_non_empty("content")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateCommentInput {
    #[serde(skip)]
    pub comment_id: CommentId,
    pub content: String,
}

impl UpdateCommentInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.comment_id.as_str().validate_non_empty("comment_id")?;
        self.content.validate_non_empty("content")
    }
}

// ----------------------------------------------------------------------------
// Member inputs
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CreateMemberInput {
    pub board_id: BoardId,
    #[serde(rename = "userEmail")]
    pub user_email: String,
    pub role: MemberRole,
}

impl CreateMemberInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.board_id.as_str().validate_non_empty("board_id")?;
        validate_email("userEmail", &self.user_email)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateMemberInput {
    #[serde(skip)]
    pub member_id: MemberId,
    pub board_id: BoardId,
    pub role: MemberRole,
}

impl UpdateMemberInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.member_id.as_str().validate_non_empty("member_id")?;
        self.board_id.as_str().validate_non_empty("board_id")
    }
}
