//! REST access to the FlowBoard API.
//!
//! Thin per-entity call set. Every authenticated call sources its bearer
//! token from the session gate first - absence of a valid token is a
//! precondition failure and no request is sent.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::session::SessionGate;
use crate::types::*;
use async_trait::async_trait;
use flowboard_core::{
    Board, BoardId, BoardList, BoardMember, Comment, CommentId, ListId, MemberId, RemoteError,
    Task, TaskId,
};
use flowboard_storage::RemoteFetcher;

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    gate: Arc<SessionGate>,
}

impl RestClient {
    pub fn new(config: &ClientConfig, gate: Arc<SessionGate>) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| RemoteError::Transport {
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            gate,
        })
    }

    // ------------------------------------------------------------------------
    // Auth endpoints (unauthenticated)
    // ------------------------------------------------------------------------

    pub async fn register(&self, input: &RegisterInput) -> Result<String, RemoteError> {
        let env: StatusEnvelope = self.call(Method::POST, "/auth/register", Some(input), None).await?;
        ensure(env.success, env.message)
    }

    pub async fn login(&self, input: &LoginInput) -> Result<(String, AuthUser), RemoteError> {
        let env: LoginEnvelope = self.call(Method::POST, "/auth/login", Some(input), None).await?;
        ensure(env.success, env.message)?;
        let token = require(env.token, "token")?;
        let user = require(env.user, "user")?;
        Ok((token, user))
    }

    pub async fn forgot_password(&self, input: &ForgotPasswordInput) -> Result<String, RemoteError> {
        let env: StatusEnvelope = self
            .call(Method::POST, "/auth/forgot-password", Some(input), None)
            .await?;
        ensure(env.success, env.message)
    }

    // ------------------------------------------------------------------------
    // Boards
    // ------------------------------------------------------------------------

    pub async fn get_boards(&self) -> Result<Vec<Board>, RemoteError> {
        let env: BoardsEnvelope = self.authed::<(), _>(Method::GET, "/board/", None).await?;
        ensure(env.success, env.message)?;
        require(env.boards, "boards")
    }

    pub async fn create_board(&self, input: &CreateBoardInput) -> Result<BoardSummary, RemoteError> {
        let env: BoardEnvelope = self.authed(Method::POST, "/board/", Some(input)).await?;
        ensure(env.success, env.message)?;
        require(env.board, "board")
    }

    pub async fn update_board(&self, input: &UpdateBoardInput) -> Result<BoardSummary, RemoteError> {
        let path = format!("/board/{}", input.id);
        let env: BoardEnvelope = self.authed(Method::PATCH, &path, Some(input)).await?;
        ensure(env.success, env.message)?;
        require(env.board, "board")
    }

    pub async fn delete_board(&self, board_id: &BoardId) -> Result<String, RemoteError> {
        let path = format!("/board/{board_id}");
        let env: StatusEnvelope = self.authed::<(), _>(Method::DELETE, &path, None).await?;
        ensure(env.success, env.message)
    }

    // ------------------------------------------------------------------------
    // Lists
    // ------------------------------------------------------------------------

    pub async fn get_lists(&self, board_id: &BoardId) -> Result<Vec<BoardList>, RemoteError> {
        let path = format!("/list/{board_id}");
        let env: ListsEnvelope = self.authed::<(), _>(Method::GET, &path, None).await?;
        ensure(env.success, env.message)?;
        require(env.lists, "lists")
    }

    pub async fn create_list(&self, input: &CreateListInput) -> Result<BoardList, RemoteError> {
        let path = format!("/list/{}", input.board_id);
        let env: ListEnvelope = self.authed(Method::POST, &path, Some(input)).await?;
        ensure(env.success, env.message)?;
        require(env.list, "list")
    }

    pub async fn update_list(&self, input: &UpdateListInput) -> Result<BoardList, RemoteError> {
        let path = format!("/list/{}", input.list_id);
        let env: ListEnvelope = self.authed(Method::PATCH, &path, Some(input)).await?;
        ensure(env.success, env.message)?;
        require(env.list, "list")
    }

    pub async fn delete_list(&self, list_id: &ListId) -> Result<String, RemoteError> {
        let path = format!("/list/{list_id}");
        let env: StatusEnvelope = self.authed::<(), _>(Method::DELETE, &path, None).await?;
        ensure(env.success, env.message)
    }

    // ------------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------------

    pub async fn get_tasks(&self, list_id: &ListId) -> Result<Vec<Task>, RemoteError> {
        let path = format!("/task/{list_id}");
        let env: TasksEnvelope = self.authed::<(), _>(Method::GET, &path, None).await?;
        ensure(env.success, env.message)?;
        require(env.tasks, "tasks")
    }

    pub async fn create_task(&self, input: &CreateTaskInput) -> Result<Task, RemoteError> {
        let path = format!("/task/{}", input.list_id);
        let env: TaskEnvelope = self.authed(Method::POST, &path, Some(input)).await?;
        ensure(env.success, env.message)?;
        require(env.task, "task")
    }

    pub async fn update_task(&self, input: &UpdateTaskInput) -> Result<Task, RemoteError> {
        let path = format!("/task/{}", input.task_id);
        let env: TaskEnvelope = self.authed(Method::PATCH, &path, Some(input)).await?;
        ensure(env.success, env.message)?;
        require(env.task, "task")
    }

    pub async fn delete_task(&self, task_id: &TaskId) -> Result<String, RemoteError> {
        let path = format!("/task/{task_id}");
        let env: StatusEnvelope = self.authed::<(), _>(Method::DELETE, &path, None).await?;
        ensure(env.success, env.message)
    }

    // ------------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------------

    pub async fn get_comments(&self, task_id: &TaskId) -> Result<Vec<Comment>, RemoteError> {
        let path = format!("/comment/{task_id}");
        let env: CommentsEnvelope = self.authed::<(), _>(Method::GET, &path, None).await?;
        ensure(env.success, env.message)?;
        require(env.comments, "comments")
    }

    pub async fn create_comment(&self, input: &CreateCommentInput) -> Result<String, RemoteError> {
        let path = format!("/comment/{}", input.task_id);
        let env: StatusEnvelope = self.authed(Method::POST, &path, Some(input)).await?;
        ensure(env.success, env.message)
    }

    pub async fn update_comment(&self, input: &UpdateCommentInput) -> Result<String, RemoteError> {
        let path = format!("/comment/{}", input.comment_id);
        let env: StatusEnvelope = self.authed(Method::PATCH, &path, Some(input)).await?;
        ensure(env.success, env.message)
    }

    pub async fn delete_comment(&self, comment_id: &CommentId) -> Result<String, RemoteError> {
        let path = format!("/comment/{comment_id}");
        let env: StatusEnvelope = self.authed::<(), _>(Method::DELETE, &path, None).await?;
        ensure(env.success, env.message)
    }

    // ------------------------------------------------------------------------
    // Board members
    // ------------------------------------------------------------------------

    pub async fn get_members(&self, board_id: &BoardId) -> Result<Vec<BoardMember>, RemoteError> {
        let path = format!("/member/{board_id}");
        let env: MembersEnvelope = self.authed::<(), _>(Method::GET, &path, None).await?;
        ensure(env.success, env.message)?;
        require(env.members, "members")
    }

    pub async fn create_member(&self, input: &CreateMemberInput) -> Result<String, RemoteError> {
        let env: StatusEnvelope = self.authed(Method::POST, "/member/", Some(input)).await?;
        ensure(env.success, env.message)
    }

    pub async fn update_member(&self, input: &UpdateMemberInput) -> Result<BoardMember, RemoteError> {
        let path = format!("/member/{}", input.member_id);
        let env: MemberEnvelope = self.authed(Method::PATCH, &path, Some(input)).await?;
        ensure(env.success, env.message)?;
        require(env.member, "member")
    }

    pub async fn delete_member(&self, member_id: &MemberId) -> Result<String, RemoteError> {
        let path = format!("/member/{member_id}");
        let env: StatusEnvelope = self.authed::<(), _>(Method::DELETE, &path, None).await?;
        ensure(env.success, env.message)
    }

    // ------------------------------------------------------------------------
    // Account
    // ------------------------------------------------------------------------

    pub async fn delete_user(&self) -> Result<String, RemoteError> {
        let env: StatusEnvelope = self.authed::<(), _>(Method::DELETE, "/user/delete", None).await?;
        ensure(env.success, env.message)
    }

    // ------------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------------

    async fn authed<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let token = self.gate.bearer_token().await?;
        self.call(method, path, body, Some(&token)).await
    }

    async fn call<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        token: Option<&str>,
    ) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(map_transport)?;
        // The server encodes failure in the envelope, not the HTTP
        // status, so the body is decoded regardless of status.
        response.json::<T>().await.map_err(|e| RemoteError::Decode {
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl RemoteFetcher for RestClient {
    async fn fetch_boards(&self) -> Result<Vec<Board>, RemoteError> {
        self.get_boards().await
    }

    async fn fetch_lists(&self, board_id: &BoardId) -> Result<Vec<BoardList>, RemoteError> {
        self.get_lists(board_id).await
    }

    async fn fetch_tasks(&self, list_id: &ListId) -> Result<Vec<Task>, RemoteError> {
        self.get_tasks(list_id).await
    }

    async fn fetch_comments(&self, task_id: &TaskId) -> Result<Vec<Comment>, RemoteError> {
        self.get_comments(task_id).await
    }

    async fn fetch_members(&self, board_id: &BoardId) -> Result<Vec<BoardMember>, RemoteError> {
        self.get_members(board_id).await
    }
}

fn ensure(success: bool, message: String) -> Result<String, RemoteError> {
    if success {
        Ok(message)
    } else {
        Err(RemoteError::Server { message })
    }
}

fn require<T>(payload: Option<T>, what: &str) -> Result<T, RemoteError> {
    payload.ok_or_else(|| RemoteError::Decode {
        reason: format!("missing {what} in response"),
    })
}

fn map_transport(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Timeout
    } else {
        RemoteError::Transport {
            reason: e.to_string(),
        }
    }
}
