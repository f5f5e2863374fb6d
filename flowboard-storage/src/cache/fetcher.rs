//! Remote fetch boundary for the entity cache.

use async_trait::async_trait;
use flowboard_core::{
    Board, BoardId, BoardList, BoardMember, Comment, ListId, RemoteError, Task, TaskId,
};

/// The cache's only view of the remote API: one read per entity
/// collection. Implementations are responsible for authentication
/// (failing fast with `RemoteError::AuthRequired` when no valid token
/// exists) and request timeouts.
#[async_trait]
pub trait RemoteFetcher: Send + Sync + 'static {
    async fn fetch_boards(&self) -> Result<Vec<Board>, RemoteError>;

    async fn fetch_lists(&self, board_id: &BoardId) -> Result<Vec<BoardList>, RemoteError>;

    async fn fetch_tasks(&self, list_id: &ListId) -> Result<Vec<Task>, RemoteError>;

    async fn fetch_comments(&self, task_id: &TaskId) -> Result<Vec<Comment>, RemoteError>;

    async fn fetch_members(&self, board_id: &BoardId) -> Result<Vec<BoardMember>, RemoteError>;
}
