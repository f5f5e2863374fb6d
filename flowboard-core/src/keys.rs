//! Cache keys and the static invalidation dependency graph.
//!
//! A write on one entity kind must mark a known set of cached reads
//! stale. That set is defined here as a pure function over a checked-in
//! table, so the consistency rule can be audited and tested without any
//! caching machinery.

use crate::{BoardId, EntityKind, ListId, TaskId};

/// Address of one cached collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// All boards visible to the signed-in user.
    Boards,
    /// Lists of one board.
    Lists(BoardId),
    /// Tasks of one list.
    Tasks(ListId),
    /// Comments of one task.
    Comments(TaskId),
    /// Members of one board.
    Members(BoardId),
}

impl CacheKey {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Boards => EntityKind::Board,
            Self::Lists(_) => EntityKind::List,
            Self::Tasks(_) => EntityKind::Task,
            Self::Comments(_) => EntityKind::Comment,
            Self::Members(_) => EntityKind::Member,
        }
    }
}

/// IDs a write touches, used to derive the cache keys it invalidates.
///
/// Only the IDs relevant to the written entity kind are consulted; a
/// create may legitimately leave the entity's own ID unset (the server
/// has not assigned one yet) and still name its parent scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteScope {
    pub board_id: Option<BoardId>,
    pub list_id: Option<ListId>,
    pub task_id: Option<TaskId>,
}

impl WriteScope {
    pub fn board(board_id: BoardId) -> Self {
        Self {
            board_id: Some(board_id),
            ..Self::default()
        }
    }

    pub fn list(list_id: ListId) -> Self {
        Self {
            list_id: Some(list_id),
            ..Self::default()
        }
    }

    pub fn task(task_id: TaskId) -> Self {
        Self {
            task_id: Some(task_id),
            ..Self::default()
        }
    }

    pub fn with_board(mut self, board_id: BoardId) -> Self {
        self.board_id = Some(board_id);
        self
    }

    pub fn with_list(mut self, list_id: ListId) -> Self {
        self.list_id = Some(list_id);
        self
    }

    pub fn with_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }
}

/// The dependency graph: which cache keys a write on `kind` invalidates.
///
/// Edges are one hop by design - a task write does not reach `Boards`.
/// This bounds invalidation cost and matches the product's consistency
/// needs.
///
/// - board write   -> `Boards`, `Lists(board)`
/// - list write    -> `Lists(board)`, `Tasks(list)`
/// - task write    -> `Tasks(list)`, `Comments(task)`
/// - comment write -> `Comments(task)`
/// - member write  -> `Members(board)`
pub fn dependent_keys(kind: EntityKind, scope: &WriteScope) -> Vec<CacheKey> {
    let mut keys = Vec::with_capacity(2);
    match kind {
        EntityKind::Board => {
            keys.push(CacheKey::Boards);
            if let Some(board_id) = &scope.board_id {
                keys.push(CacheKey::Lists(board_id.clone()));
            }
        }
        EntityKind::List => {
            if let Some(board_id) = &scope.board_id {
                keys.push(CacheKey::Lists(board_id.clone()));
            }
            if let Some(list_id) = &scope.list_id {
                keys.push(CacheKey::Tasks(list_id.clone()));
            }
        }
        EntityKind::Task => {
            if let Some(list_id) = &scope.list_id {
                keys.push(CacheKey::Tasks(list_id.clone()));
            }
            if let Some(task_id) = &scope.task_id {
                keys.push(CacheKey::Comments(task_id.clone()));
            }
        }
        EntityKind::Comment => {
            if let Some(task_id) = &scope.task_id {
                keys.push(CacheKey::Comments(task_id.clone()));
            }
        }
        EntityKind::Member => {
            if let Some(board_id) = &scope.board_id {
                keys.push(CacheKey::Members(board_id.clone()));
            }
        }
    }
    keys
}
