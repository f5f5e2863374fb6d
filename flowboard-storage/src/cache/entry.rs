//! Cache entry states and read metadata.

use flowboard_core::{Board, BoardList, BoardMember, Comment, EntityKind, Task, Timestamp};

/// Lifecycle of one cached collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheState {
    /// Never fetched.
    #[default]
    Empty,
    /// A fetch is in flight.
    Loading,
    /// Data is current as of `fetched_at`.
    Fresh,
    /// Data may be outdated; the next read refetches, but the old data
    /// remains displayable.
    Stale,
    /// The last fetch failed. Previously fetched data, if any, is kept.
    Error,
}

/// One cached collection, mirroring its cache key's kind.
///
/// Collections preserve server-provided order; the cache never re-sorts.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Boards(Vec<Board>),
    Lists(Vec<BoardList>),
    Tasks(Vec<Task>),
    Comments(Vec<Comment>),
    Members(Vec<BoardMember>),
}

impl CachedValue {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Boards(_) => EntityKind::Board,
            Self::Lists(_) => EntityKind::List,
            Self::Tasks(_) => EntityKind::Task,
            Self::Comments(_) => EntityKind::Comment,
            Self::Members(_) => EntityKind::Member,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Boards(v) => v.len(),
            Self::Lists(v) => v.len(),
            Self::Tasks(v) => v.len(),
            Self::Comments(v) => v.len(),
            Self::Members(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of a cache read, carrying where the value came from.
#[derive(Debug, Clone)]
pub struct CacheRead {
    value: CachedValue,
    fetched_at: Timestamp,
    was_cache_hit: bool,
}

impl CacheRead {
    pub(crate) fn from_cache(value: CachedValue, fetched_at: Timestamp) -> Self {
        Self {
            value,
            fetched_at,
            was_cache_hit: true,
        }
    }

    pub(crate) fn from_fetch(value: CachedValue, fetched_at: Timestamp) -> Self {
        Self {
            value,
            fetched_at,
            was_cache_hit: false,
        }
    }

    pub fn value(&self) -> &CachedValue {
        &self.value
    }

    pub fn into_value(self) -> CachedValue {
        self.value
    }

    pub fn fetched_at(&self) -> Timestamp {
        self.fetched_at
    }

    pub fn was_cache_hit(&self) -> bool {
        self.was_cache_hit
    }
}

/// Point-in-time view of one entry, for rendering loading/error/empty/
/// data states.
#[derive(Debug, Clone, Default)]
pub struct CacheSnapshot {
    pub state: CacheState,
    pub data: Option<CachedValue>,
    pub fetched_at: Option<Timestamp>,
    pub error_detail: Option<String>,
}
