//! FlowBoard Core - Entity Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types - no business logic.

pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;
pub mod keys;

pub use entities::{
    Board, BoardList, BoardMember, BoardOwner, Comment, MemberUser, SessionUser, Task, UserProfile,
};
pub use enums::{EntityKind, MemberRole, SessionStatus};
pub use error::{
    CacheError, FlowboardError, FlowboardResult, RemoteError, StorageError, ValidationError,
};
pub use identity::{BoardId, CommentId, ListId, MemberId, TaskId, Timestamp, UserId};
pub use keys::{dependent_keys, CacheKey, WriteScope};
