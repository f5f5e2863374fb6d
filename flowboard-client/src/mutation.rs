//! Mutation lifecycle coordination.
//!
//! Each mutation identity runs `Idle -> Pending -> {Succeeded, Failed}`
//! and returns to `Idle` on the next invocation. Cache invalidation
//! happens only after the remote write is confirmed - never
//! optimistically - so a cached read is never older than the last
//! confirmed write it depends on.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use flowboard_core::{EntityKind, RemoteError, ValidationError, WriteScope};
use flowboard_storage::{EntityCache, RemoteFetcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationPhase {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum MutationError {
    /// This identity already has a write in flight; the UI should have
    /// disabled resubmission via `is_pending`.
    #[error("Mutation '{id}' is already pending")]
    AlreadyPending { id: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

#[derive(Debug, Default, Clone)]
struct MutationStatus {
    phase: MutationPhase,
    last_error: Option<String>,
}

struct Shared {
    states: Mutex<HashMap<String, MutationStatus>>,
}

fn lock_states(shared: &Shared) -> MutexGuard<'_, HashMap<String, MutationStatus>> {
    shared.states.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Serializes the lifecycle of remote writes and applies invalidation on
/// confirmed success. Distinct identities may run concurrently;
/// overlapping invalidation is safe because `invalidate` is idempotent.
pub struct MutationCoordinator<F: RemoteFetcher> {
    cache: EntityCache<F>,
    shared: Arc<Shared>,
}

impl<F: RemoteFetcher> Clone for MutationCoordinator<F> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F: RemoteFetcher> MutationCoordinator<F> {
    pub fn new(cache: EntityCache<F>) -> Self {
        Self {
            cache,
            shared: Arc::new(Shared {
                states: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn cache(&self) -> &EntityCache<F> {
        &self.cache
    }

    /// Run one mutation.
    ///
    /// `affects` declares the writes this operation performs; on
    /// confirmed success every declared entry's dependents are
    /// invalidated. On failure the cache is left untouched and the typed
    /// error is returned for inline rendering. Mutations are never
    /// retried here - resubmission is a user decision.
    pub async fn run<T, Fut>(
        &self,
        id: &str,
        affects: &[(EntityKind, WriteScope)],
        op: Fut,
    ) -> Result<T, MutationError>
    where
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        {
            let mut states = lock_states(&self.shared);
            let status = states.entry(id.to_string()).or_default();
            if status.phase == MutationPhase::Pending {
                return Err(MutationError::AlreadyPending { id: id.to_string() });
            }
            status.phase = MutationPhase::Pending;
            status.last_error = None;
        }

        // If the caller abandons the operation mid-flight, the identity
        // returns to Idle rather than sticking in Pending forever.
        let mut guard = PendingGuard {
            shared: Arc::clone(&self.shared),
            id: id.to_string(),
            armed: true,
        };
        let result = op.await;
        guard.armed = false;

        let mut states = lock_states(&self.shared);
        let status = states.entry(id.to_string()).or_default();
        match &result {
            Ok(_) => {
                status.phase = MutationPhase::Succeeded;
                drop(states);
                for (kind, scope) in affects {
                    self.cache.invalidate_dependents(*kind, scope);
                }
                tracing::debug!(id, affected = affects.len(), "mutation confirmed");
            }
            Err(e) => {
                status.phase = MutationPhase::Failed;
                status.last_error = Some(e.to_string());
                tracing::warn!(id, error = %e, "mutation failed, cache untouched");
            }
        }

        result.map_err(MutationError::from)
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.phase(id) == MutationPhase::Pending
    }

    pub fn phase(&self, id: &str) -> MutationPhase {
        lock_states(&self.shared)
            .get(id)
            .map(|s| s.phase)
            .unwrap_or_default()
    }

    /// Message of the most recent failure for this identity, for inline
    /// error display.
    pub fn last_error(&self, id: &str) -> Option<String> {
        lock_states(&self.shared)
            .get(id)
            .and_then(|s| s.last_error.clone())
    }
}

struct PendingGuard {
    shared: Arc<Shared>,
    id: String,
    armed: bool,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut states = lock_states(&self.shared);
        if let Some(status) = states.get_mut(&self.id) {
            if status.phase == MutationPhase::Pending {
                status.phase = MutationPhase::Idle;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flowboard_core::{
        Board, BoardId, BoardList, BoardMember, CacheKey, Comment, ListId, Task, TaskId,
    };
    use flowboard_storage::{CacheConfig, CacheState};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct CountingFetcher {
        task_fetches: AtomicUsize,
    }

    #[async_trait]
    impl RemoteFetcher for CountingFetcher {
        async fn fetch_boards(&self) -> Result<Vec<Board>, RemoteError> {
            Ok(Vec::new())
        }

        async fn fetch_lists(&self, _board_id: &BoardId) -> Result<Vec<BoardList>, RemoteError> {
            Ok(Vec::new())
        }

        async fn fetch_tasks(&self, _list_id: &ListId) -> Result<Vec<Task>, RemoteError> {
            self.task_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn fetch_comments(&self, _task_id: &TaskId) -> Result<Vec<Comment>, RemoteError> {
            Ok(Vec::new())
        }

        async fn fetch_members(&self, _board_id: &BoardId) -> Result<Vec<BoardMember>, RemoteError> {
            Ok(Vec::new())
        }
    }

    fn coordinator() -> MutationCoordinator<CountingFetcher> {
        MutationCoordinator::new(EntityCache::new(
            CountingFetcher::default(),
            CacheConfig::new().with_retry_backoff(Duration::from_millis(1)),
        ))
    }

    #[tokio::test]
    async fn test_success_invalidates_declared_dependents() {
        let coordinator = coordinator();
        let list = ListId::new("l1");
        coordinator.cache().tasks(list.clone()).await.unwrap();
        assert_eq!(
            coordinator.cache().snapshot(&CacheKey::Tasks(list.clone())).state,
            CacheState::Fresh
        );

        let affects = [(EntityKind::Task, WriteScope::list(list.clone()))];
        let message = coordinator
            .run("create-task", &affects, async { Ok("created".to_string()) })
            .await
            .unwrap();
        assert_eq!(message, "created");
        assert_eq!(coordinator.phase("create-task"), MutationPhase::Succeeded);
        assert_eq!(
            coordinator.cache().snapshot(&CacheKey::Tasks(list)).state,
            CacheState::Stale
        );
    }

    #[tokio::test]
    async fn test_failure_leaves_cache_untouched() {
        let coordinator = coordinator();
        let list = ListId::new("l1");
        coordinator.cache().tasks(list.clone()).await.unwrap();

        let affects = [(EntityKind::Task, WriteScope::list(list.clone()))];
        let err = coordinator
            .run("create-task", &affects, async {
                Err::<String, _>(RemoteError::Server {
                    message: "title taken".to_string(),
                })
            })
            .await
            .unwrap_err();

        assert_eq!(
            err,
            MutationError::Remote(RemoteError::Server {
                message: "title taken".to_string()
            })
        );
        assert_eq!(coordinator.phase("create-task"), MutationPhase::Failed);
        assert_eq!(
            coordinator.last_error("create-task").as_deref(),
            Some("title taken")
        );
        // No optimistic leak: the dependent key is still fresh.
        assert_eq!(
            coordinator.cache().snapshot(&CacheKey::Tasks(list)).state,
            CacheState::Fresh
        );
    }

    #[tokio::test]
    async fn test_duplicate_identity_is_rejected_while_pending() {
        let coordinator = coordinator();
        let gate = Arc::new(Notify::new());

        let running = {
            let coordinator = coordinator.clone();
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                coordinator
                    .run("update-board", &[], async move {
                        gate.notified().await;
                        Ok::<_, RemoteError>(())
                    })
                    .await
            })
        };

        while !coordinator.is_pending("update-board") {
            tokio::task::yield_now().await;
        }

        let err = coordinator
            .run("update-board", &[], async { Ok::<_, RemoteError>(()) })
            .await
            .unwrap_err();
        assert_eq!(
            err,
            MutationError::AlreadyPending {
                id: "update-board".to_string()
            }
        );

        gate.notify_one();
        running.await.unwrap().unwrap();
        assert_eq!(coordinator.phase("update-board"), MutationPhase::Succeeded);
    }

    #[tokio::test]
    async fn test_terminal_state_resets_on_next_run() {
        let coordinator = coordinator();
        coordinator
            .run("delete-task", &[], async { Ok::<_, RemoteError>(()) })
            .await
            .unwrap();
        assert_eq!(coordinator.phase("delete-task"), MutationPhase::Succeeded);

        // A new invocation of the same identity starts over.
        coordinator
            .run("delete-task", &[], async {
                Err::<(), _>(RemoteError::Timeout)
            })
            .await
            .unwrap_err();
        assert_eq!(coordinator.phase("delete-task"), MutationPhase::Failed);
    }

    #[tokio::test]
    async fn test_distinct_identities_run_concurrently() {
        let coordinator = coordinator();
        let gate = Arc::new(Notify::new());

        let slow = {
            let coordinator = coordinator.clone();
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                coordinator
                    .run("create-board", &[], async move {
                        gate.notified().await;
                        Ok::<_, RemoteError>(())
                    })
                    .await
            })
        };

        while !coordinator.is_pending("create-board") {
            tokio::task::yield_now().await;
        }

        // A different identity is not blocked by the pending one.
        coordinator
            .run("create-comment", &[], async { Ok::<_, RemoteError>(()) })
            .await
            .unwrap();

        gate.notify_one();
        slow.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_abandoned_mutation_returns_to_idle() {
        let coordinator = coordinator();
        let run = coordinator.run("update-task", &[], async {
            std::future::pending::<Result<(), RemoteError>>().await
        });

        let timed_out = tokio::time::timeout(Duration::from_millis(50), run).await;
        assert!(timed_out.is_err());
        assert_eq!(coordinator.phase("update-task"), MutationPhase::Idle);
    }
}
