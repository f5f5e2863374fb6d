//! The entity cache: coalesced read-through with explicit invalidation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::AbortHandle;

use super::entry::{CacheRead, CacheSnapshot, CacheState, CachedValue};
use super::fetcher::RemoteFetcher;
use flowboard_core::{
    dependent_keys, Board, BoardId, BoardList, BoardMember, CacheError, CacheKey, Comment,
    EntityKind, ListId, RemoteError, Task, TaskId, Timestamp, WriteScope,
};

/// Configuration for the entity cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Age after which a fresh entry is served as stale and refetched on
    /// the next read.
    pub stale_after: Duration,
    /// Retry budget for idempotent reads. Mutations are never retried.
    pub retry_max: u32,
    /// Base delay between read retries; doubles per attempt.
    pub retry_backoff: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(300),
            retry_max: 2,
            retry_backoff: Duration::from_secs(1),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn with_retry_max(mut self, retry_max: u32) -> Self {
        self.retry_max = retry_max;
        self
    }

    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }
}

type FetchOutcome = Result<CachedValue, CacheError>;

struct InFlight {
    tx: broadcast::Sender<FetchOutcome>,
    waiters: usize,
    abort: AbortHandle,
}

#[derive(Default)]
struct Entry {
    data: Option<CachedValue>,
    fetched_at: Option<Timestamp>,
    state: CacheState,
    error_detail: Option<String>,
    // Set when a confirmed write lands while a fetch for this key is in
    // flight; the fetch result may predate the write, so it completes
    // into Stale instead of Fresh.
    invalidated_while_loading: bool,
    inflight: Option<InFlight>,
}

struct Shared<F> {
    fetcher: F,
    entries: Mutex<HashMap<CacheKey, Entry>>,
    config: CacheConfig,
}

fn lock_entries<F>(shared: &Shared<F>) -> MutexGuard<'_, HashMap<CacheKey, Entry>> {
    shared.entries.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Key-addressed read cache over a `RemoteFetcher`.
///
/// Correctness properties:
/// - at most one in-flight fetch per key; concurrent readers attach to
///   it and observe the identical resolved value;
/// - `invalidate` never evicts data, so stale data stays displayable
///   while a refetch is pending;
/// - a failed refetch keeps previously fetched data alongside the error;
/// - when the last attached reader walks away, the fetch is aborted and
///   the entry reverts to its pre-fetch state, never to `Error`.
pub struct EntityCache<F: RemoteFetcher> {
    shared: Arc<Shared<F>>,
}

impl<F: RemoteFetcher> Clone for EntityCache<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F: RemoteFetcher> EntityCache<F> {
    pub fn new(fetcher: F, config: CacheConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                fetcher,
                entries: Mutex::new(HashMap::new()),
                config,
            }),
        }
    }

    pub fn with_defaults(fetcher: F) -> Self {
        Self::new(fetcher, CacheConfig::default())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.shared.config
    }

    /// The fetcher this cache reads through.
    pub fn fetcher(&self) -> &F {
        &self.shared.fetcher
    }

    /// Read the collection addressed by `key`.
    ///
    /// Serves fresh data immediately; otherwise joins or starts the one
    /// in-flight fetch for the key and resolves when it completes.
    pub async fn get(&self, key: CacheKey) -> Result<CacheRead, CacheError> {
        let rx = {
            let mut entries = lock_entries(&self.shared);
            let entry = entries.entry(key.clone()).or_default();

            if entry.state == CacheState::Fresh && !self.time_stale(entry) {
                if let (Some(data), Some(at)) = (entry.data.clone(), entry.fetched_at) {
                    return Ok(CacheRead::from_cache(data, at));
                }
            }

            let joined = if entry.state == CacheState::Loading {
                entry.inflight.as_mut().map(|inflight| {
                    inflight.waiters += 1;
                    inflight.tx.subscribe()
                })
            } else {
                None
            };
            match joined {
                Some(rx) => rx,
                None => self.start_fetch(entry, key.clone()),
            }
        };
        self.await_outcome(key, rx).await
    }

    /// Mark `key` stale. Never evicts data; a no-op on entries that are
    /// already stale, empty or errored.
    pub fn invalidate(&self, key: &CacheKey) {
        let mut entries = lock_entries(&self.shared);
        if let Some(entry) = entries.get_mut(key) {
            match entry.state {
                CacheState::Fresh => {
                    tracing::debug!(?key, "cache entry invalidated");
                    entry.state = CacheState::Stale;
                }
                CacheState::Loading => {
                    entry.invalidated_while_loading = true;
                }
                CacheState::Empty | CacheState::Stale | CacheState::Error => {}
            }
        }
    }

    /// Invalidate every key the dependency graph derives for a write on
    /// `kind` within `scope`.
    pub fn invalidate_dependents(&self, kind: EntityKind, scope: &WriteScope) {
        let keys = dependent_keys(kind, scope);
        tracing::debug!(?kind, count = keys.len(), "invalidating dependents");
        for key in keys {
            self.invalidate(&key);
        }
    }

    /// Point-in-time view of one entry for rendering.
    pub fn snapshot(&self, key: &CacheKey) -> CacheSnapshot {
        let entries = lock_entries(&self.shared);
        match entries.get(key) {
            Some(entry) => CacheSnapshot {
                state: entry.state,
                data: entry.data.clone(),
                fetched_at: entry.fetched_at,
                error_detail: entry.error_detail.clone(),
            },
            None => CacheSnapshot::default(),
        }
    }

    pub async fn boards(&self) -> Result<Vec<Board>, CacheError> {
        match self.get(CacheKey::Boards).await?.into_value() {
            CachedValue::Boards(boards) => Ok(boards),
            other => Err(kind_mismatch(EntityKind::Board, &other)),
        }
    }

    pub async fn lists(&self, board_id: BoardId) -> Result<Vec<BoardList>, CacheError> {
        match self.get(CacheKey::Lists(board_id)).await?.into_value() {
            CachedValue::Lists(lists) => Ok(lists),
            other => Err(kind_mismatch(EntityKind::List, &other)),
        }
    }

    pub async fn tasks(&self, list_id: ListId) -> Result<Vec<Task>, CacheError> {
        match self.get(CacheKey::Tasks(list_id)).await?.into_value() {
            CachedValue::Tasks(tasks) => Ok(tasks),
            other => Err(kind_mismatch(EntityKind::Task, &other)),
        }
    }

    pub async fn comments(&self, task_id: TaskId) -> Result<Vec<Comment>, CacheError> {
        match self.get(CacheKey::Comments(task_id)).await?.into_value() {
            CachedValue::Comments(comments) => Ok(comments),
            other => Err(kind_mismatch(EntityKind::Comment, &other)),
        }
    }

    pub async fn members(&self, board_id: BoardId) -> Result<Vec<BoardMember>, CacheError> {
        match self.get(CacheKey::Members(board_id)).await?.into_value() {
            CachedValue::Members(members) => Ok(members),
            other => Err(kind_mismatch(EntityKind::Member, &other)),
        }
    }

    fn time_stale(&self, entry: &Entry) -> bool {
        match entry.fetched_at {
            Some(at) => {
                let age = Utc::now()
                    .signed_duration_since(at)
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                age > self.shared.config.stale_after
            }
            None => true,
        }
    }

    fn start_fetch(&self, entry: &mut Entry, key: CacheKey) -> broadcast::Receiver<FetchOutcome> {
        let (tx, rx) = broadcast::channel(1);
        let shared = Arc::clone(&self.shared);
        let task_tx = tx.clone();
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            let outcome = fetch_with_retry(&shared, &task_key).await;
            {
                let mut entries = lock_entries(&shared);
                if let Some(entry) = entries.get_mut(&task_key) {
                    match &outcome {
                        Ok(value) => {
                            entry.data = Some(value.clone());
                            entry.fetched_at = Some(Utc::now());
                            entry.state = if entry.invalidated_while_loading {
                                CacheState::Stale
                            } else {
                                CacheState::Fresh
                            };
                            entry.error_detail = None;
                        }
                        Err(e) => {
                            tracing::warn!(key = ?task_key, error = %e, "cache fetch failed");
                            entry.state = CacheState::Error;
                            entry.error_detail = Some(e.to_string());
                        }
                    }
                    entry.invalidated_while_loading = false;
                    entry.inflight = None;
                }
            }
            let _ = task_tx.send(outcome);
        });
        entry.state = CacheState::Loading;
        entry.invalidated_while_loading = false;
        entry.inflight = Some(InFlight {
            tx,
            waiters: 1,
            abort: handle.abort_handle(),
        });
        rx
    }

    async fn await_outcome(
        &self,
        key: CacheKey,
        mut rx: broadcast::Receiver<FetchOutcome>,
    ) -> Result<CacheRead, CacheError> {
        let mut waiter = Waiter {
            shared: Arc::clone(&self.shared),
            key,
            attached: true,
        };
        let outcome = rx.recv().await;
        waiter.attached = false;
        match outcome {
            Ok(Ok(value)) => Ok(CacheRead::from_fetch(value, Utc::now())),
            Ok(Err(e)) => Err(e),
            // The sender is gone without a result: the fetch was aborted.
            Err(_) => Err(CacheError::Cancelled),
        }
    }
}

fn kind_mismatch(expected: EntityKind, got: &CachedValue) -> CacheError {
    CacheError::FetchFailed {
        detail: format!(
            "cached value kind mismatch: expected {:?}, got {:?}",
            expected,
            got.kind()
        ),
    }
}

/// Tracks one attached reader of an in-flight fetch. Dropping the last
/// waiter aborts the fetch and reverts the entry to its pre-fetch state.
struct Waiter<F> {
    shared: Arc<Shared<F>>,
    key: CacheKey,
    attached: bool,
}

impl<F> Drop for Waiter<F> {
    fn drop(&mut self) {
        if !self.attached {
            return;
        }
        let mut entries = lock_entries(&self.shared);
        if let Some(entry) = entries.get_mut(&self.key) {
            if let Some(inflight) = entry.inflight.as_mut() {
                inflight.waiters = inflight.waiters.saturating_sub(1);
                if inflight.waiters == 0 {
                    tracing::debug!(key = ?self.key, "last reader detached, aborting fetch");
                    inflight.abort.abort();
                    entry.inflight = None;
                    entry.state = if entry.data.is_some() {
                        CacheState::Stale
                    } else {
                        CacheState::Empty
                    };
                    entry.invalidated_while_loading = false;
                }
            }
        }
    }
}

async fn fetch_with_retry<F: RemoteFetcher>(shared: &Shared<F>, key: &CacheKey) -> FetchOutcome {
    let mut attempt = 0u32;
    loop {
        match fetch_once(&shared.fetcher, key).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let retryable = matches!(e, RemoteError::Transport { .. } | RemoteError::Timeout);
                if retryable && attempt < shared.config.retry_max {
                    let delay = shared.config.retry_backoff * 2u32.saturating_pow(attempt);
                    tracing::debug!(?key, attempt, error = %e, "read failed, backing off");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                return Err(if retryable {
                    CacheError::RetriesExhausted {
                        detail: e.to_string(),
                    }
                } else {
                    CacheError::FetchFailed {
                        detail: e.to_string(),
                    }
                });
            }
        }
    }
}

async fn fetch_once<F: RemoteFetcher>(
    fetcher: &F,
    key: &CacheKey,
) -> Result<CachedValue, RemoteError> {
    match key {
        CacheKey::Boards => fetcher.fetch_boards().await.map(CachedValue::Boards),
        CacheKey::Lists(board_id) => fetcher.fetch_lists(board_id).await.map(CachedValue::Lists),
        CacheKey::Tasks(list_id) => fetcher.fetch_tasks(list_id).await.map(CachedValue::Tasks),
        CacheKey::Comments(task_id) => fetcher
            .fetch_comments(task_id)
            .await
            .map(CachedValue::Comments),
        CacheKey::Members(board_id) => fetcher
            .fetch_members(board_id)
            .await
            .map(CachedValue::Members),
    }
}
