//! End-to-end flows across the session gate, entity cache and mutation
//! coordinator, with the remote API mocked at the fetcher boundary.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use flowboard_client::{MutationCoordinator, SessionGate};
use flowboard_core::{
    Board, BoardId, BoardList, BoardMember, CacheKey, Comment, EntityKind, ListId, RemoteError,
    SessionStatus, StorageError, Task, TaskId, WriteScope,
};
use flowboard_storage::{
    CacheConfig, CacheState, CredentialStore, EntityCache, MemorySecureStore, RemoteFetcher,
    SaveOptions, SecureStore, SESSION_CREDENTIAL,
};

fn task(id: &str, list: &str) -> Task {
    Task {
        id: TaskId::new(id),
        title: format!("task {id}"),
        description: String::new(),
        priority: "medium".to_string(),
        position: 0,
        due_date: "2025-09-01".to_string(),
        list_id: ListId::new(list),
    }
}

/// Serves a mutable set of tasks per list, counting fetches.
#[derive(Default)]
struct FakeRemote {
    tasks: Mutex<Vec<Task>>,
    task_fetches: AtomicUsize,
    list_fetches: AtomicUsize,
}

#[async_trait]
impl RemoteFetcher for FakeRemote {
    async fn fetch_boards(&self) -> Result<Vec<Board>, RemoteError> {
        Ok(Vec::new())
    }

    async fn fetch_lists(&self, _board_id: &BoardId) -> Result<Vec<BoardList>, RemoteError> {
        self.list_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn fetch_tasks(&self, list_id: &ListId) -> Result<Vec<Task>, RemoteError> {
        self.task_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| &t.list_id == list_id)
            .cloned()
            .collect())
    }

    async fn fetch_comments(&self, _task_id: &TaskId) -> Result<Vec<Comment>, RemoteError> {
        Ok(Vec::new())
    }

    async fn fetch_members(&self, _board_id: &BoardId) -> Result<Vec<BoardMember>, RemoteError> {
        Ok(Vec::new())
    }
}

fn cache_over(remote: FakeRemote) -> EntityCache<FakeRemote> {
    EntityCache::new(
        remote,
        CacheConfig::new().with_retry_backoff(Duration::from_millis(1)),
    )
}

#[tokio::test]
async fn create_task_mutation_invalidates_and_refetches() {
    let remote = FakeRemote::default();
    remote.tasks.lock().unwrap().extend([
        task("t1", "l1"),
        task("t2", "l1"),
        task("t3", "l1"),
    ]);
    let coordinator = MutationCoordinator::new(cache_over(remote));
    let list = ListId::new("l1");

    // Warm the cache: three tasks, one fetch.
    assert_eq!(coordinator.cache().tasks(list.clone()).await.unwrap().len(), 3);

    // A confirmed create lands a fourth task server-side.
    let affects = [(EntityKind::Task, WriteScope::list(list.clone()))];
    coordinator
        .run("create-task", &affects, async {
            Ok::<_, RemoteError>(task("t4", "l1"))
        })
        .await
        .unwrap();

    // Simulate the server now holding the new task.
    coordinator
        .cache()
        .fetcher()
        .tasks
        .lock()
        .unwrap()
        .push(task("t4", "l1"));

    assert_eq!(
        coordinator.cache().snapshot(&CacheKey::Tasks(list.clone())).state,
        CacheState::Stale
    );

    // Next read triggers exactly one refetch and sees four tasks.
    let tasks = coordinator.cache().tasks(list).await.unwrap();
    assert_eq!(tasks.len(), 4);
    assert_eq!(
        coordinator.cache().fetcher().task_fetches.load(Ordering::SeqCst),
        2,
        "one warm fetch plus one refetch"
    );
}

#[tokio::test]
async fn task_mutation_does_not_touch_unrelated_keys() {
    let remote = FakeRemote::default();
    let coordinator = MutationCoordinator::new(cache_over(remote));
    let list = ListId::new("l1");
    let board = BoardId::new("b1");

    coordinator.cache().tasks(list.clone()).await.unwrap();
    coordinator.cache().lists(board.clone()).await.unwrap();
    coordinator.cache().boards().await.unwrap();

    let affects = [(EntityKind::Task, WriteScope::list(list.clone()))];
    coordinator
        .run("update-task", &affects, async { Ok::<_, RemoteError>(()) })
        .await
        .unwrap();

    assert_eq!(
        coordinator.cache().snapshot(&CacheKey::Tasks(list)).state,
        CacheState::Stale
    );
    // One hop only: boards and lists stay fresh.
    assert_eq!(
        coordinator.cache().snapshot(&CacheKey::Boards).state,
        CacheState::Fresh
    );
    assert_eq!(
        coordinator.cache().snapshot(&CacheKey::Lists(board)).state,
        CacheState::Fresh
    );
}

#[tokio::test]
async fn failed_mutation_leaves_every_key_in_its_prior_state() {
    let remote = FakeRemote::default();
    remote.tasks.lock().unwrap().push(task("t1", "l1"));
    let coordinator = MutationCoordinator::new(cache_over(remote));
    let list = ListId::new("l1");

    coordinator.cache().tasks(list.clone()).await.unwrap();

    let affects = [(EntityKind::Task, WriteScope::list(list.clone()))];
    let result = coordinator
        .run("create-task", &affects, async {
            Err::<(), _>(RemoteError::Server {
                message: "quota exceeded".to_string(),
            })
        })
        .await;
    assert!(result.is_err());

    let snap = coordinator.cache().snapshot(&CacheKey::Tasks(list));
    assert_eq!(snap.state, CacheState::Fresh);
    assert_eq!(snap.data.map(|d| d.len()), Some(1));
}

/// Secure store whose probes always fail, for fail-closed boot checks.
struct BrokenSecureStore;

#[async_trait]
impl SecureStore for BrokenSecureStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable {
            reason: "keystore locked".to_string(),
        })
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::WriteFailed {
            reason: "keystore locked".to_string(),
        })
    }

    async fn delete(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable {
            reason: "keystore locked".to_string(),
        })
    }

    async fn contains(&self, _key: &str) -> Result<bool, StorageError> {
        Err(StorageError::Unavailable {
            reason: "keystore locked".to_string(),
        })
    }
}

#[tokio::test]
async fn boot_fails_closed_when_storage_is_broken() {
    let gate = SessionGate::new(Arc::new(CredentialStore::new(BrokenSecureStore)));
    assert_eq!(gate.resolve().await, SessionStatus::Unauthenticated);
    assert_ne!(gate.status(), SessionStatus::Authenticated);
}

#[tokio::test]
async fn credential_round_trip_gates_authentication() {
    let credentials = Arc::new(CredentialStore::new(MemorySecureStore::new()));
    let payload = serde_json::json!({
        "token": "tok-1",
        "userId": "u1",
        "email": "ada@example.com",
        "firstname": "Ada",
    })
    .to_string();
    credentials
        .save(
            SESSION_CREDENTIAL,
            payload,
            SaveOptions {
                expires_at: Some(Utc::now() + chrono::Duration::days(365)),
                secure: true,
            },
        )
        .await
        .unwrap();

    let gate = SessionGate::new(Arc::clone(&credentials));
    assert_eq!(gate.resolve().await, SessionStatus::Authenticated);
    assert_eq!(gate.bearer_token().await.unwrap(), "tok-1");

    credentials.remove(SESSION_CREDENTIAL).await.unwrap();
    assert_eq!(gate.bearer_token().await, Err(RemoteError::AuthRequired));
    assert_eq!(gate.status(), SessionStatus::Unauthenticated);
}
