//! Storage abstraction layer for tasklink.
//!
//! Two stores back the dependency engine:
//!
//! - [`TaskStore`]: the task collaborator. The engine reads task existence
//!   and status from it and deletes tasks through it during cascade delete.
//! - [`EdgeStore`]: the dependency edges, with a uniqueness constraint on the
//!   ordered `(dependent, blocking)` pair and lookups from either end.
//!
//! Both traits are async and object-safe so the engine can hold
//! `Box<dyn TaskStore>` and `Box<dyn EdgeStore>` regardless of backend.
//!
//! # Backends
//!
//! - **In-memory**: ephemeral, `HashMap`-backed
//! - **JSONL**: in-memory stores that load from and save to JSON Lines files
//!
//! # Test Utilities
//!
//! [`MockTaskStore`] and [`MockEdgeStore`] wrap the in-memory stores with
//! switchable failures, for exercising rollback paths. It is available in unit tests and behind
//! the `test-util` feature:
//!
//! ```toml
//! [dev-dependencies]
//! tasklink = { version = "...", features = ["test-util"] }
//! ```
//!
//! # Example
//!
//! ```no_run
//! use tasklink::storage::{create_stores, StorageBackend};
//! use tasklink::domain::NewTask;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let mut stores = create_stores(StorageBackend::InMemory, "proj".to_string()).await?;
//!     let task = stores.tasks.create(NewTask::new("Write docs")).await?;
//!     println!("Created task: {}", task.id);
//!     Ok(())
//! }
//! ```

use crate::domain::{DependencyEdge, EdgeId, NewDependency, NewTask, Task, TaskId, TaskStatus};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;

pub mod in_memory;
pub mod jsonl_io;

/// Task collaborator contract.
///
/// Mutating methods take `&mut self`; the engine serializes them behind its
/// write lock.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Create a task with a generated ID, in `pending` status.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Validation` if the title is empty or too long.
    async fn create(&mut self, task: NewTask) -> Result<Task>;

    /// Get a task by ID, or `None` if it does not exist.
    async fn get(&self, id: &TaskId) -> Result<Option<Task>>;

    /// All tasks, oldest first.
    async fn list(&self) -> Result<Vec<Task>>;

    /// Change a task's status and bump `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `DependencyError::TaskNotFound` if the task does not exist.
    async fn set_status(&mut self, id: &TaskId, status: TaskStatus) -> Result<Task>;

    /// Remove a task and return it.
    ///
    /// # Errors
    ///
    /// Returns `DependencyError::TaskNotFound` if the task does not exist.
    async fn delete(&mut self, id: &TaskId) -> Result<Task>;

    /// Insert tasks as-is, keeping their IDs and timestamps.
    async fn import_tasks(&mut self, tasks: Vec<Task>) -> Result<()>;

    /// Every task, in the same order as [`TaskStore::list`].
    async fn export_all(&self) -> Result<Vec<Task>>;

    /// Persist the current state. A no-op for purely in-memory stores.
    async fn save(&self) -> Result<()>;

    /// Discard in-memory state and re-read the backing file.
    ///
    /// Called after a failed [`TaskStore::save`] so memory matches disk
    /// again. A no-op for purely in-memory stores.
    async fn reload(&mut self) -> Result<()>;
}

/// Dependency edge store.
///
/// The store enforces only what a table would: unique edge IDs and a unique
/// ordered pair. Graph-level validation (missing tasks, fan-out, cycles) is
/// the engine's job and happens before [`EdgeStore::insert`].
#[async_trait]
pub trait EdgeStore: Send + Sync {
    /// Persist a new edge with a generated ID and timestamp.
    ///
    /// # Errors
    ///
    /// Returns `DependencyError::DuplicateEdge` if the pair already exists.
    async fn insert(&mut self, dependency: NewDependency) -> Result<DependencyEdge>;

    /// Remove an edge by ID, returning it if it existed.
    async fn remove(&mut self, id: &EdgeId) -> Result<Option<DependencyEdge>>;

    /// Remove every edge that has `task_id` at either end.
    ///
    /// Returns the removed edges in creation order.
    async fn remove_for_task(&mut self, task_id: &TaskId) -> Result<Vec<DependencyEdge>>;

    /// Edges where `task_id` is the dependent (its blockers).
    async fn dependencies_of(&self, task_id: &TaskId) -> Result<Vec<DependencyEdge>>;

    /// Edges where `task_id` is the blocker (its dependents).
    async fn dependents_of(&self, task_id: &TaskId) -> Result<Vec<DependencyEdge>>;

    /// Every edge, in creation order.
    async fn list(&self) -> Result<Vec<DependencyEdge>>;

    /// Insert edges as-is, keeping IDs and timestamps.
    ///
    /// Used to restore edges after a failed cascade delete and when loading
    /// from disk.
    ///
    /// # Errors
    ///
    /// Returns `DependencyError::DuplicateEdge` if a pair already exists.
    async fn import_edges(&mut self, edges: Vec<DependencyEdge>) -> Result<()>;

    /// Persist the current state. A no-op for purely in-memory stores.
    async fn save(&self) -> Result<()>;

    /// Discard in-memory state and re-read the backing file.
    async fn reload(&mut self) -> Result<()>;
}

/// Storage backend configuration.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// Ephemeral in-memory stores
    InMemory,

    /// In-memory stores persisted to JSONL files
    Jsonl {
        /// Task file path
        tasks: PathBuf,
        /// Dependency edge file path
        dependencies: PathBuf,
    },
}

/// The pair of stores the engine operates on.
pub struct Stores {
    /// Task store
    pub tasks: Box<dyn TaskStore>,
    /// Edge store
    pub edges: Box<dyn EdgeStore>,
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}

/// Adds JSONL file persistence to an in-memory task store.
struct JsonlBackedTaskStore {
    inner: Box<dyn TaskStore>,
    path: PathBuf,
    prefix: String,
}

#[async_trait]
impl TaskStore for JsonlBackedTaskStore {
    async fn create(&mut self, task: NewTask) -> Result<Task> {
        self.inner.create(task).await
    }

    async fn get(&self, id: &TaskId) -> Result<Option<Task>> {
        self.inner.get(id).await
    }

    async fn list(&self) -> Result<Vec<Task>> {
        self.inner.list().await
    }

    async fn set_status(&mut self, id: &TaskId, status: TaskStatus) -> Result<Task> {
        self.inner.set_status(id, status).await
    }

    async fn delete(&mut self, id: &TaskId) -> Result<Task> {
        self.inner.delete(id).await
    }

    async fn import_tasks(&mut self, tasks: Vec<Task>) -> Result<()> {
        self.inner.import_tasks(tasks).await
    }

    async fn export_all(&self) -> Result<Vec<Task>> {
        self.inner.export_all().await
    }

    async fn save(&self) -> Result<()> {
        in_memory::save_tasks_to_jsonl(self.inner.as_ref(), &self.path).await
    }

    async fn reload(&mut self) -> Result<()> {
        self.inner = open_task_store(&self.path, &self.prefix).await?;
        Ok(())
    }
}

/// Adds JSONL file persistence to an in-memory edge store.
struct JsonlBackedEdgeStore {
    inner: Box<dyn EdgeStore>,
    path: PathBuf,
}

#[async_trait]
impl EdgeStore for JsonlBackedEdgeStore {
    async fn insert(&mut self, dependency: NewDependency) -> Result<DependencyEdge> {
        self.inner.insert(dependency).await
    }

    async fn remove(&mut self, id: &EdgeId) -> Result<Option<DependencyEdge>> {
        self.inner.remove(id).await
    }

    async fn remove_for_task(&mut self, task_id: &TaskId) -> Result<Vec<DependencyEdge>> {
        self.inner.remove_for_task(task_id).await
    }

    async fn dependencies_of(&self, task_id: &TaskId) -> Result<Vec<DependencyEdge>> {
        self.inner.dependencies_of(task_id).await
    }

    async fn dependents_of(&self, task_id: &TaskId) -> Result<Vec<DependencyEdge>> {
        self.inner.dependents_of(task_id).await
    }

    async fn list(&self) -> Result<Vec<DependencyEdge>> {
        self.inner.list().await
    }

    async fn import_edges(&mut self, edges: Vec<DependencyEdge>) -> Result<()> {
        self.inner.import_edges(edges).await
    }

    async fn save(&self) -> Result<()> {
        in_memory::save_edges_to_jsonl(self.inner.as_ref(), &self.path).await
    }

    async fn reload(&mut self) -> Result<()> {
        // Task existence is not re-checked here; the engine never lets an
        // edge outlive its endpoints, so only structural checks apply.
        self.inner = open_edge_store(&self.path, None).await?;
        Ok(())
    }
}

async fn open_task_store(path: &std::path::Path, prefix: &str) -> Result<Box<dyn TaskStore>> {
    if !path.exists() {
        return Ok(in_memory::new_in_memory_task_store(prefix.to_string()));
    }

    let (store, warnings) = in_memory::load_tasks_from_jsonl(path, prefix.to_string()).await?;
    for warning in &warnings {
        tracing::warn!(warning = %warning, path = %path.display(), "Task file load warning");
    }
    Ok(store)
}

async fn open_edge_store(
    path: &std::path::Path,
    known_tasks: Option<&HashSet<TaskId>>,
) -> Result<Box<dyn EdgeStore>> {
    if !path.exists() {
        return Ok(in_memory::new_in_memory_edge_store());
    }

    let (store, warnings) = in_memory::load_edges_from_jsonl(path, known_tasks).await?;
    for warning in &warnings {
        tracing::warn!(warning = %warning, path = %path.display(), "Dependency file load warning");
    }
    Ok(store)
}

/// Create the task and edge stores for a backend.
///
/// For JSONL, tasks load first so that edges referencing missing tasks can be
/// dropped with a warning. Missing files are treated as empty stores.
///
/// # Errors
///
/// - `Error::Io` if a file exists but cannot be read
pub async fn create_stores(backend: StorageBackend, prefix: String) -> Result<Stores> {
    match backend {
        StorageBackend::InMemory => Ok(Stores {
            tasks: in_memory::new_in_memory_task_store(prefix),
            edges: in_memory::new_in_memory_edge_store(),
        }),
        StorageBackend::Jsonl {
            tasks: tasks_path,
            dependencies: dependencies_path,
        } => {
            let tasks = open_task_store(&tasks_path, &prefix).await?;
            let known: HashSet<TaskId> = tasks
                .export_all()
                .await?
                .into_iter()
                .map(|task| task.id)
                .collect();
            let edges = open_edge_store(&dependencies_path, Some(&known)).await?;

            Ok(Stores {
                tasks: Box::new(JsonlBackedTaskStore {
                    inner: tasks,
                    path: tasks_path,
                    prefix,
                }),
                edges: Box::new(JsonlBackedEdgeStore {
                    inner: edges,
                    path: dependencies_path,
                }),
            })
        }
    }
}

// ========== Test Utilities ==========

#[cfg(any(test, feature = "test-util"))]
pub use mock::{FailureSwitches, MockEdgeStore, MockTaskStore};

#[cfg(any(test, feature = "test-util"))]
mod mock {
    use super::{in_memory, EdgeStore, TaskStore};
    use crate::domain::{DependencyEdge, EdgeId, NewDependency, NewTask, Task, TaskId, TaskStatus};
    use crate::error::{Error, Result};
    use async_trait::async_trait;
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Shared toggles that make a mock store fail on demand.
    ///
    /// Clone the switches before handing the store to an engine, then flip
    /// them from the test.
    #[derive(Debug, Clone, Default)]
    pub struct FailureSwitches {
        fail_delete: Arc<AtomicBool>,
        fail_save: Arc<AtomicBool>,
    }

    impl FailureSwitches {
        /// Make task `delete` fail until turned off.
        pub fn fail_delete(&self, on: bool) {
            self.fail_delete.store(on, Ordering::SeqCst);
        }

        /// Make `save` fail until turned off.
        pub fn fail_save(&self, on: bool) {
            self.fail_save.store(on, Ordering::SeqCst);
        }
    }

    /// Task store for testing failure handling.
    ///
    /// Behaves like the in-memory store until a [`FailureSwitches`] toggle is
    /// set. `reload` restores the state captured by the last successful `save`.
    pub struct MockTaskStore {
        inner: Box<dyn TaskStore>,
        saved: Mutex<Vec<Task>>,
        prefix: String,
        switches: FailureSwitches,
    }

    impl MockTaskStore {
        /// Create an empty mock store.
        pub fn new(prefix: &str) -> Self {
            Self {
                inner: in_memory::new_in_memory_task_store(prefix.to_string()),
                saved: Mutex::new(Vec::new()),
                prefix: prefix.to_string(),
                switches: FailureSwitches::default(),
            }
        }

        /// Handle for toggling failures.
        pub fn switches(&self) -> FailureSwitches {
            self.switches.clone()
        }
    }

    fn injected(what: &str) -> Error {
        Error::Io(io::Error::other(format!("injected {what} failure")))
    }

    #[async_trait]
    impl TaskStore for MockTaskStore {
        async fn create(&mut self, task: NewTask) -> Result<Task> {
            self.inner.create(task).await
        }

        async fn get(&self, id: &TaskId) -> Result<Option<Task>> {
            self.inner.get(id).await
        }

        async fn list(&self) -> Result<Vec<Task>> {
            self.inner.list().await
        }

        async fn set_status(&mut self, id: &TaskId, status: TaskStatus) -> Result<Task> {
            self.inner.set_status(id, status).await
        }

        async fn delete(&mut self, id: &TaskId) -> Result<Task> {
            if self.switches.fail_delete.load(Ordering::SeqCst) {
                return Err(injected("delete"));
            }
            self.inner.delete(id).await
        }

        async fn import_tasks(&mut self, tasks: Vec<Task>) -> Result<()> {
            self.inner.import_tasks(tasks).await
        }

        async fn export_all(&self) -> Result<Vec<Task>> {
            self.inner.export_all().await
        }

        async fn save(&self) -> Result<()> {
            if self.switches.fail_save.load(Ordering::SeqCst) {
                return Err(injected("save"));
            }
            *self.saved.lock().await = self.inner.export_all().await?;
            Ok(())
        }

        async fn reload(&mut self) -> Result<()> {
            let mut fresh = in_memory::new_in_memory_task_store(self.prefix.clone());
            let saved = self.saved.lock().await.clone();
            fresh.import_tasks(saved).await?;
            self.inner = fresh;
            Ok(())
        }
    }

    /// Edge store for testing failure handling.
    ///
    /// Only `save` can be made to fail. `reload` restores the edges captured
    /// by the last successful `save`.
    pub struct MockEdgeStore {
        inner: Box<dyn EdgeStore>,
        saved: Mutex<Vec<DependencyEdge>>,
        switches: FailureSwitches,
    }

    impl MockEdgeStore {
        /// Create an empty mock store.
        pub fn new() -> Self {
            Self {
                inner: in_memory::new_in_memory_edge_store(),
                saved: Mutex::new(Vec::new()),
                switches: FailureSwitches::default(),
            }
        }

        /// Handle for toggling failures.
        pub fn switches(&self) -> FailureSwitches {
            self.switches.clone()
        }
    }

    impl Default for MockEdgeStore {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl EdgeStore for MockEdgeStore {
        async fn insert(&mut self, dependency: NewDependency) -> Result<DependencyEdge> {
            self.inner.insert(dependency).await
        }

        async fn remove(&mut self, id: &EdgeId) -> Result<Option<DependencyEdge>> {
            self.inner.remove(id).await
        }

        async fn remove_for_task(&mut self, task_id: &TaskId) -> Result<Vec<DependencyEdge>> {
            self.inner.remove_for_task(task_id).await
        }

        async fn dependencies_of(&self, task_id: &TaskId) -> Result<Vec<DependencyEdge>> {
            self.inner.dependencies_of(task_id).await
        }

        async fn dependents_of(&self, task_id: &TaskId) -> Result<Vec<DependencyEdge>> {
            self.inner.dependents_of(task_id).await
        }

        async fn list(&self) -> Result<Vec<DependencyEdge>> {
            self.inner.list().await
        }

        async fn import_edges(&mut self, edges: Vec<DependencyEdge>) -> Result<()> {
            self.inner.import_edges(edges).await
        }

        async fn save(&self) -> Result<()> {
            if self.switches.fail_save.load(Ordering::SeqCst) {
                return Err(injected("save"));
            }
            *self.saved.lock().await = self.inner.list().await?;
            Ok(())
        }

        async fn reload(&mut self) -> Result<()> {
            let mut fresh = in_memory::new_in_memory_edge_store();
            let saved = self.saved.lock().await.clone();
            fresh.import_edges(saved).await?;
            self.inner = fresh;
            Ok(())
        }
    }
}
