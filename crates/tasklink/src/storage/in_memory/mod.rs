//! In-memory storage backend.
//!
//! All data is held in RAM and lost when the process exits unless the store
//! is wrapped for JSONL persistence (see [`crate::storage::create_stores`]).
//!
//! # Architecture
//!
//! - Tasks: `HashMap<TaskId, Task>` plus a hash-based ID generator
//! - Edges: `HashMap<EdgeId, DependencyEdge>` with ordered secondary indexes
//!   on both endpoints and a set of ordered pairs for the uniqueness
//!   constraint
//!
//! The edge store holds no graph structure of its own. Graph questions are
//! answered by [`crate::graph`] from a snapshot of [`EdgeStore::list`].
//!
//! # Thread Safety
//!
//! Each store is an `Arc<Mutex<Inner>>`; every operation holds the lock for
//! its whole duration.
//!
//! [`EdgeStore::list`]: crate::storage::EdgeStore::list

mod inner;
mod jsonl;
mod trait_impl;

use crate::storage::{EdgeStore, TaskStore};
use inner::{EdgeStoreInner, TaskStoreInner};
use std::sync::Arc;
use tokio::sync::Mutex;

pub use inner::EDGE_ID_PREFIX;
pub use jsonl::{
    load_edges_from_jsonl, load_tasks_from_jsonl, save_edges_to_jsonl, save_tasks_to_jsonl,
    LoadWarning,
};

/// Thread-safe in-memory task store.
pub(crate) type InMemoryTaskStore = Arc<Mutex<TaskStoreInner>>;

/// Thread-safe in-memory edge store.
pub(crate) type InMemoryEdgeStore = Arc<Mutex<EdgeStoreInner>>;

/// Create an empty in-memory task store.
///
/// # Example
///
/// ```
/// use tasklink::storage::in_memory::new_in_memory_task_store;
///
/// let store = new_in_memory_task_store("proj".to_string());
/// ```
pub fn new_in_memory_task_store(prefix: String) -> Box<dyn TaskStore> {
    Box::new(Arc::new(Mutex::new(TaskStoreInner::new(prefix))))
}

/// Create an empty in-memory edge store.
pub fn new_in_memory_edge_store() -> Box<dyn EdgeStore> {
    Box::new(Arc::new(Mutex::new(EdgeStoreInner::new())))
}
