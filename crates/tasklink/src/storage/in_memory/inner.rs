//! Core in-memory data structures.
//!
//! Both inner types are wrapped in `Arc<Mutex<>>` for thread safety; see the
//! type aliases in the parent module.

use crate::domain::{DependencyEdge, EdgeId, NewTask, Task, TaskId};
use crate::error::{DependencyError, Result, StorageError};
use crate::id_generation::{IdGenerator, IdGeneratorConfig};
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Prefix for generated edge IDs.
pub const EDGE_ID_PREFIX: &str = "dep";

/// Sort key giving creation order: timestamp first, ID as tiebreak.
pub(super) type OrderKey = (DateTime<Utc>, EdgeId);

/// Task data (not thread-safe).
pub(crate) struct TaskStoreInner {
    /// Tasks indexed by ID
    pub(super) tasks: HashMap<TaskId, Task>,

    /// Generator for new task IDs
    id_generator: IdGenerator,
}

impl TaskStoreInner {
    pub(crate) fn new(prefix: String) -> Self {
        Self {
            tasks: HashMap::new(),
            id_generator: IdGenerator::new(IdGeneratorConfig {
                prefix,
                store_size: 0,
            }),
        }
    }

    pub(super) fn generate_id(&mut self, new_task: &NewTask) -> Result<TaskId> {
        self.id_generator.set_store_size(self.tasks.len());
        let id = self
            .id_generator
            .generate(&[new_task.title.as_str()])
            .map_err(|e| StorageError::IdGeneration(e.to_string()))?;
        Ok(TaskId::new(id))
    }

    /// Insert a task that already has an ID, replacing any task with that ID.
    pub(super) fn insert_existing(&mut self, task: Task) {
        self.id_generator.register_id(task.id.as_str());
        self.tasks.insert(task.id.clone(), task);
    }

    pub(super) fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let task = self.tasks.remove(id)?;
        self.id_generator.release_id(id.as_str());
        Some(task)
    }

    /// Tasks ordered by creation time, then ID.
    pub(super) fn sorted(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.values().cloned().collect();
        tasks.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        tasks
    }
}

/// Edge data (not thread-safe).
///
/// `by_dependent` and `by_blocking` are secondary indexes on each endpoint,
/// so "blockers of X" and "dependents of X" never scan the whole edge set.
/// `pairs` enforces the uniqueness constraint on the ordered pair.
pub(crate) struct EdgeStoreInner {
    pub(super) edges: HashMap<EdgeId, DependencyEdge>,
    pub(super) order: BTreeSet<OrderKey>,
    pub(super) by_dependent: HashMap<TaskId, BTreeSet<OrderKey>>,
    pub(super) by_blocking: HashMap<TaskId, BTreeSet<OrderKey>>,
    pairs: HashSet<(TaskId, TaskId)>,
    id_generator: IdGenerator,
    last_created_at: Option<DateTime<Utc>>,
}

impl EdgeStoreInner {
    pub(crate) fn new() -> Self {
        Self {
            edges: HashMap::new(),
            order: BTreeSet::new(),
            by_dependent: HashMap::new(),
            by_blocking: HashMap::new(),
            pairs: HashSet::new(),
            id_generator: IdGenerator::new(IdGeneratorConfig {
                prefix: EDGE_ID_PREFIX.to_string(),
                store_size: 0,
            }),
            last_created_at: None,
        }
    }

    pub(super) fn contains_pair(&self, dependent: &TaskId, blocking: &TaskId) -> bool {
        self.pairs.contains(&(dependent.clone(), blocking.clone()))
    }

    pub(super) fn generate_id(&mut self, parts: &[&str]) -> Result<EdgeId> {
        self.id_generator.set_store_size(self.edges.len());
        let id = self
            .id_generator
            .generate(parts)
            .map_err(|e| StorageError::IdGeneration(e.to_string()))?;
        Ok(EdgeId::new(id))
    }

    /// A creation timestamp strictly later than every earlier one, so that
    /// timestamp order is insertion order.
    pub(super) fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_created_at {
            Some(last) if now <= last => last + Duration::nanoseconds(1),
            _ => now,
        };
        self.last_created_at = Some(stamp);
        stamp
    }

    /// Add an edge, enforcing unique IDs and unique ordered pairs.
    pub(super) fn insert_edge(&mut self, edge: DependencyEdge) -> Result<()> {
        if self.contains_pair(&edge.dependent_task_id, &edge.blocking_task_id) {
            return Err(DependencyError::DuplicateEdge {
                dependent: edge.dependent_task_id,
                blocking: edge.blocking_task_id,
            }
            .into());
        }
        if self.edges.contains_key(&edge.id) {
            return Err(
                StorageError::Validation(format!("duplicate edge id {}", edge.id)).into(),
            );
        }

        let key: OrderKey = (edge.created_at, edge.id.clone());
        self.order.insert(key.clone());
        self.by_dependent
            .entry(edge.dependent_task_id.clone())
            .or_default()
            .insert(key.clone());
        self.by_blocking
            .entry(edge.blocking_task_id.clone())
            .or_default()
            .insert(key);
        self.pairs.insert((
            edge.dependent_task_id.clone(),
            edge.blocking_task_id.clone(),
        ));
        self.id_generator.register_id(edge.id.as_str());
        if self.last_created_at.is_none_or(|last| edge.created_at > last) {
            self.last_created_at = Some(edge.created_at);
        }
        self.edges.insert(edge.id.clone(), edge);
        Ok(())
    }

    pub(super) fn remove_edge(&mut self, id: &EdgeId) -> Option<DependencyEdge> {
        let edge = self.edges.remove(id)?;
        let key: OrderKey = (edge.created_at, edge.id.clone());

        self.order.remove(&key);
        remove_from_index(&mut self.by_dependent, &edge.dependent_task_id, &key);
        remove_from_index(&mut self.by_blocking, &edge.blocking_task_id, &key);
        self.pairs.remove(&(
            edge.dependent_task_id.clone(),
            edge.blocking_task_id.clone(),
        ));
        self.id_generator.release_id(id.as_str());

        Some(edge)
    }

    /// Resolve order keys to edges, preserving key order.
    pub(super) fn resolve<'a>(
        &self,
        keys: impl IntoIterator<Item = &'a OrderKey>,
    ) -> Vec<DependencyEdge> {
        keys.into_iter()
            .filter_map(|(_, id)| self.edges.get(id).cloned())
            .collect()
    }
}

fn remove_from_index(
    index: &mut HashMap<TaskId, BTreeSet<OrderKey>>,
    task_id: &TaskId,
    key: &OrderKey,
) {
    if let Some(keys) = index.get_mut(task_id) {
        keys.remove(key);
        if keys.is_empty() {
            index.remove(task_id);
        }
    }
}
