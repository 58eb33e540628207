//! The dependency engine: tasklink's in-process API.
//!
//! [`DependencyEngine`] owns the task and edge stores behind a single
//! [`RwLock`]:
//!
//! - Mutations take the write lock for their whole validate-then-commit
//!   sequence, so two concurrent insertions can never both validate against
//!   the same stale edge set and jointly close a cycle.
//! - Queries take the read lock and always see a fully committed snapshot.
//!
//! Every query is recomputed from a fresh snapshot of edges and tasks; the
//! engine keeps no derived state between calls.
//!
//! # Persistence
//!
//! After each committed mutation the affected store is saved. If saving
//! fails, the store is reloaded so memory matches disk again, and the save
//! error is returned.
//!
//! # Example
//!
//! ```
//! use tasklink::domain::NewTask;
//! use tasklink::engine::DependencyEngine;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> tasklink::error::Result<()> {
//! let engine = DependencyEngine::in_memory("demo");
//! let write = engine.create_task(NewTask::new("Write code")).await?;
//! let review = engine.create_task(NewTask::new("Review code")).await?;
//!
//! engine.create_dependency(&review.id, &write.id, "alice").await?;
//! assert!(engine.dependency_info(&review.id).await?.is_blocked);
//! assert!(engine.would_create_cycle(&write.id, &review.id).await?.would_cycle);
//! # Ok(())
//! # }
//! ```

use crate::domain::{
    BlockedTaskInfo, BulkStartOutcome, BulkStartPolicy, ChainEntry, CycleCheck, DeleteSummary,
    DependencyEdge, DependencyInfo, EdgeId, NewDependency, NewTask, Task, TaskId, TaskStatus,
};
use crate::error::{DependencyError, Result};
use crate::graph;
use crate::storage::in_memory::{new_in_memory_edge_store, new_in_memory_task_store};
use crate::storage::{create_stores, StorageBackend, Stores};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Task dependency graph engine.
#[derive(Debug)]
pub struct DependencyEngine {
    stores: RwLock<Stores>,
}

/// A consistent view of both stores taken under one lock.
struct Snapshot {
    tasks: Vec<Task>,
    edges: Vec<DependencyEdge>,
}

impl Snapshot {
    async fn take(stores: &Stores) -> Result<Self> {
        Ok(Self {
            tasks: stores.tasks.list().await?,
            edges: stores.edges.list().await?,
        })
    }

    fn require_task(&self, id: &TaskId) -> Result<&Task> {
        self.tasks
            .iter()
            .find(|task| &task.id == id)
            .ok_or_else(|| DependencyError::TaskNotFound(id.clone()).into())
    }
}

impl DependencyEngine {
    /// Create an engine over the given stores.
    pub fn new(stores: Stores) -> Self {
        Self {
            stores: RwLock::new(stores),
        }
    }

    /// Create an engine over fresh in-memory stores.
    pub fn in_memory(prefix: &str) -> Self {
        Self::new(Stores {
            tasks: new_in_memory_task_store(prefix.to_string()),
            edges: new_in_memory_edge_store(),
        })
    }

    /// Open the stores for `backend` and wrap them in an engine.
    ///
    /// # Errors
    ///
    /// Returns an error if a backing file exists but cannot be read.
    pub async fn open(backend: StorageBackend, prefix: String) -> Result<Self> {
        Ok(Self::new(create_stores(backend, prefix).await?))
    }

    // ========== Tasks ==========

    /// Create a task in `pending` status.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty or overlong title, or the save
    /// error if persisting fails.
    pub async fn create_task(&self, new_task: NewTask) -> Result<Task> {
        let mut stores = self.stores.write().await;
        let task = stores.tasks.create(new_task).await?;
        persist_tasks(&mut stores).await?;
        info!(task_id = %task.id, "Task created");
        Ok(task)
    }

    /// Look up a task.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get_task(&self, id: &TaskId) -> Result<Option<Task>> {
        let stores = self.stores.read().await;
        stores.tasks.get(id).await
    }

    /// All tasks, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        let stores = self.stores.read().await;
        stores.tasks.list().await
    }

    /// Change a task's status.
    ///
    /// Blocking is derived on every query, so a status change immediately
    /// blocks or unblocks the task's dependents.
    ///
    /// # Errors
    ///
    /// Returns [`DependencyError::TaskNotFound`] for an unknown task.
    pub async fn set_status(&self, id: &TaskId, status: TaskStatus) -> Result<Task> {
        let mut stores = self.stores.write().await;
        let task = stores.tasks.set_status(id, status).await?;
        persist_tasks(&mut stores).await?;
        info!(task_id = %id, %status, "Task status changed");
        Ok(task)
    }

    /// Delete a task together with every edge that references it.
    ///
    /// Edges and task are removed under one write lock. If the task store
    /// refuses the delete, the removed edges are put back. If the edge save
    /// fails, the edge store reloads its removed edges and the task is put
    /// back too.
    ///
    /// # Errors
    ///
    /// Returns [`DependencyError::TaskNotFound`] for an unknown task, or the
    /// store error after the in-memory state has been restored.
    pub async fn delete_task(&self, id: &TaskId) -> Result<DeleteSummary> {
        let mut stores = self.stores.write().await;
        if stores.tasks.get(id).await?.is_none() {
            return Err(DependencyError::TaskNotFound(id.clone()).into());
        }

        let removed = stores.edges.remove_for_task(id).await?;
        let deleted_count = removed.len();

        let task = match stores.tasks.delete(id).await {
            Ok(task) => task,
            Err(e) => {
                warn!(task_id = %id, error = %e, "Task delete failed, restoring dependencies");
                if let Err(restore) = stores.edges.import_edges(removed).await {
                    warn!(task_id = %id, error = %restore, "Failed to restore dependencies");
                    stores.edges.reload().await?;
                }
                return Err(e);
            }
        };

        // Edges first: if the task save fails afterwards the task reappears
        // on reload, but no edge on disk references a missing task.
        if let Err(e) = persist_edges(&mut stores).await {
            // The edge store now holds the on-disk edges again, which may
            // still reference this task.
            warn!(task_id = %id, "Restoring task after failed dependency save");
            stores.tasks.import_tasks(vec![task]).await?;
            return Err(e);
        }
        persist_tasks(&mut stores).await?;

        info!(task_id = %id, deleted_count, "Task deleted");
        Ok(DeleteSummary { deleted_count })
    }

    // ========== Dependency mutations ==========

    /// Add the edge "`dependent` cannot start until `blocking` completes".
    ///
    /// # Errors
    ///
    /// Returns the first failing [`DependencyError`] in validator order:
    /// self reference, missing task, duplicate, fan-out limit, cycle.
    pub async fn create_dependency(
        &self,
        dependent: &TaskId,
        blocking: &TaskId,
        created_by: impl Into<String>,
    ) -> Result<DependencyEdge> {
        let mut stores = self.stores.write().await;
        let snapshot = Snapshot::take(&stores).await?;
        let tasks = graph::tasks_by_id(&snapshot.tasks);

        if let Err(e) = graph::validate(dependent, blocking, &snapshot.edges, &tasks) {
            debug!(%dependent, %blocking, reason = %e, "Dependency rejected");
            return Err(e.into());
        }

        let edge = stores
            .edges
            .insert(NewDependency {
                dependent_task_id: dependent.clone(),
                blocking_task_id: blocking.clone(),
                created_by: created_by.into(),
            })
            .await?;
        persist_edges(&mut stores).await?;

        info!(edge_id = %edge.id, %dependent, %blocking, "Dependency created");
        Ok(edge)
    }

    /// Remove a single edge.
    ///
    /// # Errors
    ///
    /// Returns [`DependencyError::EdgeNotFound`] if no edge has this ID.
    pub async fn delete_dependency(&self, edge_id: &EdgeId) -> Result<()> {
        let mut stores = self.stores.write().await;
        let Some(edge) = stores.edges.remove(edge_id).await? else {
            return Err(DependencyError::EdgeNotFound(edge_id.clone()).into());
        };
        persist_edges(&mut stores).await?;

        info!(
            %edge_id,
            dependent = %edge.dependent_task_id,
            blocking = %edge.blocking_task_id,
            "Dependency deleted"
        );
        Ok(())
    }

    /// Remove every edge with `task_id` at either end.
    ///
    /// Succeeds with a zero count for a task with no edges, including one
    /// that has already been deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge store fails.
    pub async fn delete_dependencies_for_task(&self, task_id: &TaskId) -> Result<DeleteSummary> {
        let mut stores = self.stores.write().await;
        let removed = stores.edges.remove_for_task(task_id).await?;
        if !removed.is_empty() {
            persist_edges(&mut stores).await?;
        }

        info!(%task_id, deleted_count = removed.len(), "Dependencies for task deleted");
        Ok(DeleteSummary {
            deleted_count: removed.len(),
        })
    }

    /// Apply a bulk "move to in progress" with a caller-chosen policy.
    ///
    /// The blocked check and the status changes happen under one write lock.
    /// If a status change fails part way, earlier changes are reverted.
    ///
    /// # Errors
    ///
    /// Returns [`DependencyError::TaskNotFound`] if any requested ID is
    /// unknown; nothing is changed in that case.
    pub async fn start_tasks(
        &self,
        task_ids: &[TaskId],
        policy: BulkStartPolicy,
    ) -> Result<BulkStartOutcome> {
        let mut stores = self.stores.write().await;
        let snapshot = Snapshot::take(&stores).await?;
        let outcome = graph::plan_bulk_start(task_ids, policy, &snapshot.edges, &snapshot.tasks)?;

        let previous: HashMap<&TaskId, TaskStatus> = snapshot
            .tasks
            .iter()
            .map(|task| (&task.id, task.status))
            .collect();

        let mut changed: Vec<&TaskId> = Vec::with_capacity(outcome.started.len());
        for id in &outcome.started {
            if let Err(e) = stores.tasks.set_status(id, TaskStatus::InProgress).await {
                warn!(task_id = %id, error = %e, "Bulk start failed, reverting");
                for done in changed {
                    if let Some(status) = previous.get(done) {
                        stores.tasks.set_status(done, *status).await?;
                    }
                }
                return Err(e);
            }
            changed.push(id);
        }
        persist_tasks(&mut stores).await?;

        info!(
            started = outcome.started.len(),
            skipped = outcome.skipped.len(),
            ?policy,
            "Bulk start applied"
        );
        Ok(outcome)
    }

    // ========== Queries ==========

    /// Whether adding `dependent -> blocking` would close a cycle.
    ///
    /// A pre-flight check only; task existence is not verified.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge store fails.
    pub async fn would_create_cycle(
        &self,
        dependent: &TaskId,
        blocking: &TaskId,
    ) -> Result<CycleCheck> {
        let stores = self.stores.read().await;
        let edges = stores.edges.list().await?;
        Ok(graph::would_create_cycle(dependent, blocking, &edges))
    }

    /// The dependency view of one task.
    ///
    /// # Errors
    ///
    /// Returns [`DependencyError::TaskNotFound`] for an unknown task.
    pub async fn dependency_info(&self, task_id: &TaskId) -> Result<DependencyInfo> {
        let stores = self.stores.read().await;
        let snapshot = Snapshot::take(&stores).await?;
        graph::dependency_info(task_id, &snapshot.edges, &snapshot.tasks)
            .ok_or_else(|| DependencyError::TaskNotFound(task_id.clone()).into())
    }

    /// The dependency view of every task.
    ///
    /// # Errors
    ///
    /// Returns an error if a store fails.
    pub async fn dependency_index(&self) -> Result<HashMap<TaskId, DependencyInfo>> {
        let stores = self.stores.read().await;
        let snapshot = Snapshot::take(&stores).await?;
        Ok(graph::build_index(&snapshot.edges, &snapshot.tasks))
    }

    /// Everything `task_id` transitively depends on, with depth.
    ///
    /// # Errors
    ///
    /// Returns [`DependencyError::TaskNotFound`] for an unknown task.
    pub async fn upstream_chain(&self, task_id: &TaskId) -> Result<Vec<ChainEntry>> {
        let stores = self.stores.read().await;
        let snapshot = Snapshot::take(&stores).await?;
        snapshot.require_task(task_id)?;
        Ok(graph::upstream_chain(task_id, &snapshot.edges, &snapshot.tasks))
    }

    /// Everything that transitively depends on `task_id`, with depth.
    ///
    /// # Errors
    ///
    /// Returns [`DependencyError::TaskNotFound`] for an unknown task.
    pub async fn downstream_chain(&self, task_id: &TaskId) -> Result<Vec<ChainEntry>> {
        let stores = self.stores.read().await;
        let snapshot = Snapshot::take(&stores).await?;
        snapshot.require_task(task_id)?;
        Ok(graph::downstream_chain(task_id, &snapshot.edges, &snapshot.tasks))
    }

    /// Which of `task_ids` are blocked, and by how many incomplete blockers.
    ///
    /// # Errors
    ///
    /// Returns [`DependencyError::TaskNotFound`] if any ID is unknown.
    pub async fn blocked_tasks_info(&self, task_ids: &[TaskId]) -> Result<Vec<BlockedTaskInfo>> {
        let stores = self.stores.read().await;
        let snapshot = Snapshot::take(&stores).await?;
        Ok(graph::blocked_tasks_info(
            task_ids,
            &snapshot.edges,
            &snapshot.tasks,
        )?)
    }

    /// Tasks that could be added as a blocker of `task_id` right now.
    ///
    /// # Errors
    ///
    /// Returns [`DependencyError::TaskNotFound`] for an unknown task.
    pub async fn eligible_blockers(&self, task_id: &TaskId) -> Result<Vec<Task>> {
        let stores = self.stores.read().await;
        let snapshot = Snapshot::take(&stores).await?;
        snapshot.require_task(task_id)?;
        Ok(graph::eligible_blockers(task_id, &snapshot.edges, &snapshot.tasks))
    }

    /// Render a cycle path using current task titles.
    ///
    /// # Errors
    ///
    /// Returns an error if the task store fails.
    pub async fn format_cycle_path(&self, path: &[TaskId]) -> Result<String> {
        let stores = self.stores.read().await;
        let tasks = stores.tasks.list().await?;
        Ok(graph::format_cycle_path(path, &tasks))
    }

    /// Edges where `task_id` is the dependent.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge store fails.
    pub async fn dependencies_of(&self, task_id: &TaskId) -> Result<Vec<DependencyEdge>> {
        let stores = self.stores.read().await;
        stores.edges.dependencies_of(task_id).await
    }

    /// Edges where `task_id` is the blocker.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge store fails.
    pub async fn dependents_of(&self, task_id: &TaskId) -> Result<Vec<DependencyEdge>> {
        let stores = self.stores.read().await;
        stores.edges.dependents_of(task_id).await
    }

    /// Every edge, in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge store fails.
    pub async fn list_dependencies(&self) -> Result<Vec<DependencyEdge>> {
        let stores = self.stores.read().await;
        stores.edges.list().await
    }
}

async fn persist_tasks(stores: &mut Stores) -> Result<()> {
    if let Err(e) = stores.tasks.save().await {
        warn!(error = %e, "Saving tasks failed, reloading from disk");
        if let Err(reload) = stores.tasks.reload().await {
            warn!(error = %reload, "Reloading tasks failed");
        }
        return Err(e);
    }
    Ok(())
}

async fn persist_edges(stores: &mut Stores) -> Result<()> {
    if let Err(e) = stores.edges.save().await {
        warn!(error = %e, "Saving dependencies failed, reloading from disk");
        if let Err(reload) = stores.edges.reload().await {
            warn!(error = %reload, "Reloading dependencies failed");
        }
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::storage::in_memory::new_in_memory_task_store;
    use crate::storage::{MockEdgeStore, MockTaskStore};

    async fn engine_with(titles: &[&str]) -> (DependencyEngine, Vec<TaskId>) {
        let engine = DependencyEngine::in_memory("t");
        let mut ids = Vec::new();
        for title in titles {
            ids.push(engine.create_task(NewTask::new(*title)).await.unwrap().id);
        }
        (engine, ids)
    }

    fn mock_engine() -> (DependencyEngine, crate::storage::FailureSwitches) {
        let tasks = MockTaskStore::new("m");
        let switches = tasks.switches();
        let engine = DependencyEngine::new(Stores {
            tasks: Box::new(tasks),
            edges: new_in_memory_edge_store(),
        });
        (engine, switches)
    }

    #[tokio::test]
    async fn test_create_and_query_dependency() {
        let (engine, ids) = engine_with(&["a", "b"]).await;

        let edge = engine
            .create_dependency(&ids[0], &ids[1], "alice")
            .await
            .unwrap();
        assert_eq!(edge.created_by, "alice");
        assert_eq!(engine.dependencies_of(&ids[0]).await.unwrap(), vec![edge.clone()]);
        assert_eq!(engine.dependents_of(&ids[1]).await.unwrap(), vec![edge]);
    }

    #[tokio::test]
    async fn test_rejected_dependency_is_not_stored() {
        let (engine, ids) = engine_with(&["a", "b"]).await;
        engine.create_dependency(&ids[0], &ids[1], "u").await.unwrap();

        let err = engine
            .create_dependency(&ids[1], &ids[0], "u")
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_dependency(),
            Some(DependencyError::CircularDependency { .. })
        ));
        assert_eq!(engine.list_dependencies().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_edge() {
        let (engine, _) = engine_with(&[]).await;
        let err = engine
            .delete_dependency(&EdgeId::new("dep-none"))
            .await
            .unwrap_err();
        assert_eq!(
            err.as_dependency(),
            Some(&DependencyError::EdgeNotFound(EdgeId::new("dep-none")))
        );
    }

    #[tokio::test]
    async fn test_unknown_task_queries_fail() {
        let (engine, _) = engine_with(&["a"]).await;
        let ghost = TaskId::new("t-ghost");

        for result in [
            engine.dependency_info(&ghost).await.map(|_| ()),
            engine.upstream_chain(&ghost).await.map(|_| ()),
            engine.downstream_chain(&ghost).await.map(|_| ()),
            engine.eligible_blockers(&ghost).await.map(|_| ()),
        ] {
            assert!(matches!(
                result.unwrap_err().as_dependency(),
                Some(DependencyError::TaskNotFound(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_delete_task_cascades() {
        let (engine, ids) = engine_with(&["a", "b", "c"]).await;
        engine.create_dependency(&ids[0], &ids[1], "u").await.unwrap();
        engine.create_dependency(&ids[1], &ids[2], "u").await.unwrap();

        let summary = engine.delete_task(&ids[1]).await.unwrap();
        assert_eq!(summary.deleted_count, 2);
        assert!(engine.get_task(&ids[1]).await.unwrap().is_none());
        assert!(engine.list_dependencies().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_task_restores_edges_when_task_store_fails() {
        let (engine, switches) = mock_engine();
        let a = engine.create_task(NewTask::new("a")).await.unwrap().id;
        let b = engine.create_task(NewTask::new("b")).await.unwrap().id;
        let edge = engine.create_dependency(&a, &b, "u").await.unwrap();

        switches.fail_delete(true);
        let err = engine.delete_task(&b).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));

        assert!(engine.get_task(&b).await.unwrap().is_some());
        assert_eq!(engine.list_dependencies().await.unwrap(), vec![edge]);
    }

    #[tokio::test]
    async fn test_delete_task_restores_task_when_edge_save_fails() {
        let edges = MockEdgeStore::new();
        let switches = edges.switches();
        let engine = DependencyEngine::new(Stores {
            tasks: new_in_memory_task_store("m".to_string()),
            edges: Box::new(edges),
        });
        let a = engine.create_task(NewTask::new("a")).await.unwrap().id;
        let b = engine.create_task(NewTask::new("b")).await.unwrap().id;
        let edge = engine.create_dependency(&a, &b, "u").await.unwrap();

        switches.fail_save(true);
        let err = engine.delete_task(&b).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));

        assert!(engine.get_task(&b).await.unwrap().is_some());
        assert_eq!(engine.list_dependencies().await.unwrap(), vec![edge]);
        assert!(engine.dependency_info(&a).await.unwrap().is_blocked);

        let task_ids: Vec<TaskId> = engine
            .list_tasks()
            .await
            .unwrap()
            .into_iter()
            .map(|task| task.id)
            .collect();
        for edge in engine.list_dependencies().await.unwrap() {
            assert!(task_ids.contains(&edge.dependent_task_id));
            assert!(task_ids.contains(&edge.blocking_task_id));
        }
    }

    #[tokio::test]
    async fn test_failed_save_reloads_task_store() {
        let (engine, switches) = mock_engine();
        let kept = engine.create_task(NewTask::new("kept")).await.unwrap();

        switches.fail_save(true);
        assert!(engine.create_task(NewTask::new("lost")).await.is_err());

        switches.fail_save(false);
        let ids: Vec<TaskId> = engine
            .list_tasks()
            .await
            .unwrap()
            .into_iter()
            .map(|task| task.id)
            .collect();
        assert_eq!(ids, vec![kept.id]);
    }

    #[tokio::test]
    async fn test_start_tasks_skip_blocked() {
        let (engine, ids) = engine_with(&["a", "b", "c"]).await;
        engine.create_dependency(&ids[0], &ids[1], "u").await.unwrap();

        let outcome = engine
            .start_tasks(&[ids[0].clone(), ids[2].clone()], BulkStartPolicy::SkipBlocked)
            .await
            .unwrap();
        assert_eq!(outcome.started, vec![ids[2].clone()]);
        assert_eq!(outcome.skipped.len(), 1);

        let a = engine.get_task(&ids[0]).await.unwrap().unwrap();
        let c = engine.get_task(&ids[2]).await.unwrap().unwrap();
        assert_eq!(a.status, TaskStatus::Pending);
        assert_eq!(c.status, TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn test_start_tasks_unknown_id_changes_nothing() {
        let (engine, ids) = engine_with(&["a"]).await;
        let err = engine
            .start_tasks(&[ids[0].clone(), TaskId::new("t-nope")], BulkStartPolicy::ForceAll)
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_dependency(),
            Some(DependencyError::TaskNotFound(_))
        ));
        let a = engine.get_task(&ids[0]).await.unwrap().unwrap();
        assert_eq!(a.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_cannot_close_a_cycle() {
        let (engine, ids) = engine_with(&["a", "b"]).await;
        let engine = std::sync::Arc::new(engine);

        let forward = {
            let engine = engine.clone();
            let (a, b) = (ids[0].clone(), ids[1].clone());
            tokio::spawn(async move { engine.create_dependency(&a, &b, "x").await })
        };
        let backward = {
            let engine = engine.clone();
            let (a, b) = (ids[0].clone(), ids[1].clone());
            tokio::spawn(async move { engine.create_dependency(&b, &a, "y").await })
        };

        let results = [forward.await.unwrap(), backward.await.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(engine.list_dependencies().await.unwrap().len(), 1);
    }
}
