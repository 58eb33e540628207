//! Store trait implementations for the in-memory backend.

use super::{InMemoryEdgeStore, InMemoryTaskStore};
use crate::domain::{DependencyEdge, EdgeId, NewDependency, NewTask, Task, TaskId, TaskStatus};
use crate::error::{DependencyError, Result, StorageError};
use crate::storage::{EdgeStore, TaskStore};
use async_trait::async_trait;
use chrono::Utc;

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&mut self, new_task: NewTask) -> Result<Task> {
        new_task.validate().map_err(StorageError::Validation)?;

        let mut inner = self.lock().await;
        let id = inner.generate_id(&new_task)?;
        let now = Utc::now();
        let task = Task {
            id: id.clone(),
            title: new_task.title,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        inner.insert_existing(task.clone());
        Ok(task)
    }

    async fn get(&self, id: &TaskId) -> Result<Option<Task>> {
        let inner = self.lock().await;
        Ok(inner.tasks.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Task>> {
        let inner = self.lock().await;
        Ok(inner.sorted())
    }

    async fn set_status(&mut self, id: &TaskId, status: TaskStatus) -> Result<Task> {
        let mut inner = self.lock().await;
        let task = inner
            .tasks
            .get_mut(id)
            .ok_or_else(|| DependencyError::TaskNotFound(id.clone()))?;

        task.status = status;
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn delete(&mut self, id: &TaskId) -> Result<Task> {
        let mut inner = self.lock().await;
        inner
            .remove(id)
            .ok_or_else(|| DependencyError::TaskNotFound(id.clone()).into())
    }

    async fn import_tasks(&mut self, tasks: Vec<Task>) -> Result<()> {
        let mut inner = self.lock().await;
        for task in tasks {
            inner.insert_existing(task);
        }
        Ok(())
    }

    async fn export_all(&self) -> Result<Vec<Task>> {
        let inner = self.lock().await;
        Ok(inner.sorted())
    }

    async fn save(&self) -> Result<()> {
        // Nothing to persist
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl EdgeStore for InMemoryEdgeStore {
    async fn insert(&mut self, dependency: NewDependency) -> Result<DependencyEdge> {
        let mut inner = self.lock().await;

        if inner.contains_pair(&dependency.dependent_task_id, &dependency.blocking_task_id) {
            return Err(DependencyError::DuplicateEdge {
                dependent: dependency.dependent_task_id,
                blocking: dependency.blocking_task_id,
            }
            .into());
        }

        let id = inner.generate_id(&[
            dependency.dependent_task_id.as_str(),
            dependency.blocking_task_id.as_str(),
            dependency.created_by.as_str(),
        ])?;
        let edge = DependencyEdge {
            id,
            dependent_task_id: dependency.dependent_task_id,
            blocking_task_id: dependency.blocking_task_id,
            created_by: dependency.created_by,
            created_at: inner.next_timestamp(),
        };

        inner.insert_edge(edge.clone())?;
        Ok(edge)
    }

    async fn remove(&mut self, id: &EdgeId) -> Result<Option<DependencyEdge>> {
        let mut inner = self.lock().await;
        Ok(inner.remove_edge(id))
    }

    async fn remove_for_task(&mut self, task_id: &TaskId) -> Result<Vec<DependencyEdge>> {
        let mut inner = self.lock().await;

        let mut keys: Vec<_> = inner
            .by_dependent
            .get(task_id)
            .into_iter()
            .chain(inner.by_blocking.get(task_id))
            .flatten()
            .cloned()
            .collect();
        keys.sort();
        keys.dedup();

        Ok(keys
            .iter()
            .filter_map(|(_, id)| inner.remove_edge(id))
            .collect())
    }

    async fn dependencies_of(&self, task_id: &TaskId) -> Result<Vec<DependencyEdge>> {
        let inner = self.lock().await;
        Ok(inner
            .by_dependent
            .get(task_id)
            .map(|keys| inner.resolve(keys))
            .unwrap_or_default())
    }

    async fn dependents_of(&self, task_id: &TaskId) -> Result<Vec<DependencyEdge>> {
        let inner = self.lock().await;
        Ok(inner
            .by_blocking
            .get(task_id)
            .map(|keys| inner.resolve(keys))
            .unwrap_or_default())
    }

    async fn list(&self) -> Result<Vec<DependencyEdge>> {
        let inner = self.lock().await;
        Ok(inner.resolve(&inner.order))
    }

    async fn import_edges(&mut self, edges: Vec<DependencyEdge>) -> Result<()> {
        let mut inner = self.lock().await;
        for edge in edges {
            inner.insert_edge(edge)?;
        }
        Ok(())
    }

    async fn save(&self) -> Result<()> {
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        Ok(())
    }
}
