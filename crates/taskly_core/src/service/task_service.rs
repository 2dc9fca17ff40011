//! Task access layer.
//!
//! # Responsibility
//! - Forward create/read/update/delete calls to the task store.
//! - Hand out live-query subscriptions.
//!
//! # Invariants
//! - Adds no policy, validation, or transformation; the store's semantics
//!   pass through unchanged.

use crate::model::task::{Task, TaskId};
use crate::repo::task_repo::RepoResult;
use crate::store::task_store::{TaskStore, TaskWatcher};
use std::sync::Arc;

/// Thin pass-through between front-end layers and the task store.
#[derive(Clone)]
pub struct TaskService {
    store: Arc<TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<TaskStore>) -> Self {
        Self { store }
    }

    /// Live feed of all records; see [`TaskStore::watch`].
    pub fn watch_all(&self) -> RepoResult<TaskWatcher> {
        self.store.watch()
    }

    /// One-shot snapshot of all records.
    pub fn snapshot(&self) -> RepoResult<Vec<Task>> {
        self.store.snapshot()
    }

    pub fn insert(&self, task: &Task) -> RepoResult<TaskId> {
        self.store.upsert(task)
    }

    pub fn update(&self, task: &Task) -> RepoResult<()> {
        self.store.update(task)
    }

    pub fn delete(&self, task: &Task) -> RepoResult<()> {
        self.store.delete(task)
    }

    pub fn delete_by_id(&self, id: TaskId) -> RepoResult<()> {
        self.store.delete_by_id(id)
    }
}
