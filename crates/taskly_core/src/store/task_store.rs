//! Task record store: connection ownership plus the live "all tasks" feed.
//!
//! # Responsibility
//! - Serialize all task mutations through one connection.
//! - Maintain the watcher registry backing the live query.
//!
//! # Invariants
//! - Every watcher receives the current snapshot on registration, then one
//!   snapshot per committed change, in store-write order.
//! - Watchers never block the store: channels are unbounded and
//!   disconnected watchers are pruned on the next broadcast.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::model::task::{Task, TaskId};
use crate::repo::task_repo::{RepoResult, SqliteTaskRepository, TaskRepository};
use crossbeam::channel::{unbounded, Receiver, Sender};
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// Durable keyed storage for task records with a live snapshot feed.
///
/// Sharable across threads behind an `Arc`; the connection mutex is the only
/// write serialization point, matching the storage engine's own ordering.
pub struct TaskStore {
    conn: Mutex<Connection>,
    watchers: Mutex<Vec<Sender<Vec<Task>>>>,
}

/// Receiving half of one live-query subscription.
///
/// Dropping the watcher cancels the subscription; the store prunes the
/// disconnected sender on its next broadcast.
pub struct TaskWatcher {
    rx: Receiver<Vec<Task>>,
}

impl TaskWatcher {
    /// Blocks until the next snapshot. `None` once the store is gone.
    pub fn recv(&self) -> Option<Vec<Task>> {
        self.rx.recv().ok()
    }

    /// Waits up to `timeout` for the next snapshot.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Vec<Task>> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Returns an already-delivered snapshot without waiting.
    pub fn try_recv(&self) -> Option<Vec<Task>> {
        self.rx.try_recv().ok()
    }

    pub(crate) fn receiver(&self) -> &Receiver<Vec<Task>> {
        &self.rx
    }
}

impl TaskStore {
    /// Opens a file-backed store, bootstrapping schema as needed.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Self::from_connection(open_db(path)?)
    }

    /// Opens a throwaway in-memory store.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::from_connection(open_db_in_memory()?)
    }

    fn from_connection(conn: Connection) -> DbResult<Self> {
        info!("event=store_open module=store status=ok");
        Ok(Self {
            conn: Mutex::new(conn),
            watchers: Mutex::new(Vec::new()),
        })
    }

    /// Inserts a new record (assigning an id when given `UNASSIGNED_ID`) or
    /// replaces the record sharing the same id, then rebroadcasts.
    pub fn upsert(&self, task: &Task) -> RepoResult<TaskId> {
        let conn = self.conn.lock();
        let repo = SqliteTaskRepository::try_new(&conn)?;
        let id = repo.upsert_task(task)?;
        debug!("event=task_upsert module=store status=ok id={id}");
        self.broadcast(&repo)?;
        Ok(id)
    }

    /// Full-record replacement by id; a missing id is a silent no-op.
    pub fn update(&self, task: &Task) -> RepoResult<()> {
        let conn = self.conn.lock();
        let repo = SqliteTaskRepository::try_new(&conn)?;
        let changed = repo.update_task(task)?;
        debug!(
            "event=task_update module=store status=ok id={} changed={changed}",
            task.id
        );
        if changed > 0 {
            self.broadcast(&repo)?;
        }
        Ok(())
    }

    /// Removes the record with `task.id`; a missing id is a silent no-op.
    pub fn delete(&self, task: &Task) -> RepoResult<()> {
        self.delete_by_id(task.id)
    }

    /// Removes the record with the given id; a missing id is a silent no-op.
    pub fn delete_by_id(&self, id: TaskId) -> RepoResult<()> {
        let conn = self.conn.lock();
        let repo = SqliteTaskRepository::try_new(&conn)?;
        let changed = repo.delete_task_by_id(id)?;
        debug!("event=task_delete module=store status=ok id={id} changed={changed}");
        if changed > 0 {
            self.broadcast(&repo)?;
        }
        Ok(())
    }

    /// Single-record read.
    pub fn get(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let conn = self.conn.lock();
        SqliteTaskRepository::try_new(&conn)?.get_task(id)
    }

    /// One-shot full snapshot in storage order.
    pub fn snapshot(&self) -> RepoResult<Vec<Task>> {
        let conn = self.conn.lock();
        SqliteTaskRepository::try_new(&conn)?.list_tasks()
    }

    /// Starts a live query over all records.
    ///
    /// The watcher receives the current snapshot immediately and a fresh
    /// snapshot after every committed mutation. Each call starts an
    /// independent subscription, so the feed is restartable per observer.
    pub fn watch(&self) -> RepoResult<TaskWatcher> {
        // Registration runs under the connection lock so the initial
        // snapshot and subsequent broadcasts cannot reorder or duplicate.
        let conn = self.conn.lock();
        let snapshot = SqliteTaskRepository::try_new(&conn)?.list_tasks()?;

        let (tx, rx) = unbounded();
        let mut watchers = self.watchers.lock();
        let _ = tx.send(snapshot);
        watchers.push(tx);
        debug!(
            "event=watch_start module=store status=ok watchers={}",
            watchers.len()
        );
        Ok(TaskWatcher { rx })
    }

    /// Re-queries and fans the snapshot out to live watchers.
    ///
    /// Caller must hold the connection lock; `repo` borrows that connection,
    /// which enforces the requirement at compile time.
    fn broadcast(&self, repo: &SqliteTaskRepository<'_>) -> RepoResult<()> {
        let snapshot = repo.list_tasks()?;
        let mut watchers = self.watchers.lock();
        watchers.retain(|watcher| watcher.send(snapshot.clone()).is_ok());
        debug!(
            "event=snapshot_broadcast module=store watchers={} size={}",
            watchers.len(),
            snapshot.len()
        );
        Ok(())
    }
}
