//! Core persistence and state-synchronization path for the Taskly task list.
//! This crate is the single source of truth for task data.

pub mod coordinator;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use coordinator::{TaskCoordinator, TasksObserver, RELEASE_GRACE};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{Task, TaskId, UNASSIGNED_ID};
pub use repo::task_repo::{RepoError, RepoResult, SqliteTaskRepository, TaskRepository};
pub use service::task_service::TaskService;
pub use store::task_store::{TaskStore, TaskWatcher};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
