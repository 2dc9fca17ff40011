//! Task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the `tasks` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `upsert_task` assigns a fresh id when given `UNASSIGNED_ID`, otherwise
//!   replaces the record sharing the id.
//! - `update_task` and the delete operations treat a missing id as a no-op
//!   and report rows affected, never an error.
//! - Snapshot reads return rows in storage order (`ORDER BY id`).

use crate::db::DbError;
use crate::model::task::{Task, TaskId, UNASSIGNED_ID};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const TASK_SELECT_SQL: &str = "SELECT id, name, urgency, completed FROM tasks";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task persistence and query operations.
///
/// `Db` is the storage-fault case; the remaining variants guard against
/// connections that skipped bootstrap and against corrupt persisted rows.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} has not been migrated to {expected_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` does not exist")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for task CRUD operations.
///
/// Mutators return the number of rows affected so the layer above can tell
/// a committed change from a no-op without re-reading.
pub trait TaskRepository {
    fn upsert_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn update_task(&self, task: &Task) -> RepoResult<usize>;
    fn delete_task(&self, task: &Task) -> RepoResult<usize>;
    fn delete_task_by_id(&self, id: TaskId) -> RepoResult<usize>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn list_tasks(&self) -> RepoResult<Vec<Task>>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Wraps a bootstrapped connection.
    ///
    /// Rejects connections whose schema has not been migrated or that lack
    /// the `tasks` table, so later CRUD calls cannot fail half-way through
    /// with schema errors.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = crate::db::migrations::latest_version();
        let actual_version = crate::db::migrations::current_user_version(conn)?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let tasks_table_exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'tasks'
            );",
            [],
            |row| row.get(0),
        )?;
        if tasks_table_exists == 0 {
            return Err(RepoError::MissingRequiredTable("tasks"));
        }

        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn upsert_task(&self, task: &Task) -> RepoResult<TaskId> {
        if task.id == UNASSIGNED_ID {
            self.conn.execute(
                "INSERT INTO tasks (name, urgency, completed) VALUES (?1, ?2, ?3);",
                params![
                    task.name.as_str(),
                    task.urgency.as_str(),
                    bool_to_int(task.completed)
                ],
            )?;
            return Ok(self.conn.last_insert_rowid());
        }

        self.conn.execute(
            "INSERT INTO tasks (id, name, urgency, completed)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                urgency = excluded.urgency,
                completed = excluded.completed;",
            params![
                task.id,
                task.name.as_str(),
                task.urgency.as_str(),
                bool_to_int(task.completed)
            ],
        )?;
        Ok(task.id)
    }

    fn update_task(&self, task: &Task) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE tasks SET name = ?1, urgency = ?2, completed = ?3 WHERE id = ?4;",
            params![
                task.name.as_str(),
                task.urgency.as_str(),
                bool_to_int(task.completed),
                task.id
            ],
        )?;
        Ok(changed)
    }

    fn delete_task(&self, task: &Task) -> RepoResult<usize> {
        self.delete_task_by_id(task.id)
    }

    fn delete_task_by_id(&self, id: TaskId) -> RepoResult<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", params![id])?;
        Ok(changed)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn list_tasks(&self) -> RepoResult<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} ORDER BY id ASC;"))?;

        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid completed value `{other}` in tasks.completed"
            )));
        }
    };

    Ok(Task {
        id: row.get("id")?,
        name: row.get("name")?,
        urgency: row.get("urgency")?,
        completed,
        is_editing: false,
    })
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}
