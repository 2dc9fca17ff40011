//! Argument surface and command execution.
//!
//! All mutations go through the coordinator and are confirmed by watching
//! the snapshot feed, never through return values. Input validation
//! (non-blank name, urgency from the fixed option set) happens here, before
//! a mutation is ever issued; the core layers persist anything.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use taskly_core::{
    default_log_level, init_logging, Task, TaskCoordinator, TaskId, TaskService, TaskStore,
    TasksObserver,
};

/// How long a command waits for the snapshot that confirms its mutation.
const CONFIRM_TIMEOUT: Duration = Duration::from_secs(5);

/// How long the initial attach sequence is drained before a command reads
/// the list: the observer receives the held cell value first and the store
/// snapshot right after.
const SETTLE_TIMEOUT: Duration = Duration::from_millis(300);

#[derive(Parser)]
#[command(name = "taskly", version, about = "A small persisted to-do list")]
pub struct Cli {
    /// Path to the task database file.
    #[arg(long, global = true, default_value = "taskly.db")]
    db: PathBuf,

    /// Directory for rolling log files; logging stays off when unset.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: CommandKind,
}

#[derive(Subcommand)]
enum CommandKind {
    /// Add a task.
    Add {
        /// Task name; must not be blank.
        name: String,
        #[arg(long, value_enum, default_value = "low")]
        urgency: Urgency,
    },
    /// Print the current task list.
    List,
    /// Flip a task's completion checkbox.
    Toggle { id: TaskId },
    /// Change a task's name and/or urgency.
    Edit {
        id: TaskId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_enum)]
        urgency: Option<Urgency>,
    },
    /// Delete a task.
    Rm { id: TaskId },
    /// Follow the live task feed, printing each snapshot.
    Watch,
}

/// The option set the front end offers; the store itself accepts any text.
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Urgency {
    Low,
    Moderate,
    High,
}

impl Urgency {
    fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
        }
    }
}

impl Cli {
    pub fn run(self) -> Result<()> {
        if let Some(log_dir) = &self.log_dir {
            let log_dir = absolutize(log_dir)?;
            let level = self.log_level.as_deref().unwrap_or(default_log_level());
            init_logging(level, &log_dir.to_string_lossy())
                .map_err(|message| anyhow::anyhow!(message))?;
        }

        let store = TaskStore::open(&self.db)
            .with_context(|| format!("failed to open task database `{}`", self.db.display()))?;
        let coordinator = TaskCoordinator::new(TaskService::new(Arc::new(store)));

        match self.command {
            CommandKind::Add { name, urgency } => add(&coordinator, name, urgency),
            CommandKind::List => list(&coordinator),
            CommandKind::Toggle { id } => toggle(&coordinator, id),
            CommandKind::Edit { id, name, urgency } => edit(&coordinator, id, name, urgency),
            CommandKind::Rm { id } => rm(&coordinator, id),
            CommandKind::Watch => watch(&coordinator),
        }
    }
}

fn add(coordinator: &TaskCoordinator, name: String, urgency: Urgency) -> Result<()> {
    if name.trim().is_empty() {
        bail!("task name must not be blank");
    }

    let observer = coordinator.observe();
    let baseline = settled_snapshot(&observer);
    let baseline_len = baseline.len();

    coordinator.add_task(Task::new(name.clone(), urgency.label()));

    let snapshot = wait_for(&observer, |tasks| tasks.len() > baseline_len)
        .context("store did not confirm the new task")?;
    let added = snapshot
        .iter()
        .filter(|task| task.name == name)
        .last()
        .context("new task missing from confirming snapshot")?;
    println!("added task {} \"{}\" ({})", added.id, added.name, added.urgency);
    Ok(())
}

fn list(coordinator: &TaskCoordinator) -> Result<()> {
    let observer = coordinator.observe();
    print_snapshot(&settled_snapshot(&observer));
    Ok(())
}

fn toggle(coordinator: &TaskCoordinator, id: TaskId) -> Result<()> {
    let observer = coordinator.observe();
    let current = settled_snapshot(&observer);
    let Some(task) = current.iter().find(|task| task.id == id) else {
        bail!("task {id} not found");
    };

    let replacement = task.toggled();
    let expect_completed = replacement.completed;
    coordinator.update_task(replacement);

    wait_for(&observer, |tasks| {
        tasks
            .iter()
            .any(|task| task.id == id && task.completed == expect_completed)
    })
    .context("store did not confirm the toggle")?;
    println!(
        "task {id} marked {}",
        if expect_completed { "done" } else { "not done" }
    );
    Ok(())
}

fn edit(
    coordinator: &TaskCoordinator,
    id: TaskId,
    name: Option<String>,
    urgency: Option<Urgency>,
) -> Result<()> {
    if name.is_none() && urgency.is_none() {
        bail!("nothing to edit; pass --name and/or --urgency");
    }
    if let Some(name) = &name {
        if name.trim().is_empty() {
            bail!("task name must not be blank");
        }
    }

    let observer = coordinator.observe();
    let current = settled_snapshot(&observer);
    let Some(task) = current.iter().find(|task| task.id == id) else {
        bail!("task {id} not found");
    };

    let mut replacement = task.clone();
    if let Some(name) = name {
        replacement.name = name;
    }
    if let Some(urgency) = urgency {
        replacement.urgency = urgency.label().to_string();
    }

    let expected = replacement.clone();
    coordinator.update_task(replacement);

    wait_for(&observer, |tasks| tasks.iter().any(|task| *task == expected))
        .context("store did not confirm the edit")?;
    println!(
        "task {id} is now \"{}\" ({})",
        expected.name, expected.urgency
    );
    Ok(())
}

fn rm(coordinator: &TaskCoordinator, id: TaskId) -> Result<()> {
    let observer = coordinator.observe();
    let current = settled_snapshot(&observer);
    let Some(task) = current.iter().find(|task| task.id == id) else {
        // Deleting an absent id is a store-level no-op; mirror that here.
        println!("task {id} not present");
        return Ok(());
    };

    coordinator.delete_task(task.clone());

    wait_for(&observer, |tasks| tasks.iter().all(|task| task.id != id))
        .context("store did not confirm the deletion")?;
    println!("removed task {id}");
    Ok(())
}

fn watch(coordinator: &TaskCoordinator) -> Result<()> {
    let observer = coordinator.observe();
    while let Some(snapshot) = observer.recv() {
        print_snapshot(&snapshot);
        println!();
    }
    Ok(())
}

/// Drains the attach sequence and returns the last delivered snapshot.
fn settled_snapshot(observer: &TasksObserver) -> Vec<Task> {
    let mut snapshot = observer.recv().unwrap_or_default();
    while let Some(update) = observer.recv_timeout(SETTLE_TIMEOUT) {
        snapshot = update;
    }
    snapshot
}

fn wait_for(
    observer: &TasksObserver,
    accept: impl Fn(&[Task]) -> bool,
) -> Option<Vec<Task>> {
    let deadline = Instant::now() + CONFIRM_TIMEOUT;
    loop {
        let remaining = deadline.checked_duration_since(Instant::now())?;
        let snapshot = observer.recv_timeout(remaining)?;
        if accept(&snapshot) {
            return Some(snapshot);
        }
    }
}

fn print_snapshot(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks yet.");
        return;
    }
    println!("Your tasks ({}):", tasks.len());
    for task in tasks {
        println!(
            "  [{}] {}  {}  ({})",
            if task.completed { "x" } else { " " },
            task.id,
            task.name,
            task.urgency
        );
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("cannot resolve current directory")?;
    Ok(cwd.join(path))
}
