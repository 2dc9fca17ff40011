//! Task coordinator: mediates between a front end and the access layer.
//!
//! # Responsibility
//! - Hold the latest known snapshot for display, defaulting to empty.
//! - Accept mutation requests without blocking the caller.
//! - Manage the live-subscription lifecycle around observer attachment.
//!
//! # Invariants
//! - Mutation entry points return immediately; completion is observed only
//!   through the next snapshot emission.
//! - A storage fault inside the worker is logged and dropped; the worker
//!   keeps serving subsequent commands.
//! - The upstream feed is torn down (and the held snapshot released) only
//!   after the release grace window passes with no observer attached.

use crate::model::task::Task;
use crate::service::task_service::TaskService;
use crate::store::task_store::TaskWatcher;
use crossbeam::channel::{after, never, unbounded, Receiver, Sender};
use crossbeam::select;
use log::{debug, error};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How long the last snapshot is retained after the last observer detaches
/// before the upstream subscription is torn down.
pub const RELEASE_GRACE: Duration = Duration::from_millis(5000);

enum Mutation {
    Add(Task),
    Update(Task),
    Delete(Task),
}

enum Command {
    Mutate(Mutation),
    Attach { id: u64, sink: Sender<Vec<Task>> },
    Detach { id: u64 },
    Shutdown,
}

struct Shared {
    tasks: RwLock<Vec<Task>>,
}

/// Front-end mediator holding the current task list.
///
/// Owns a background worker that serializes mutations and applies snapshot
/// emissions from the store's live query to the shared list cell.
pub struct TaskCoordinator {
    shared: Arc<Shared>,
    commands: Sender<Command>,
    next_observer_id: AtomicU64,
    worker: Option<JoinHandle<()>>,
}

/// One front-end attachment to the coordinator's snapshot feed.
///
/// Receives the current list on attachment and every republication after.
/// Dropping the observer detaches it; when the last observer detaches the
/// coordinator starts its release grace window.
pub struct TasksObserver {
    rx: Receiver<Vec<Task>>,
    id: u64,
    commands: Sender<Command>,
}

impl TasksObserver {
    /// Blocks until the next published list. `None` once the coordinator is
    /// gone.
    pub fn recv(&self) -> Option<Vec<Task>> {
        self.rx.recv().ok()
    }

    /// Waits up to `timeout` for the next published list.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Vec<Task>> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Returns an already-published list without waiting.
    pub fn try_recv(&self) -> Option<Vec<Task>> {
        self.rx.try_recv().ok()
    }
}

impl Drop for TasksObserver {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Detach { id: self.id });
    }
}

impl TaskCoordinator {
    /// Creates a coordinator with the default release grace window.
    pub fn new(service: TaskService) -> Self {
        Self::with_release_grace(service, RELEASE_GRACE)
    }

    /// Creates a coordinator with an explicit release grace window.
    ///
    /// Tests use short windows to exercise the release path without
    /// real-time waits.
    pub fn with_release_grace(service: TaskService, grace: Duration) -> Self {
        let shared = Arc::new(Shared {
            tasks: RwLock::new(Vec::new()),
        });
        let (commands, command_rx) = unbounded();

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("taskly-coordinator".to_string())
            .spawn(move || run_worker(service, worker_shared, command_rx, grace))
            .ok();
        if worker.is_none() {
            error!("event=coordinator_start module=coordinator status=error error=spawn_failed");
        }

        Self {
            shared,
            commands,
            next_observer_id: AtomicU64::new(1),
            worker,
        }
    }

    /// Latest known list; empty before the first emission arrives.
    pub fn tasks(&self) -> Vec<Task> {
        self.shared.tasks.read().clone()
    }

    /// Attaches an observer to the snapshot feed.
    ///
    /// The first attachment establishes the upstream live query; an
    /// attachment within the grace window cancels a pending release.
    pub fn observe(&self) -> TasksObserver {
        let id = self.next_observer_id.fetch_add(1, Ordering::Relaxed);
        let (sink, rx) = unbounded();
        let _ = self.commands.send(Command::Attach { id, sink });
        TasksObserver {
            rx,
            id,
            commands: self.commands.clone(),
        }
    }

    /// Schedules an insert; completion shows up in the next emission.
    pub fn add_task(&self, task: Task) {
        let _ = self.commands.send(Command::Mutate(Mutation::Add(task)));
    }

    /// Schedules a deletion by the record's id.
    pub fn delete_task(&self, task: Task) {
        let _ = self.commands.send(Command::Mutate(Mutation::Delete(task)));
    }

    /// Schedules a full-record replacement.
    pub fn update_task(&self, task: Task) {
        let _ = self.commands.send(Command::Mutate(Mutation::Update(task)));
    }
}

impl Drop for TaskCoordinator {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

enum Event {
    Command(Option<Command>),
    Feed(Option<Vec<Task>>),
    ReleaseTick,
}

fn run_worker(
    service: TaskService,
    shared: Arc<Shared>,
    commands: Receiver<Command>,
    grace: Duration,
) {
    let mut observers: Vec<(u64, Sender<Vec<Task>>)> = Vec::new();
    let mut feed: Option<TaskWatcher> = None;
    let mut release_timer: Option<Receiver<Instant>> = None;
    let never_feed = never::<Vec<Task>>();
    let never_timer = never::<Instant>();

    debug!("event=coordinator_start module=coordinator status=ok");

    loop {
        // Select borrows end before state mutation below.
        let event = {
            let feed_rx = feed.as_ref().map_or(&never_feed, TaskWatcher::receiver);
            let timer_rx = release_timer.as_ref().unwrap_or(&never_timer);
            select! {
                recv(commands) -> msg => Event::Command(msg.ok()),
                recv(feed_rx) -> msg => Event::Feed(msg.ok()),
                recv(timer_rx) -> _ => Event::ReleaseTick,
            }
        };

        match event {
            Event::Command(Some(Command::Mutate(mutation))) => apply_mutation(&service, mutation),
            Event::Command(Some(Command::Attach { id, sink })) => {
                release_timer = None;
                if feed.is_none() {
                    match service.watch_all() {
                        Ok(watcher) => feed = Some(watcher),
                        Err(err) => error!(
                            "event=feed_attach module=coordinator status=error error={err}"
                        ),
                    }
                }
                let _ = sink.send(shared.tasks.read().clone());
                observers.push((id, sink));
                debug!(
                    "event=observer_attach module=coordinator status=ok observers={}",
                    observers.len()
                );
            }
            Event::Command(Some(Command::Detach { id })) => {
                observers.retain(|(observer_id, _)| *observer_id != id);
                debug!(
                    "event=observer_detach module=coordinator status=ok observers={}",
                    observers.len()
                );
                if observers.is_empty() {
                    release_timer = Some(after(grace));
                }
            }
            Event::Command(Some(Command::Shutdown)) | Event::Command(None) => break,
            Event::Feed(Some(snapshot)) => {
                *shared.tasks.write() = snapshot.clone();
                observers.retain(|(_, sink)| sink.send(snapshot.clone()).is_ok());
            }
            Event::Feed(None) => {
                // Store side went away; keep serving the held snapshot.
                feed = None;
            }
            Event::ReleaseTick => {
                release_timer = None;
                if observers.is_empty() {
                    feed = None;
                    shared.tasks.write().clear();
                    debug!("event=feed_release module=coordinator status=ok");
                }
            }
        }
    }

    debug!("event=coordinator_stop module=coordinator status=ok");
}

fn apply_mutation(service: &TaskService, mutation: Mutation) {
    let (op, result) = match &mutation {
        Mutation::Add(task) => ("add", service.insert(task).map(|_| ())),
        Mutation::Update(task) => ("update", service.update(task)),
        Mutation::Delete(task) => ("delete", service.delete(task)),
    };

    match result {
        Ok(()) => debug!("event=task_mutation module=coordinator status=ok op={op}"),
        // No retry and no user-visible surface; the next successful
        // emission is the only completion signal front ends get.
        Err(err) => {
            error!("event=task_mutation module=coordinator status=error op={op} error={err}");
        }
    }
}
