use std::sync::Arc;
use std::time::Duration;
use taskly_core::{Task, TaskService, TaskStore, TaskWatcher, UNASSIGNED_ID};

const EMIT_TIMEOUT: Duration = Duration::from_secs(2);
const QUIET_TIMEOUT: Duration = Duration::from_millis(200);

#[test]
fn watcher_receives_current_snapshot_on_registration() {
    let store = TaskStore::open_in_memory().unwrap();
    store.upsert(&Task::new("pre-existing", "Low")).unwrap();

    let watcher = store.watch().unwrap();
    let initial = watcher.recv_timeout(EMIT_TIMEOUT).unwrap();
    assert_eq!(initial.len(), 1);
    assert_eq!(initial[0].name, "pre-existing");
}

#[test]
fn upsert_emits_snapshot_with_assigned_id() {
    let store = TaskStore::open_in_memory().unwrap();
    let watcher = store.watch().unwrap();
    assert!(watcher.recv_timeout(EMIT_TIMEOUT).unwrap().is_empty());

    let id = store.upsert(&Task::new("Buy milk", "High")).unwrap();
    assert_ne!(id, UNASSIGNED_ID);

    let snapshot = watcher.recv_timeout(EMIT_TIMEOUT).unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, id);
    assert_eq!(snapshot[0].name, "Buy milk");
    assert_eq!(snapshot[0].urgency, "High");
    assert!(!snapshot[0].completed);
}

#[test]
fn delete_emits_snapshot_without_the_id() {
    let store = TaskStore::open_in_memory().unwrap();
    let keep = store.upsert(&Task::new("keep", "Low")).unwrap();
    let gone = store.upsert(&Task::new("gone", "Low")).unwrap();

    let watcher = store.watch().unwrap();
    watcher.recv_timeout(EMIT_TIMEOUT).unwrap();

    store.delete_by_id(gone).unwrap();

    let snapshot = watcher.recv_timeout(EMIT_TIMEOUT).unwrap();
    assert!(snapshot.iter().all(|task| task.id != gone));
    assert!(snapshot.iter().any(|task| task.id == keep));
}

#[test]
fn noop_delete_emits_nothing_and_preserves_state() {
    let store = TaskStore::open_in_memory().unwrap();
    store.upsert(&Task::new("survivor", "Low")).unwrap();
    let before = store.snapshot().unwrap();

    let watcher = store.watch().unwrap();
    watcher.recv_timeout(EMIT_TIMEOUT).unwrap();

    store.delete_by_id(999).unwrap();

    assert!(watcher.recv_timeout(QUIET_TIMEOUT).is_none());
    assert_eq!(store.snapshot().unwrap(), before);
}

#[test]
fn noop_update_emits_nothing() {
    let store = TaskStore::open_in_memory().unwrap();
    let watcher = store.watch().unwrap();
    watcher.recv_timeout(EMIT_TIMEOUT).unwrap();

    store.update(&Task::with_id(42, "ghost", "Low")).unwrap();

    assert!(watcher.recv_timeout(QUIET_TIMEOUT).is_none());
}

#[test]
fn snapshots_arrive_in_write_order() {
    let store = TaskStore::open_in_memory().unwrap();
    let watcher = store.watch().unwrap();
    assert!(watcher.recv_timeout(EMIT_TIMEOUT).unwrap().is_empty());

    for name in ["one", "two", "three"] {
        store.upsert(&Task::new(name, "Low")).unwrap();
    }

    for expected_len in 1..=3 {
        let snapshot = watcher.recv_timeout(EMIT_TIMEOUT).unwrap();
        assert_eq!(snapshot.len(), expected_len);
    }
}

#[test]
fn every_watcher_receives_every_emission() {
    let store = TaskStore::open_in_memory().unwrap();
    let first = store.watch().unwrap();
    let second = store.watch().unwrap();
    first.recv_timeout(EMIT_TIMEOUT).unwrap();
    second.recv_timeout(EMIT_TIMEOUT).unwrap();

    let id = store.upsert(&Task::new("shared", "Moderate")).unwrap();

    for watcher in [&first, &second] {
        let snapshot = watcher.recv_timeout(EMIT_TIMEOUT).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, id);
    }
}

#[test]
fn watch_is_restartable_per_observer() {
    let store = TaskStore::open_in_memory().unwrap();

    let first = store.watch().unwrap();
    first.recv_timeout(EMIT_TIMEOUT).unwrap();
    drop(first);

    let id = store.upsert(&Task::new("after restart", "Low")).unwrap();

    // A dropped watcher is gone; a fresh one starts from the current state.
    let second = store.watch().unwrap();
    let initial = second.recv_timeout(EMIT_TIMEOUT).unwrap();
    assert_eq!(initial.len(), 1);
    assert_eq!(initial[0].id, id);
}

#[test]
fn service_passes_mutations_and_feed_through() {
    let service = TaskService::new(Arc::new(TaskStore::open_in_memory().unwrap()));
    let watcher: TaskWatcher = service.watch_all().unwrap();
    watcher.recv_timeout(EMIT_TIMEOUT).unwrap();

    let id = service.insert(&Task::new("via service", "Low")).unwrap();
    let snapshot = watcher.recv_timeout(EMIT_TIMEOUT).unwrap();
    assert_eq!(snapshot[0].id, id);

    service
        .update(&Task::with_id(id, "via service", "High"))
        .unwrap();
    let snapshot = watcher.recv_timeout(EMIT_TIMEOUT).unwrap();
    assert_eq!(snapshot[0].urgency, "High");

    service.delete(&snapshot[0]).unwrap();
    assert!(watcher.recv_timeout(EMIT_TIMEOUT).unwrap().is_empty());
    assert!(service.snapshot().unwrap().is_empty());
}
