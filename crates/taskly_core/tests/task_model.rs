use taskly_core::{Task, UNASSIGNED_ID};

#[test]
fn new_task_sets_defaults() {
    let task = Task::new("Buy milk", "Low");

    assert_eq!(task.id, UNASSIGNED_ID);
    assert_eq!(task.name, "Buy milk");
    assert_eq!(task.urgency, "Low");
    assert!(!task.completed);
    assert!(!task.is_editing);
    assert!(!task.is_persisted());
}

#[test]
fn with_id_marks_task_persisted() {
    let task = Task::with_id(7, "Water plants", "Moderate");

    assert_eq!(task.id, 7);
    assert!(task.is_persisted());
}

#[test]
fn toggled_flips_only_completed() {
    let task = Task::with_id(3, "Call dentist", "High");

    let toggled = task.toggled();
    assert!(toggled.completed);
    assert_eq!(toggled.id, task.id);
    assert_eq!(toggled.name, task.name);
    assert_eq!(toggled.urgency, task.urgency);

    // Toggling twice round-trips to the original record.
    assert_eq!(toggled.toggled(), task);
}

#[test]
fn serialization_omits_transient_editor_flag() {
    let mut task = Task::with_id(2, "Pack bags", "Low");
    task.is_editing = true;

    let json = serde_json::to_value(&task).unwrap();
    assert_eq!(json["id"], 2);
    assert_eq!(json["name"], "Pack bags");
    assert_eq!(json["urgency"], "Low");
    assert_eq!(json["completed"], false);
    assert!(json.get("is_editing").is_none());

    let decoded: Task = serde_json::from_value(json).unwrap();
    assert!(!decoded.is_editing);
}
