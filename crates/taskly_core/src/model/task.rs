//! Task domain record.
//!
//! # Responsibility
//! - Define the single entity stored by the task store.
//! - Provide the copy-and-flip helper used by the completion checkbox path.
//!
//! # Invariants
//! - `id == UNASSIGNED_ID` means "the store assigns an id on upsert".
//! - `is_editing` is a transient UI flag and never reaches storage or the
//!   wire; records loaded from storage always carry `is_editing == false`.

use serde::{Deserialize, Serialize};

/// Store-assigned row identifier.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type TaskId = i64;

/// Sentinel id for records that have not been persisted yet.
pub const UNASSIGNED_ID: TaskId = 0;

/// A single to-do entry.
///
/// `name` and `urgency` are free text at this level. The front end restricts
/// urgency to a fixed option set, but the store persists whatever it is
/// given, so the model does not constrain either field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique among stored records; `0` until assigned by the store.
    pub id: TaskId,
    /// User-entered label.
    pub name: String,
    /// Urgency label; the front end offers `Low`, `Moderate`, `High`.
    pub urgency: String,
    /// Completion checkbox state.
    pub completed: bool,
    /// Transient editor-open flag. Not persisted.
    #[serde(skip)]
    pub is_editing: bool,
}

impl Task {
    /// Creates an unpersisted task with defaults for the flag fields.
    pub fn new(name: impl Into<String>, urgency: impl Into<String>) -> Self {
        Self::with_id(UNASSIGNED_ID, name, urgency)
    }

    /// Creates a task carrying a known identifier.
    ///
    /// Used when rebuilding a record from a stored row or when issuing a
    /// full-record replacement for an existing id.
    pub fn with_id(id: TaskId, name: impl Into<String>, urgency: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            urgency: urgency.into(),
            completed: false,
            is_editing: false,
        }
    }

    /// Returns a copy with `completed` flipped.
    ///
    /// This is a full-record replacement source: concurrent toggles on the
    /// same id resolve last-write-wins on the whole record.
    pub fn toggled(&self) -> Self {
        Self {
            completed: !self.completed,
            ..self.clone()
        }
    }

    /// Whether the store has assigned this record an identifier.
    pub fn is_persisted(&self) -> bool {
        self.id != UNASSIGNED_ID
    }
}
