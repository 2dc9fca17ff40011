//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the data access contract for task records.
//! - Isolate SQLite query details from the store and service layers.
//!
//! # Invariants
//! - Repository writes persist records as given; no content validation.
//! - Read paths reject corrupt persisted state instead of masking it.

pub mod task_repo;
