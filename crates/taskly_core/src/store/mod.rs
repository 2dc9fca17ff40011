//! Durable task store with a push-based live query.
//!
//! # Responsibility
//! - Own the SQLite connection for the lifetime of the store.
//! - Re-broadcast a full snapshot to every watcher after each committed
//!   mutation.
//!
//! # Invariants
//! - The connection lock is held across write, re-query and broadcast, so
//!   watchers observe snapshots in store-write order.
//! - A mutation that affects zero rows does not rebroadcast.

pub mod task_store;
