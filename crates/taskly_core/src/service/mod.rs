//! Core use-case services.
//!
//! # Responsibility
//! - Expose the task store to front-end layers through a stable API.
//! - Keep callers decoupled from storage details.

pub mod task_service;
