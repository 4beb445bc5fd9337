//! Background Tasks Module
//!
//! Periodic maintenance running next to the worker's event loop.

mod cleanup;

pub use cleanup::spawn_cleanup_task;
