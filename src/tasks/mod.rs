//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a cache is alive.
//!
//! # Tasks
//! - TTL Cleanup: sweeps expired cache entries at a fixed interval

mod cleanup;

pub use cleanup::{spawn_cleanup_task, spawn_cleanup_task_every};
