//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of an open cache.
//!
//! # Tasks
//! - Timer driver: evicts keys when their per-key timers come due
//! - Sweep: removes any expired entries at a fixed interval
//! - Persist: writes a snapshot at a fixed interval

mod persist;
mod sweep;
mod timers;

pub use persist::spawn_persist_task;
pub use sweep::spawn_sweep_task;
pub use timers::spawn_timer_task;
