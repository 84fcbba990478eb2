//! Background Tasks Module
//!
//! Periodic maintenance that runs alongside the services.
//!
//! # Tasks
//! - Expiry sweep: reclaims stale entries that were never read again

mod sweep;

pub use sweep::spawn_sweep_task;
