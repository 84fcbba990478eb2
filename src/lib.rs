//! Couple Cache - cache-aside orchestration for the couple-tracking services
//!
//! An expiring key/value store, an orchestrator that standardizes keys, TTLs
//! and pattern invalidation over it, and one caching use-case service per
//! entity family.

pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod tasks;

pub use config::Config;
pub use error::{CacheError, ServiceError};
pub use orchestrator::{CacheKey, CacheOrchestrator, DataCategory, KeyPattern};
pub use tasks::spawn_sweep_task;
