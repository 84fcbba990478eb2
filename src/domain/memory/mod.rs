//! In-memory collaborators
//!
//! One shared set of tables implements every repository trait so that
//! cross-entity figures (message counts per channel, channels per user) come
//! out consistent. Tests can take the whole domain offline or deny single
//! operations to exercise the failure paths of the services.

mod analytics;
mod channel;
mod file;
mod message;
mod notification;
mod user;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::PermissionChecker;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    Channel, FileRecord, Message, Notification, TrackedEvent, UserProfile, UserStatus,
};

/// Operation name that denies everything for a user.
pub const ALL_OPERATIONS: &str = "*";

#[derive(Debug, Default)]
struct Tables {
    channels: BTreeMap<String, Channel>,
    /// Insertion order
    messages: Vec<Message>,
    users: BTreeMap<String, UserProfile>,
    /// Insertion order
    notifications: Vec<Notification>,
    files: HashMap<String, FileRecord>,
    events: Vec<TrackedEvent>,
    denied: HashSet<(String, String)>,
}

/// Shared in-memory source of truth.
#[derive(Debug, Default)]
pub struct InMemoryDomain {
    tables: RwLock<Tables>,
    next_id: AtomicU64,
    reads: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryDomain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user profile, replacing any with the same id.
    pub async fn seed_user(&self, id: &str, display_name: &str, email: &str) -> UserProfile {
        let now = Utc::now();
        let profile = UserProfile {
            id: id.to_string(),
            display_name: display_name.to_string(),
            email: email.to_string(),
            avatar_url: None,
            status: UserStatus::Offline,
            partner_id: None,
            created_at: now,
            updated_at: now,
        };
        self.tables
            .write()
            .await
            .users
            .insert(id.to_string(), profile.clone());
        profile
    }

    /// Makes `has_permission(user_id, operation)` return false.
    /// `ALL_OPERATIONS` denies every operation for the user.
    pub async fn deny(&self, user_id: &str, operation: &str) {
        self.tables
            .write()
            .await
            .denied
            .insert((user_id.to_string(), operation.to_string()));
    }

    /// While set, every collaborator call fails with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of read calls served so far, used to observe cache hits.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{}", prefix, n)
    }

    fn ensure_available(&self) -> ServiceResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("in-memory domain offline".to_string()));
        }
        Ok(())
    }

    /// Availability check plus read accounting.
    fn begin_read(&self) -> ServiceResult<()> {
        self.ensure_available()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl PermissionChecker for InMemoryDomain {
    async fn has_permission(&self, user_id: &str, operation: &str) -> ServiceResult<bool> {
        self.ensure_available()?;
        let tables = self.tables.read().await;
        let denied = tables
            .denied
            .contains(&(user_id.to_string(), operation.to_string()))
            || tables
                .denied
                .contains(&(user_id.to_string(), ALL_OPERATIONS.to_string()));
        debug!("Permission {} for {}: {}", operation, user_id, !denied);
        Ok(!denied)
    }
}

/// Case-insensitive substring match.
fn matches_query(haystack: &str, query: &str) -> bool {
    haystack.to_lowercase().contains(&query.to_lowercase())
}
