//! User use cases
//!
//! Key layout:
//! - `user:current:{user}`
//! - `user:stats:{user}`
//! - `user:search:{query}:{limit}`
//! - `user:list:{page}:{limit}:{filters}`

use std::sync::Arc;

use tracing::warn;

use crate::domain::{PermissionChecker, UserRepository};
use crate::error::ServiceError;
use crate::models::message::MAX_PAGE_SIZE;
use crate::models::{
    ProfileUpdate, ReadResponse, ServiceCacheStats, UpdateProfileRequest, UserFilters, UserPage,
    UserProfile, UserStats, UserStatus, WriteResponse,
};
use crate::orchestrator::{CacheKey, CacheOrchestrator, DataCategory, InvalidationMap};
use crate::services::{check, read_rejected, require_permission, write_response};

pub const NAMESPACE: &str = "user";
const SERVICE: &str = "UserUseCaseService";

pub const DEFAULT_SEARCH_LIMIT: usize = 10;
pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserMutation {
    UpdateProfile,
    UpdateStatus,
    Delete,
}

const USER_WIDE: &[&str] = &[
    "user:current:{user}",
    "user:stats:{user}",
    "user:list",
    "user:search",
];

pub static USER_INVALIDATIONS: InvalidationMap<UserMutation> = InvalidationMap::new(&[
    (UserMutation::UpdateProfile, USER_WIDE),
    (UserMutation::UpdateStatus, USER_WIDE),
    (UserMutation::Delete, USER_WIDE),
]);

pub struct UserUseCaseService {
    cache: CacheOrchestrator,
    users: Arc<dyn UserRepository>,
    permissions: Arc<dyn PermissionChecker>,
}

impl UserUseCaseService {
    pub fn new(
        cache: CacheOrchestrator,
        users: Arc<dyn UserRepository>,
        permissions: Arc<dyn PermissionChecker>,
    ) -> Self {
        Self {
            cache,
            users,
            permissions,
        }
    }

    // == Writes ==

    pub async fn update_user_profile(
        &self,
        request: &UpdateProfileRequest,
    ) -> WriteResponse<UserProfile> {
        let result = async {
            check(request.validate())?;
            require_permission(self.permissions.as_ref(), &request.user_id, "update_profile")
                .await?;
            let profile = self
                .users
                .update_user(&request.user_id, &request.updates)
                .await?;
            self.invalidate(UserMutation::UpdateProfile, &request.user_id)
                .await;
            Ok::<_, ServiceError>(profile)
        }
        .await;
        write_response("update_user_profile", result)
    }

    /// `status` is one of `online`, `away`, `busy`, `offline`.
    pub async fn update_user_status(
        &self,
        user_id: &str,
        status: &str,
    ) -> WriteResponse<UserProfile> {
        let result = async {
            if user_id.trim().is_empty() {
                return Err(ServiceError::Validation("User ID is required".to_string()));
            }
            let status: UserStatus = status.parse().map_err(ServiceError::Validation)?;
            require_permission(self.permissions.as_ref(), user_id, "update_profile").await?;
            let updates = ProfileUpdate {
                status: Some(status),
                ..Default::default()
            };
            let profile = self.users.update_user(user_id, &updates).await?;
            self.invalidate(UserMutation::UpdateStatus, user_id).await;
            Ok::<_, ServiceError>(profile)
        }
        .await;
        write_response("update_user_status", result)
    }

    pub async fn delete_user(&self, user_id: &str) -> WriteResponse<()> {
        let result = async {
            if user_id.trim().is_empty() {
                return Err(ServiceError::Validation("User ID is required".to_string()));
            }
            require_permission(self.permissions.as_ref(), user_id, "delete_user").await?;
            self.users.delete_user(user_id).await?;
            self.invalidate(UserMutation::Delete, user_id).await;
            Ok::<_, ServiceError>(())
        }
        .await;
        write_response("delete_user", result)
    }

    // == Reads ==

    pub async fn get_current_user(&self, user_id: &str) -> ReadResponse<UserProfile> {
        if user_id.trim().is_empty() {
            return read_rejected("get_current_user", missing_user());
        }
        let key = CacheKey::new(NAMESPACE).with("current").with(user_id);
        self.cache
            .read_through(&key, DataCategory::UserProfile, || {
                self.users.find_user(user_id)
            })
            .await
    }

    /// Limit defaults to `DEFAULT_SEARCH_LIMIT`.
    pub async fn search_users(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> ReadResponse<Vec<UserProfile>> {
        if query.trim().is_empty() {
            return read_rejected(
                "search_users",
                ServiceError::Validation("Search query cannot be empty".to_string()),
            );
        }
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let key = CacheKey::new(NAMESPACE)
            .with("search")
            .with(query)
            .with(limit);
        self.cache
            .read_through(&key, DataCategory::SearchResults, || {
                self.users.search_users(query, limit)
            })
            .await
    }

    pub async fn get_user_stats(&self, user_id: &str) -> ReadResponse<UserStats> {
        if user_id.trim().is_empty() {
            return read_rejected("get_user_stats", missing_user());
        }
        let key = CacheKey::new(NAMESPACE).with("stats").with(user_id);
        self.cache
            .read_through(&key, DataCategory::UserProfile, || {
                self.users.user_stats(user_id)
            })
            .await
    }

    /// Page defaults to 1, limit to `DEFAULT_PAGE_SIZE`.
    pub async fn get_users(
        &self,
        page: Option<usize>,
        limit: Option<usize>,
        filters: &UserFilters,
    ) -> ReadResponse<UserPage> {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return read_rejected(
                "get_users",
                ServiceError::Validation(format!(
                    "Limit must be between 1 and {}",
                    MAX_PAGE_SIZE
                )),
            );
        }
        let filters_segment = serde_json::to_string(filters).unwrap_or_default();
        let key = CacheKey::new(NAMESPACE)
            .with("list")
            .with(page)
            .with(limit)
            .with(filters_segment);
        self.cache
            .read_through(&key, DataCategory::UserProfile, || {
                self.users.list_users(page, limit, filters)
            })
            .await
    }

    /// Uncached; failures read as "no".
    pub async fn has_permission(&self, user_id: &str, permission: &str) -> bool {
        match self.permissions.has_permission(user_id, permission).await {
            Ok(allowed) => allowed,
            Err(e) => {
                warn!("Permission check {} for {} failed: {}", permission, user_id, e);
                false
            }
        }
    }

    /// Uncached; failures read as absent.
    pub async fn user_exists(&self, user_id: &str) -> bool {
        match self.users.user_exists(user_id).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!("Existence check for user {} failed: {}", user_id, e);
                false
            }
        }
    }

    pub async fn get_user_cache_stats(&self) -> ServiceCacheStats {
        ServiceCacheStats::new(SERVICE, NAMESPACE, self.cache.get_cache_stats().await)
    }

    async fn invalidate(&self, mutation: UserMutation, user_id: &str) {
        let patterns = USER_INVALIDATIONS.patterns_for(mutation, &[("user", user_id)]);
        self.cache.invalidate_patterns(&patterns).await;
    }
}

fn missing_user() -> ServiceError {
    ServiceError::Validation("User ID is required".to_string())
}
