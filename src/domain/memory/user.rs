use async_trait::async_trait;

use super::{matches_query, InMemoryDomain};
use crate::domain::UserRepository;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{ProfileUpdate, UserFilters, UserPage, UserProfile, UserStats};

fn not_found(user_id: &str) -> ServiceError {
    ServiceError::NotFound(format!("user {}", user_id))
}

#[async_trait]
impl UserRepository for InMemoryDomain {
    async fn find_user(&self, user_id: &str) -> ServiceResult<UserProfile> {
        self.begin_read()?;
        self.tables
            .read()
            .await
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| not_found(user_id))
    }

    async fn update_user(
        &self,
        user_id: &str,
        updates: &ProfileUpdate,
    ) -> ServiceResult<UserProfile> {
        self.ensure_available()?;
        let mut tables = self.tables.write().await;
        let profile = tables
            .users
            .get_mut(user_id)
            .ok_or_else(|| not_found(user_id))?;
        updates.apply_to(profile);
        Ok(profile.clone())
    }

    async fn search_users(&self, query: &str, limit: usize) -> ServiceResult<Vec<UserProfile>> {
        self.begin_read()?;
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .filter(|u| matches_query(&u.display_name, query) || matches_query(&u.email, query))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn user_stats(&self, user_id: &str) -> ServiceResult<UserStats> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        if !tables.users.contains_key(user_id) {
            return Err(not_found(user_id));
        }
        let sent: Vec<_> = tables
            .messages
            .iter()
            .filter(|m| m.sender_id == user_id)
            .collect();

        Ok(UserStats {
            user_id: user_id.to_string(),
            channel_count: tables
                .channels
                .values()
                .filter(|c| c.has_member(user_id))
                .count(),
            message_count: sent.len(),
            last_active_at: sent.iter().map(|m| m.created_at).max(),
        })
    }

    async fn list_users(
        &self,
        page: usize,
        limit: usize,
        filters: &UserFilters,
    ) -> ServiceResult<UserPage> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        let matching: Vec<&UserProfile> =
            tables.users.values().filter(|u| filters.matches(u)).collect();
        let total = matching.len();
        let per_page = limit.max(1);
        let users = matching
            .into_iter()
            .skip(page.saturating_sub(1).saturating_mul(per_page))
            .take(per_page)
            .cloned()
            .collect();

        Ok(UserPage {
            users,
            total,
            page,
            total_pages: total / per_page + usize::from(total % per_page != 0),
        })
    }

    async fn delete_user(&self, user_id: &str) -> ServiceResult<()> {
        self.ensure_available()?;
        self.tables
            .write()
            .await
            .users
            .remove(user_id)
            .map(|_| ())
            .ok_or_else(|| not_found(user_id))
    }

    async fn user_exists(&self, user_id: &str) -> ServiceResult<bool> {
        self.ensure_available()?;
        Ok(self.tables.read().await.users.contains_key(user_id))
    }
}
