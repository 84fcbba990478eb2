//! Channel use cases
//!
//! Key layout:
//! - `channel:single:{channel}`
//! - `channel:members:{channel}`
//! - `channel:stats:{channel}`
//! - `channel:list:{user}`
//! - `channel:search:{query}:{user}:{limit}`
//!
//! Creating a channel is open to anyone, deleting it is reserved to the
//! owner, and every other mutation requires the caller to belong to it.

use std::sync::Arc;

use tracing::warn;

use crate::domain::ChannelRepository;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    Channel, ChannelStats, CreateChannelRequest, MemberRequest, ReadResponse, ServiceCacheStats,
    UpdateChannelRequest, WriteResponse,
};
use crate::orchestrator::{CacheKey, CacheOrchestrator, DataCategory, InvalidationMap};
use crate::services::{check, read_rejected, write_response};

pub const NAMESPACE: &str = "channel";
const SERVICE: &str = "ChannelUseCaseService";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMutation {
    Create,
    Update,
    AddMember,
    RemoveMember,
    Delete,
}

const CHANNEL_WIDE: &[&str] = &[
    "channel:single:{channel}",
    "channel:members:{channel}",
    "channel:stats:{channel}",
    "channel:list:{user}",
    "channel:search:*:{user}",
];

/// Rendered once per affected user, so `{user}` covers the owner, every
/// member, and anyone just added or removed.
pub static CHANNEL_INVALIDATIONS: InvalidationMap<ChannelMutation> = InvalidationMap::new(&[
    (
        ChannelMutation::Create,
        &["channel:list:{user}", "channel:search:*:{user}"],
    ),
    (ChannelMutation::Update, CHANNEL_WIDE),
    (ChannelMutation::AddMember, CHANNEL_WIDE),
    (ChannelMutation::RemoveMember, CHANNEL_WIDE),
    (ChannelMutation::Delete, CHANNEL_WIDE),
]);

pub struct ChannelUseCaseService {
    cache: CacheOrchestrator,
    channels: Arc<dyn ChannelRepository>,
}

impl ChannelUseCaseService {
    pub fn new(cache: CacheOrchestrator, channels: Arc<dyn ChannelRepository>) -> Self {
        Self { cache, channels }
    }

    // == Writes ==

    pub async fn create_channel(&self, request: &CreateChannelRequest) -> WriteResponse<Channel> {
        let result = async {
            check(request.validate())?;
            let channel = self.channels.create_channel(request).await?;
            self.invalidate(ChannelMutation::Create, &channel, None).await;
            Ok::<_, ServiceError>(channel)
        }
        .await;
        write_response("create_channel", result)
    }

    pub async fn update_channel(&self, request: &UpdateChannelRequest) -> WriteResponse<Channel> {
        let result = async {
            check(request.validate())?;
            self.require_member(&request.channel_id, &request.user_id, "update_channel")
                .await?;
            let channel = self
                .channels
                .update_channel(&request.channel_id, &request.updates)
                .await?;
            self.invalidate(ChannelMutation::Update, &channel, None).await;
            Ok::<_, ServiceError>(channel)
        }
        .await;
        write_response("update_channel", result)
    }

    pub async fn add_member(&self, request: &MemberRequest) -> WriteResponse<Channel> {
        let result = async {
            check(request.validate())?;
            self.require_member(&request.channel_id, &request.user_id, "add_member")
                .await?;
            let channel = self
                .channels
                .add_member(&request.channel_id, &request.member_id)
                .await?;
            self.invalidate(ChannelMutation::AddMember, &channel, None)
                .await;
            Ok::<_, ServiceError>(channel)
        }
        .await;
        write_response("add_member", result)
    }

    pub async fn remove_member(&self, request: &MemberRequest) -> WriteResponse<Channel> {
        let result = async {
            check(request.validate())?;
            self.require_member(&request.channel_id, &request.user_id, "remove_member")
                .await?;
            let channel = self
                .channels
                .remove_member(&request.channel_id, &request.member_id)
                .await?;
            self.invalidate(
                ChannelMutation::RemoveMember,
                &channel,
                Some(request.member_id.as_str()),
            )
            .await;
            Ok::<_, ServiceError>(channel)
        }
        .await;
        write_response("remove_member", result)
    }

    /// Owner only.
    pub async fn delete_channel(&self, channel_id: &str, user_id: &str) -> WriteResponse<()> {
        let result = async {
            if channel_id.trim().is_empty() || user_id.trim().is_empty() {
                return Err(ServiceError::Validation(
                    "Channel ID and user ID are required".to_string(),
                ));
            }
            let channel = self.channels.find_channel(channel_id).await?;
            if channel.owner_id != user_id {
                return Err(ServiceError::permission_denied(user_id, "delete_channel"));
            }
            let deleted = self.channels.delete_channel(channel_id).await?;
            self.invalidate(ChannelMutation::Delete, &deleted, None).await;
            Ok::<_, ServiceError>(())
        }
        .await;
        write_response("delete_channel", result)
    }

    // == Reads ==

    pub async fn get_channel(&self, channel_id: &str) -> ReadResponse<Channel> {
        if let Err(e) = require_id(channel_id) {
            return read_rejected("get_channel", e);
        }
        let key = CacheKey::new(NAMESPACE).with("single").with(channel_id);
        self.cache
            .read_through(&key, DataCategory::ChannelInfo, || {
                self.channels.find_channel(channel_id)
            })
            .await
    }

    /// Channels the user owns or belongs to.
    pub async fn get_channels(&self, user_id: &str) -> ReadResponse<Vec<Channel>> {
        if user_id.trim().is_empty() {
            return read_rejected(
                "get_channels",
                ServiceError::Validation("User ID is required".to_string()),
            );
        }
        let key = CacheKey::new(NAMESPACE).with("list").with(user_id);
        self.cache
            .read_through(&key, DataCategory::ChannelList, || {
                self.channels.channels_for_user(user_id)
            })
            .await
    }

    /// Owner first, then members in join order.
    pub async fn get_channel_members(&self, channel_id: &str) -> ReadResponse<Vec<String>> {
        if let Err(e) = require_id(channel_id) {
            return read_rejected("get_channel_members", e);
        }
        let key = CacheKey::new(NAMESPACE).with("members").with(channel_id);
        self.cache
            .read_through(&key, DataCategory::ChannelInfo, || async {
                let channel = self.channels.find_channel(channel_id).await?;
                let mut members = vec![channel.owner_id];
                members.extend(channel.members);
                Ok::<_, ServiceError>(members)
            })
            .await
    }

    /// Uncached; any collaborator failure reads as "not a member".
    pub async fn is_member(&self, channel_id: &str, user_id: &str) -> bool {
        match self.channels.find_channel(channel_id).await {
            Ok(channel) => channel.has_member(user_id),
            Err(e) => {
                warn!("Membership check for {} in {} failed: {}", user_id, channel_id, e);
                false
            }
        }
    }

    pub async fn search_channels(
        &self,
        query: &str,
        user_id: &str,
        limit: usize,
    ) -> ReadResponse<Vec<Channel>> {
        if query.trim().is_empty() {
            return read_rejected(
                "search_channels",
                ServiceError::Validation("Search query cannot be empty".to_string()),
            );
        }
        let key = CacheKey::new(NAMESPACE)
            .with("search")
            .with(query)
            .with(user_id)
            .with(limit);
        self.cache
            .read_through(&key, DataCategory::SearchResults, || {
                self.channels.search_channels(query, user_id, limit)
            })
            .await
    }

    pub async fn get_channel_stats(&self, channel_id: &str) -> ReadResponse<ChannelStats> {
        if let Err(e) = require_id(channel_id) {
            return read_rejected("get_channel_stats", e);
        }
        let key = CacheKey::new(NAMESPACE).with("stats").with(channel_id);
        self.cache
            .read_through(&key, DataCategory::ChannelInfo, || {
                self.channels.channel_stats(channel_id)
            })
            .await
    }

    pub async fn get_channel_cache_stats(&self) -> ServiceCacheStats {
        ServiceCacheStats::new(SERVICE, NAMESPACE, self.cache.get_cache_stats().await)
    }

    // == Helpers ==

    async fn require_member(
        &self,
        channel_id: &str,
        user_id: &str,
        operation: &str,
    ) -> ServiceResult<Channel> {
        let channel = self.channels.find_channel(channel_id).await?;
        if !channel.has_member(user_id) {
            return Err(ServiceError::permission_denied(user_id, operation));
        }
        Ok(channel)
    }

    /// Applies `mutation`'s patterns for the channel and each affected user.
    async fn invalidate(&self, mutation: ChannelMutation, channel: &Channel, extra: Option<&str>) {
        let users = std::iter::once(channel.owner_id.as_str())
            .chain(channel.members.iter().map(String::as_str))
            .chain(extra);

        let mut patterns = Vec::new();
        for user in users {
            let params = [("channel", channel.id.as_str()), ("user", user)];
            for pattern in CHANNEL_INVALIDATIONS.patterns_for(mutation, &params) {
                if !patterns.contains(&pattern) {
                    patterns.push(pattern);
                }
            }
        }
        self.cache.invalidate_patterns(&patterns).await;
    }
}

fn require_id(channel_id: &str) -> ServiceResult<()> {
    if channel_id.trim().is_empty() {
        return Err(ServiceError::Validation("Channel ID is required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryBackend;
    use crate::domain::InMemoryDomain;
    use crate::models::ChannelUpdate;

    fn setup() -> (ChannelUseCaseService, Arc<InMemoryDomain>) {
        let domain = Arc::new(InMemoryDomain::new());
        let service = ChannelUseCaseService::new(
            CacheOrchestrator::new(MemoryBackend::new(100)),
            domain.clone(),
        );
        (service, domain)
    }

    fn create(name: &str, owner: &str, members: &[&str]) -> CreateChannelRequest {
        CreateChannelRequest {
            name: name.to_string(),
            owner_id: owner.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
            ..Default::default()
        }
    }

    fn rename(channel_id: &str, user_id: &str, name: &str) -> UpdateChannelRequest {
        UpdateChannelRequest {
            channel_id: channel_id.to_string(),
            user_id: user_id.to_string(),
            updates: ChannelUpdate {
                name: Some(name.to_string()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_every_mutation_has_templates() {
        assert_eq!(CHANNEL_INVALIDATIONS.mutations().count(), 5);
        assert!(CHANNEL_INVALIDATIONS
            .templates(ChannelMutation::Update)
            .contains(&"channel:single:{channel}"));
    }

    #[tokio::test]
    async fn test_get_channel_cached_on_second_read() {
        let (service, domain) = setup();
        let channel = service
            .create_channel(&create("Team", "u1", &[]))
            .await
            .payload
            .unwrap();

        let first = service.get_channel(&channel.id).await;
        let second = service.get_channel(&channel.id).await;

        assert!(first.success && !first.cached);
        assert!(second.cached);
        assert_eq!(second.payload.unwrap().name, "Team");
        assert_eq!(domain.read_count(), 1);
    }

    #[tokio::test]
    async fn test_update_invalidates_single_and_lists() {
        let (service, _) = setup();
        let channel = service
            .create_channel(&create("Team", "u1", &["u2"]))
            .await
            .payload
            .unwrap();
        service.get_channel(&channel.id).await;
        service.get_channels("u2").await;

        let updated = service.update_channel(&rename(&channel.id, "u2", "Team2")).await;
        assert!(updated.success);

        let single = service.get_channel(&channel.id).await;
        let list = service.get_channels("u2").await;
        assert!(!single.cached);
        assert_eq!(single.payload.unwrap().name, "Team2");
        assert!(!list.cached);
        assert_eq!(list.payload.unwrap()[0].name, "Team2");
    }

    #[tokio::test]
    async fn test_update_by_outsider_denied_and_cache_kept() {
        let (service, _) = setup();
        let channel = service
            .create_channel(&create("Team", "u1", &[]))
            .await
            .payload
            .unwrap();
        service.get_channel(&channel.id).await;

        let resp = service.update_channel(&rename(&channel.id, "u9", "Hacked")).await;

        assert!(!resp.success);
        assert_eq!(
            resp.error.as_deref(),
            Some("User u9 does not have permission to update_channel")
        );
        let again = service.get_channel(&channel.id).await;
        assert!(again.cached);
        assert_eq!(again.payload.unwrap().name, "Team");
    }

    #[tokio::test]
    async fn test_create_invalidates_member_lists() {
        let (service, _) = setup();
        let before = service.get_channels("u2").await;
        assert_eq!(before.payload.as_deref().map(<[Channel]>::len), Some(0));

        service.create_channel(&create("Team", "u1", &["u2"])).await;

        let after = service.get_channels("u2").await;
        assert!(!after.cached);
        assert_eq!(after.payload.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_member_changes() {
        let (service, _) = setup();
        let channel = service
            .create_channel(&create("Team", "u1", &[]))
            .await
            .payload
            .unwrap();
        service.get_channel_members(&channel.id).await;
        service.get_channels("u3").await;

        let added = service
            .add_member(&MemberRequest {
                channel_id: channel.id.clone(),
                user_id: "u1".to_string(),
                member_id: "u3".to_string(),
            })
            .await;
        assert!(added.success);

        let members = service.get_channel_members(&channel.id).await;
        assert!(!members.cached);
        assert_eq!(members.payload.unwrap(), vec!["u1", "u3"]);
        assert_eq!(service.get_channels("u3").await.payload.unwrap().len(), 1);

        service.get_channels("u3").await;
        let removed = service
            .remove_member(&MemberRequest {
                channel_id: channel.id.clone(),
                user_id: "u1".to_string(),
                member_id: "u3".to_string(),
            })
            .await;
        assert!(removed.success);
        let list = service.get_channels("u3").await;
        assert!(!list.cached);
        assert!(list.payload.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_owner_only() {
        let (service, _) = setup();
        let channel = service
            .create_channel(&create("Team", "u1", &["u2"]))
            .await
            .payload
            .unwrap();
        service.get_channel(&channel.id).await;

        let denied = service.delete_channel(&channel.id, "u2").await;
        assert!(!denied.success);

        let deleted = service.delete_channel(&channel.id, "u1").await;
        assert!(deleted.success);
        let gone = service.get_channel(&channel.id).await;
        assert!(!gone.success);
        assert!(!gone.cached);
    }

    #[tokio::test]
    async fn test_validation_fails_before_collaborator() {
        let (service, domain) = setup();
        domain.set_unavailable(true);

        let resp = service.create_channel(&create("", "u1", &[])).await;
        assert_eq!(resp.error.as_deref(), Some("Channel name cannot be empty"));

        let read = service.get_channel(" ").await;
        assert_eq!(read.error.as_deref(), Some("Channel ID is required"));
    }

    #[tokio::test]
    async fn test_search_invalidated_per_user() {
        let (service, _) = setup();
        let channel = service
            .create_channel(&create("Team", "u1", &[]))
            .await
            .payload
            .unwrap();
        service.search_channels("team", "u1", 10).await;
        assert!(service.search_channels("team", "u1", 10).await.cached);

        service.update_channel(&rename(&channel.id, "u1", "Crew")).await;

        let after = service.search_channels("team", "u1", 10).await;
        assert!(!after.cached);
        assert!(after.payload.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_is_member_and_stats() {
        let (service, domain) = setup();
        let channel = service
            .create_channel(&create("Team", "u1", &["u2"]))
            .await
            .payload
            .unwrap();

        assert!(service.is_member(&channel.id, "u2").await);
        assert!(!service.is_member("missing", "u2").await);

        let stats = service.get_channel_stats(&channel.id).await;
        assert_eq!(stats.payload.unwrap().member_count, 2);

        domain.set_unavailable(true);
        assert!(service.get_channel_stats(&channel.id).await.cached);
    }

    #[tokio::test]
    async fn test_cache_stats_namespace() {
        let (service, _) = setup();
        let channel = service
            .create_channel(&create("Team", "u1", &[]))
            .await
            .payload
            .unwrap();
        service.get_channel(&channel.id).await;
        service.get_channel(&channel.id).await;

        let stats = service.get_channel_cache_stats().await;
        assert_eq!(stats.service, "ChannelUseCaseService");
        assert_eq!(stats.namespace_keys, 1);
        assert_eq!(stats.snapshot.hits, 1);
    }
}
