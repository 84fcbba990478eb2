use async_trait::async_trait;
use chrono::Utc;

use super::{matches_query, InMemoryDomain};
use crate::domain::ChannelRepository;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Channel, ChannelStats, ChannelUpdate, CreateChannelRequest};

fn not_found(channel_id: &str) -> ServiceError {
    ServiceError::NotFound(format!("channel {}", channel_id))
}

#[async_trait]
impl ChannelRepository for InMemoryDomain {
    async fn create_channel(&self, request: &CreateChannelRequest) -> ServiceResult<Channel> {
        self.ensure_available()?;
        let now = Utc::now();
        let mut members: Vec<String> = Vec::new();
        for member in &request.members {
            if member != &request.owner_id && !members.contains(member) {
                members.push(member.clone());
            }
        }

        let channel = Channel {
            id: self.next_id("ch"),
            name: request.name.trim().to_string(),
            description: request.description.clone(),
            kind: request.kind,
            owner_id: request.owner_id.clone(),
            members,
            created_at: now,
            updated_at: now,
        };
        self.tables
            .write()
            .await
            .channels
            .insert(channel.id.clone(), channel.clone());
        Ok(channel)
    }

    async fn find_channel(&self, channel_id: &str) -> ServiceResult<Channel> {
        self.begin_read()?;
        self.tables
            .read()
            .await
            .channels
            .get(channel_id)
            .cloned()
            .ok_or_else(|| not_found(channel_id))
    }

    async fn channels_for_user(&self, user_id: &str) -> ServiceResult<Vec<Channel>> {
        self.begin_read()?;
        Ok(self
            .tables
            .read()
            .await
            .channels
            .values()
            .filter(|c| c.has_member(user_id))
            .cloned()
            .collect())
    }

    async fn update_channel(
        &self,
        channel_id: &str,
        updates: &ChannelUpdate,
    ) -> ServiceResult<Channel> {
        self.ensure_available()?;
        let mut tables = self.tables.write().await;
        let channel = tables
            .channels
            .get_mut(channel_id)
            .ok_or_else(|| not_found(channel_id))?;
        updates.apply_to(channel);
        Ok(channel.clone())
    }

    async fn add_member(&self, channel_id: &str, member_id: &str) -> ServiceResult<Channel> {
        self.ensure_available()?;
        let mut tables = self.tables.write().await;
        let channel = tables
            .channels
            .get_mut(channel_id)
            .ok_or_else(|| not_found(channel_id))?;
        if channel.has_member(member_id) {
            return Err(ServiceError::Conflict(format!(
                "{} is already a member of {}",
                member_id, channel_id
            )));
        }
        channel.members.push(member_id.to_string());
        channel.updated_at = Utc::now();
        Ok(channel.clone())
    }

    async fn remove_member(&self, channel_id: &str, member_id: &str) -> ServiceResult<Channel> {
        self.ensure_available()?;
        let mut tables = self.tables.write().await;
        let channel = tables
            .channels
            .get_mut(channel_id)
            .ok_or_else(|| not_found(channel_id))?;
        if channel.owner_id == member_id {
            return Err(ServiceError::Conflict(
                "The channel owner cannot be removed".to_string(),
            ));
        }
        let before = channel.members.len();
        channel.members.retain(|m| m != member_id);
        if channel.members.len() == before {
            return Err(ServiceError::NotFound(format!(
                "member {} in channel {}",
                member_id, channel_id
            )));
        }
        channel.updated_at = Utc::now();
        Ok(channel.clone())
    }

    async fn delete_channel(&self, channel_id: &str) -> ServiceResult<Channel> {
        self.ensure_available()?;
        let mut tables = self.tables.write().await;
        let channel = tables
            .channels
            .remove(channel_id)
            .ok_or_else(|| not_found(channel_id))?;
        tables.messages.retain(|m| m.channel_id != channel_id);
        Ok(channel)
    }

    async fn search_channels(
        &self,
        query: &str,
        user_id: &str,
        limit: usize,
    ) -> ServiceResult<Vec<Channel>> {
        self.begin_read()?;
        Ok(self
            .tables
            .read()
            .await
            .channels
            .values()
            .filter(|c| c.has_member(user_id) && matches_query(&c.name, query))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn channel_stats(&self, channel_id: &str) -> ServiceResult<ChannelStats> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        let channel = tables
            .channels
            .get(channel_id)
            .ok_or_else(|| not_found(channel_id))?;
        let messages: Vec<_> = tables
            .messages
            .iter()
            .filter(|m| m.channel_id == channel_id)
            .collect();

        Ok(ChannelStats {
            channel_id: channel_id.to_string(),
            member_count: channel.members.len() + 1,
            message_count: messages.len() as u64,
            last_activity_at: messages
                .iter()
                .map(|m| m.created_at)
                .max()
                .or(Some(channel.updated_at)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, owner: &str, members: &[&str]) -> CreateChannelRequest {
        CreateChannelRequest {
            name: name.to_string(),
            owner_id: owner.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let domain = InMemoryDomain::new();
        let created = domain
            .create_channel(&request("Team", "u1", &["u1", "u2"]))
            .await
            .unwrap();

        assert_eq!(created.members, vec!["u2"]);
        let found = domain.find_channel(&created.id).await.unwrap();
        assert_eq!(found, created);
        assert_eq!(domain.read_count(), 1);
    }

    #[tokio::test]
    async fn test_member_lifecycle() {
        let domain = InMemoryDomain::new();
        let channel = domain.create_channel(&request("Team", "u1", &[])).await.unwrap();

        domain.add_member(&channel.id, "u2").await.unwrap();
        let dup = domain.add_member(&channel.id, "u2").await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));

        let owner = domain.remove_member(&channel.id, "u1").await;
        assert!(matches!(owner, Err(ServiceError::Conflict(_))));

        let after = domain.remove_member(&channel.id, "u2").await.unwrap();
        assert!(after.members.is_empty());
        let missing = domain.remove_member(&channel.id, "u2").await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_search_only_visible_channels() {
        let domain = InMemoryDomain::new();
        domain.create_channel(&request("Team A", "u1", &[])).await.unwrap();
        domain.create_channel(&request("Team B", "u2", &[])).await.unwrap();

        let found = domain.search_channels("team", "u1", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Team A");
    }

    #[tokio::test]
    async fn test_delete_channel() {
        let domain = InMemoryDomain::new();
        let channel = domain.create_channel(&request("Team", "u1", &[])).await.unwrap();

        domain.delete_channel(&channel.id).await.unwrap();

        assert!(matches!(
            domain.find_channel(&channel.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
