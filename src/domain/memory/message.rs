use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;

use super::{matches_query, InMemoryDomain};
use crate::domain::MessageRepository;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    Message, MessagePage, MessageStats, Page, SearchMessagesRequest, SendMessageRequest,
};

fn not_found(message_id: &str) -> ServiceError {
    ServiceError::NotFound(format!("message {}", message_id))
}

fn page_of(mut matching: Vec<Message>, page: Page) -> MessagePage {
    matching.reverse();
    let (messages, has_more) = page.slice(&matching);
    MessagePage {
        messages,
        total: matching.len(),
        has_more,
    }
}

#[async_trait]
impl MessageRepository for InMemoryDomain {
    async fn send_message(&self, request: &SendMessageRequest) -> ServiceResult<Message> {
        self.ensure_available()?;
        let mut tables = self.tables.write().await;
        if !tables.channels.contains_key(&request.channel_id) {
            return Err(ServiceError::NotFound(format!(
                "channel {}",
                request.channel_id
            )));
        }

        let now = Utc::now();
        let message = Message {
            id: self.next_id("msg"),
            channel_id: request.channel_id.clone(),
            sender_id: request.sender_id.clone(),
            content: request.content.clone(),
            kind: request.kind,
            reply_to: request.reply_to.clone(),
            edited: false,
            created_at: now,
            updated_at: now,
        };
        tables.messages.push(message.clone());
        Ok(message)
    }

    async fn find_message(&self, message_id: &str) -> ServiceResult<Message> {
        self.begin_read()?;
        self.tables
            .read()
            .await
            .messages
            .iter()
            .find(|m| m.id == message_id)
            .cloned()
            .ok_or_else(|| not_found(message_id))
    }

    async fn channel_messages(&self, channel_id: &str, page: Page) -> ServiceResult<MessagePage> {
        self.begin_read()?;
        let matching = self
            .tables
            .read()
            .await
            .messages
            .iter()
            .filter(|m| m.channel_id == channel_id)
            .cloned()
            .collect();
        Ok(page_of(matching, page))
    }

    async fn user_messages(&self, user_id: &str, page: Page) -> ServiceResult<MessagePage> {
        self.begin_read()?;
        let matching = self
            .tables
            .read()
            .await
            .messages
            .iter()
            .filter(|m| m.sender_id == user_id)
            .cloned()
            .collect();
        Ok(page_of(matching, page))
    }

    async fn update_message(&self, message_id: &str, content: &str) -> ServiceResult<Message> {
        self.ensure_available()?;
        let mut tables = self.tables.write().await;
        let message = tables
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| not_found(message_id))?;
        message.content = content.to_string();
        message.edited = true;
        message.updated_at = Utc::now();
        Ok(message.clone())
    }

    async fn delete_message(&self, message_id: &str) -> ServiceResult<Message> {
        self.ensure_available()?;
        let mut tables = self.tables.write().await;
        let index = tables
            .messages
            .iter()
            .position(|m| m.id == message_id)
            .ok_or_else(|| not_found(message_id))?;
        Ok(tables.messages.remove(index))
    }

    async fn search_messages(
        &self,
        request: &SearchMessagesRequest,
    ) -> ServiceResult<Vec<Message>> {
        self.begin_read()?;
        Ok(self
            .tables
            .read()
            .await
            .messages
            .iter()
            .rev()
            .filter(|m| {
                request.channel_id.as_deref().map_or(true, |c| m.channel_id == c)
                    && request.user_id.as_deref().map_or(true, |u| m.sender_id == u)
                    && matches_query(&m.content, &request.query)
            })
            .take(request.limit)
            .cloned()
            .collect())
    }

    async fn message_stats(
        &self,
        channel_id: Option<&str>,
        user_id: Option<&str>,
    ) -> ServiceResult<MessageStats> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        let matching: Vec<&Message> = tables
            .messages
            .iter()
            .filter(|m| {
                channel_id.map_or(true, |c| m.channel_id == c)
                    && user_id.map_or(true, |u| m.sender_id == u)
            })
            .collect();
        let senders: HashSet<&str> = matching.iter().map(|m| m.sender_id.as_str()).collect();

        Ok(MessageStats {
            total_messages: matching.len(),
            unique_senders: senders.len(),
            last_message_at: matching.iter().map(|m| m.created_at).max(),
        })
    }

    async fn message_exists(&self, message_id: &str) -> ServiceResult<bool> {
        self.ensure_available()?;
        Ok(self
            .tables
            .read()
            .await
            .messages
            .iter()
            .any(|m| m.id == message_id))
    }
}
