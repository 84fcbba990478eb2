//! Message use cases
//!
//! Key layout:
//! - `message:single:{message}`
//! - `message:channel:{channel}:{limit}:{offset}`
//! - `message:user:{user}:{limit}:{offset}`
//! - `message:search:{query}:{channel}:{user}:{limit}`
//! - `message:stats:{channel}:{user}`
//!
//! Search and stats keys accept empty channel/user segments, so mutations
//! clear those families whole rather than guessing which scopes they touched.

use std::sync::Arc;

use tracing::warn;

use crate::domain::{MessageRepository, PermissionChecker};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    DeleteMessageRequest, Message, MessagePage, MessageStats, Page, ReadResponse,
    SearchMessagesRequest, SendMessageRequest, ServiceCacheStats, UpdateMessageRequest,
    WriteResponse,
};
use crate::orchestrator::{CacheKey, CacheOrchestrator, DataCategory, InvalidationMap};
use crate::services::{check, read_rejected, require_permission, write_response};

pub const NAMESPACE: &str = "message";
const SERVICE: &str = "MessageUseCaseService";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageMutation {
    Send,
    Update,
    Delete,
}

/// `{user}` is always the message's sender.
pub static MESSAGE_INVALIDATIONS: InvalidationMap<MessageMutation> = InvalidationMap::new(&[
    (
        MessageMutation::Send,
        &[
            "message:channel:{channel}",
            "message:user:{user}",
            "message:search",
            "message:stats",
        ],
    ),
    (
        MessageMutation::Update,
        &[
            "message:single:{message}",
            "message:channel:{channel}",
            "message:user:{user}",
            "message:search",
        ],
    ),
    (
        MessageMutation::Delete,
        &[
            "message:single:{message}",
            "message:channel:{channel}",
            "message:user:{user}",
            "message:search",
            "message:stats",
        ],
    ),
]);

pub struct MessageUseCaseService {
    cache: CacheOrchestrator,
    messages: Arc<dyn MessageRepository>,
    permissions: Arc<dyn PermissionChecker>,
}

impl MessageUseCaseService {
    pub fn new(
        cache: CacheOrchestrator,
        messages: Arc<dyn MessageRepository>,
        permissions: Arc<dyn PermissionChecker>,
    ) -> Self {
        Self {
            cache,
            messages,
            permissions,
        }
    }

    // == Writes ==

    pub async fn send_message(&self, request: &SendMessageRequest) -> WriteResponse<Message> {
        let result = async {
            check(request.validate())?;
            require_permission(self.permissions.as_ref(), &request.sender_id, "send_message")
                .await?;
            let message = self.messages.send_message(request).await?;
            self.invalidate(MessageMutation::Send, &message).await;
            Ok::<_, ServiceError>(message)
        }
        .await;
        write_response("send_message", result)
    }

    /// Only the sender may edit a message.
    pub async fn update_message(&self, request: &UpdateMessageRequest) -> WriteResponse<Message> {
        let result = async {
            check(request.validate())?;
            self.require_sender(&request.message_id, &request.user_id, "update_message")
                .await?;
            let message = self
                .messages
                .update_message(&request.message_id, &request.content)
                .await?;
            self.invalidate(MessageMutation::Update, &message).await;
            Ok::<_, ServiceError>(message)
        }
        .await;
        write_response("update_message", result)
    }

    /// Only the sender may delete a message.
    pub async fn delete_message(&self, request: &DeleteMessageRequest) -> WriteResponse<()> {
        let result = async {
            if request.message_id.trim().is_empty() || request.user_id.trim().is_empty() {
                return Err(ServiceError::Validation(
                    "Message ID and user ID are required".to_string(),
                ));
            }
            self.require_sender(&request.message_id, &request.user_id, "delete_message")
                .await?;
            let deleted = self.messages.delete_message(&request.message_id).await?;
            self.invalidate(MessageMutation::Delete, &deleted).await;
            Ok::<_, ServiceError>(())
        }
        .await;
        write_response("delete_message", result)
    }

    // == Reads ==

    pub async fn get_message(&self, message_id: &str) -> ReadResponse<Message> {
        if message_id.trim().is_empty() {
            return read_rejected(
                "get_message",
                ServiceError::Validation("Message ID is required".to_string()),
            );
        }
        let key = CacheKey::new(NAMESPACE).with("single").with(message_id);
        self.cache
            .read_through(&key, DataCategory::MessageSingle, || {
                self.messages.find_message(message_id)
            })
            .await
    }

    pub async fn get_channel_messages(
        &self,
        channel_id: &str,
        page: Page,
    ) -> ReadResponse<MessagePage> {
        if let Err(e) = require_scope(channel_id, "Channel ID is required", page) {
            return read_rejected("get_channel_messages", e);
        }
        let key = CacheKey::new(NAMESPACE)
            .with("channel")
            .with(channel_id)
            .with(page.limit)
            .with(page.offset);
        self.cache
            .read_through(&key, DataCategory::MessageList, || {
                self.messages.channel_messages(channel_id, page)
            })
            .await
    }

    pub async fn get_user_messages(&self, user_id: &str, page: Page) -> ReadResponse<MessagePage> {
        if let Err(e) = require_scope(user_id, "User ID is required", page) {
            return read_rejected("get_user_messages", e);
        }
        let key = CacheKey::new(NAMESPACE)
            .with("user")
            .with(user_id)
            .with(page.limit)
            .with(page.offset);
        self.cache
            .read_through(&key, DataCategory::MessageList, || {
                self.messages.user_messages(user_id, page)
            })
            .await
    }

    pub async fn search_messages(
        &self,
        request: &SearchMessagesRequest,
    ) -> ReadResponse<Vec<Message>> {
        if let Err(e) = check(request.validate()) {
            return read_rejected("search_messages", e);
        }
        let key = CacheKey::new(NAMESPACE)
            .with("search")
            .with(&request.query)
            .with(request.channel_id.as_deref().unwrap_or(""))
            .with(request.user_id.as_deref().unwrap_or(""))
            .with(request.limit);
        self.cache
            .read_through(&key, DataCategory::SearchResults, || {
                self.messages.search_messages(request)
            })
            .await
    }

    /// Stats scoped to a channel, a sender, both, or neither.
    pub async fn get_message_stats(
        &self,
        channel_id: Option<&str>,
        user_id: Option<&str>,
    ) -> ReadResponse<MessageStats> {
        let key = CacheKey::new(NAMESPACE)
            .with("stats")
            .with(channel_id.unwrap_or(""))
            .with(user_id.unwrap_or(""));
        self.cache
            .read_through(&key, DataCategory::MessageStats, || {
                self.messages.message_stats(channel_id, user_id)
            })
            .await
    }

    /// Uncached; any collaborator failure reads as absent.
    pub async fn message_exists(&self, message_id: &str) -> bool {
        match self.messages.message_exists(message_id).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!("Existence check for message {} failed: {}", message_id, e);
                false
            }
        }
    }

    pub async fn get_message_cache_stats(&self) -> ServiceCacheStats {
        ServiceCacheStats::new(SERVICE, NAMESPACE, self.cache.get_cache_stats().await)
    }

    // == Helpers ==

    async fn require_sender(
        &self,
        message_id: &str,
        user_id: &str,
        operation: &str,
    ) -> ServiceResult<Message> {
        require_permission(self.permissions.as_ref(), user_id, operation).await?;
        let message = self.messages.find_message(message_id).await?;
        if message.sender_id != user_id {
            return Err(ServiceError::permission_denied(user_id, operation));
        }
        Ok(message)
    }

    async fn invalidate(&self, mutation: MessageMutation, message: &Message) {
        let patterns = MESSAGE_INVALIDATIONS.patterns_for(
            mutation,
            &[
                ("message", message.id.as_str()),
                ("channel", message.channel_id.as_str()),
                ("user", message.sender_id.as_str()),
            ],
        );
        self.cache.invalidate_patterns(&patterns).await;
    }
}

fn require_scope(id: &str, missing: &str, page: Page) -> ServiceResult<()> {
    if id.trim().is_empty() {
        return Err(ServiceError::Validation(missing.to_string()));
    }
    check(page.validate())
}
