//! Notification use cases
//!
//! Key layout:
//! - `notification:single:{notification}`
//! - `notification:user:{user}:{limit}:{offset}`
//! - `notification:stats:{user}`

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{ChannelRepository, NotificationRepository, PermissionChecker};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    ChannelNotificationRequest, Notification, NotificationActionRequest, NotificationKind,
    NotificationPage, NotificationStats, Page, ReadResponse, SendNotificationRequest,
    ServiceCacheStats, WriteResponse,
};
use crate::orchestrator::{CacheKey, CacheOrchestrator, DataCategory, InvalidationMap};
use crate::services::{check, read_rejected, require_permission, write_response};

pub const NAMESPACE: &str = "notification";
const SERVICE: &str = "NotificationUseCaseService";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationMutation {
    Send,
    MarkRead,
    Delete,
}

/// `{user}` is the recipient.
pub static NOTIFICATION_INVALIDATIONS: InvalidationMap<NotificationMutation> =
    InvalidationMap::new(&[
        (
            NotificationMutation::Send,
            &["notification:user:{user}", "notification:stats:{user}"],
        ),
        (
            NotificationMutation::MarkRead,
            &[
                "notification:single:{notification}",
                "notification:user:{user}",
                "notification:stats:{user}",
            ],
        ),
        (
            NotificationMutation::Delete,
            &[
                "notification:single:{notification}",
                "notification:user:{user}",
                "notification:stats:{user}",
            ],
        ),
    ]);

pub struct NotificationUseCaseService {
    cache: CacheOrchestrator,
    notifications: Arc<dyn NotificationRepository>,
    channels: Arc<dyn ChannelRepository>,
    permissions: Arc<dyn PermissionChecker>,
}

impl NotificationUseCaseService {
    pub fn new(
        cache: CacheOrchestrator,
        notifications: Arc<dyn NotificationRepository>,
        channels: Arc<dyn ChannelRepository>,
        permissions: Arc<dyn PermissionChecker>,
    ) -> Self {
        Self {
            cache,
            notifications,
            channels,
            permissions,
        }
    }

    // == Writes ==

    pub async fn send_notification(
        &self,
        request: &SendNotificationRequest,
    ) -> WriteResponse<Notification> {
        let result = async {
            check(request.validate())?;
            self.deliver(request).await
        }
        .await;
        write_response("send_notification", result)
    }

    /// Shorthand for a direct notification to one user.
    pub async fn send_user_notification(
        &self,
        user_id: &str,
        title: &str,
        message: &str,
        kind: NotificationKind,
    ) -> WriteResponse<Notification> {
        let request = SendNotificationRequest {
            user_id: user_id.to_string(),
            channel_id: None,
            title: title.to_string(),
            message: message.to_string(),
            kind,
        };
        self.send_notification(&request).await
    }

    /// Notifies every channel member except the sender, who must belong to
    /// the channel.
    pub async fn send_channel_notification(
        &self,
        request: &ChannelNotificationRequest,
    ) -> WriteResponse<Vec<Notification>> {
        let result = async {
            check(request.validate())?;
            require_permission(
                self.permissions.as_ref(),
                &request.sender_id,
                "send_notification",
            )
            .await?;
            let channel = self.channels.find_channel(&request.channel_id).await?;
            if !channel.has_member(&request.sender_id) {
                return Err(ServiceError::permission_denied(
                    &request.sender_id,
                    "send_notification",
                ));
            }

            let recipients: Vec<String> = std::iter::once(&channel.owner_id)
                .chain(channel.members.iter())
                .filter(|user| **user != request.sender_id)
                .cloned()
                .collect();
            let sent = self
                .notifications
                .create_channel_notifications(request, &recipients)
                .await?;
            for notification in &sent {
                self.invalidate(NotificationMutation::Send, notification)
                    .await;
            }
            info!(
                "Channel notification for {} delivered to {} members",
                channel.id,
                sent.len()
            );
            Ok::<_, ServiceError>(sent)
        }
        .await;
        write_response("send_channel_notification", result)
    }

    /// Recipients only.
    pub async fn mark_as_read(
        &self,
        request: &NotificationActionRequest,
    ) -> WriteResponse<Notification> {
        let result = async {
            check(request.validate())?;
            self.require_recipient(request, "mark_as_read").await?;
            let notification = self.notifications.mark_read(&request.notification_id).await?;
            self.invalidate(NotificationMutation::MarkRead, &notification)
                .await;
            Ok::<_, ServiceError>(notification)
        }
        .await;
        write_response("mark_as_read", result)
    }

    /// Recipients only.
    pub async fn delete_notification(
        &self,
        request: &NotificationActionRequest,
    ) -> WriteResponse<()> {
        let result = async {
            check(request.validate())?;
            self.require_recipient(request, "delete_notification")
                .await?;
            let deleted = self
                .notifications
                .delete_notification(&request.notification_id)
                .await?;
            self.invalidate(NotificationMutation::Delete, &deleted).await;
            Ok::<_, ServiceError>(())
        }
        .await;
        write_response("delete_notification", result)
    }

    // == Reads ==

    pub async fn get_notification(&self, notification_id: &str) -> ReadResponse<Notification> {
        if notification_id.trim().is_empty() {
            return read_rejected(
                "get_notification",
                ServiceError::Validation("Notification ID is required".to_string()),
            );
        }
        let key = CacheKey::new(NAMESPACE).with("single").with(notification_id);
        self.cache
            .read_through(&key, DataCategory::NotificationSingle, || {
                self.notifications.find_notification(notification_id)
            })
            .await
    }

    pub async fn get_user_notifications(
        &self,
        user_id: &str,
        page: Page,
    ) -> ReadResponse<NotificationPage> {
        if let Err(e) = require_user(user_id).and_then(|_| check(page.validate())) {
            return read_rejected("get_user_notifications", e);
        }
        let key = CacheKey::new(NAMESPACE)
            .with("user")
            .with(user_id)
            .with(page.limit)
            .with(page.offset);
        self.cache
            .read_through(&key, DataCategory::NotificationList, || {
                self.notifications.notifications_for_user(user_id, page)
            })
            .await
    }

    pub async fn get_notification_stats(&self, user_id: &str) -> ReadResponse<NotificationStats> {
        if let Err(e) = require_user(user_id) {
            return read_rejected("get_notification_stats", e);
        }
        let key = CacheKey::new(NAMESPACE).with("stats").with(user_id);
        self.cache
            .read_through(&key, DataCategory::NotificationStats, || {
                self.notifications.notification_stats(user_id)
            })
            .await
    }

    /// Uncached; failures read as absent.
    pub async fn notification_exists(&self, notification_id: &str) -> bool {
        match self.notifications.notification_exists(notification_id).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(
                    "Existence check for notification {} failed: {}",
                    notification_id, e
                );
                false
            }
        }
    }

    pub async fn get_notification_cache_stats(&self) -> ServiceCacheStats {
        ServiceCacheStats::new(SERVICE, NAMESPACE, self.cache.get_cache_stats().await)
    }

    // == Helpers ==

    async fn deliver(&self, request: &SendNotificationRequest) -> ServiceResult<Notification> {
        let notification = self.notifications.create_notification(request).await?;
        self.invalidate(NotificationMutation::Send, &notification)
            .await;
        Ok(notification)
    }

    async fn require_recipient(
        &self,
        request: &NotificationActionRequest,
        operation: &str,
    ) -> ServiceResult<()> {
        let notification = self
            .notifications
            .find_notification(&request.notification_id)
            .await?;
        if notification.user_id != request.user_id {
            return Err(ServiceError::permission_denied(&request.user_id, operation));
        }
        Ok(())
    }

    async fn invalidate(&self, mutation: NotificationMutation, notification: &Notification) {
        let patterns = NOTIFICATION_INVALIDATIONS.patterns_for(
            mutation,
            &[
                ("notification", notification.id.as_str()),
                ("user", notification.user_id.as_str()),
            ],
        );
        self.cache.invalidate_patterns(&patterns).await;
    }
}

fn require_user(user_id: &str) -> ServiceResult<()> {
    if user_id.trim().is_empty() {
        return Err(ServiceError::Validation("User ID is required".to_string()));
    }
    Ok(())
}
