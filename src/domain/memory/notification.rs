use async_trait::async_trait;
use chrono::Utc;

use super::InMemoryDomain;
use crate::domain::NotificationRepository;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    ChannelNotificationRequest, Notification, NotificationPage, NotificationStats, Page,
    SendNotificationRequest,
};

fn not_found(notification_id: &str) -> ServiceError {
    ServiceError::NotFound(format!("notification {}", notification_id))
}

#[async_trait]
impl NotificationRepository for InMemoryDomain {
    async fn create_notification(
        &self,
        request: &SendNotificationRequest,
    ) -> ServiceResult<Notification> {
        self.ensure_available()?;
        let notification = Notification {
            id: self.next_id("ntf"),
            user_id: request.user_id.clone(),
            channel_id: request.channel_id.clone(),
            title: request.title.clone(),
            message: request.message.clone(),
            kind: request.kind,
            read: false,
            created_at: Utc::now(),
        };
        self.tables
            .write()
            .await
            .notifications
            .push(notification.clone());
        Ok(notification)
    }

    async fn create_channel_notifications(
        &self,
        request: &ChannelNotificationRequest,
        recipients: &[String],
    ) -> ServiceResult<Vec<Notification>> {
        self.ensure_available()?;
        let created_at = Utc::now();
        let batch: Vec<Notification> = recipients
            .iter()
            .map(|user_id| Notification {
                id: self.next_id("ntf"),
                user_id: user_id.clone(),
                channel_id: Some(request.channel_id.clone()),
                title: request.title.clone(),
                message: request.message.clone(),
                kind: request.kind,
                read: false,
                created_at,
            })
            .collect();
        self.tables
            .write()
            .await
            .notifications
            .extend(batch.iter().cloned());
        Ok(batch)
    }

    async fn find_notification(&self, notification_id: &str) -> ServiceResult<Notification> {
        self.begin_read()?;
        self.tables
            .read()
            .await
            .notifications
            .iter()
            .find(|n| n.id == notification_id)
            .cloned()
            .ok_or_else(|| not_found(notification_id))
    }

    async fn notifications_for_user(
        &self,
        user_id: &str,
        page: Page,
    ) -> ServiceResult<NotificationPage> {
        self.begin_read()?;
        let matching: Vec<Notification> = self
            .tables
            .read()
            .await
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        let (notifications, has_more) = page.slice(&matching);

        Ok(NotificationPage {
            notifications,
            total: matching.len(),
            unread: matching.iter().filter(|n| !n.read).count(),
            has_more,
        })
    }

    async fn mark_read(&self, notification_id: &str) -> ServiceResult<Notification> {
        self.ensure_available()?;
        let mut tables = self.tables.write().await;
        let notification = tables
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or_else(|| not_found(notification_id))?;
        notification.read = true;
        Ok(notification.clone())
    }

    async fn delete_notification(&self, notification_id: &str) -> ServiceResult<Notification> {
        self.ensure_available()?;
        let mut tables = self.tables.write().await;
        let index = tables
            .notifications
            .iter()
            .position(|n| n.id == notification_id)
            .ok_or_else(|| not_found(notification_id))?;
        Ok(tables.notifications.remove(index))
    }

    async fn notification_stats(&self, user_id: &str) -> ServiceResult<NotificationStats> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        let (total, unread) = tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .fold((0, 0), |(total, unread), n| {
                (total + 1, unread + usize::from(!n.read))
            });

        Ok(NotificationStats {
            user_id: user_id.to_string(),
            total,
            unread,
        })
    }

    async fn notification_exists(&self, notification_id: &str) -> ServiceResult<bool> {
        self.ensure_available()?;
        Ok(self
            .tables
            .read()
            .await
            .notifications
            .iter()
            .any(|n| n.id == notification_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(user_id: &str) -> SendNotificationRequest {
        SendNotificationRequest {
            user_id: user_id.to_string(),
            title: "Hello".to_string(),
            message: "Welcome".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_mark_read_updates_stats() {
        let domain = InMemoryDomain::new();
        let first = domain.create_notification(&request("u1")).await.unwrap();
        domain.create_notification(&request("u1")).await.unwrap();
        domain.create_notification(&request("u2")).await.unwrap();

        domain.mark_read(&first.id).await.unwrap();

        let stats = domain.notification_stats("u1").await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.unread, 1);
    }

    #[tokio::test]
    async fn test_channel_batch_all_or_nothing() {
        let domain = InMemoryDomain::new();
        let broadcast = ChannelNotificationRequest {
            channel_id: "ch-1".to_string(),
            sender_id: "u1".to_string(),
            title: "Ping".to_string(),
            message: "Meeting".to_string(),
            ..Default::default()
        };
        let recipients = vec!["u2".to_string(), "u3".to_string()];

        let sent = domain
            .create_channel_notifications(&broadcast, &recipients)
            .await
            .unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].channel_id.as_deref(), Some("ch-1"));

        domain.set_unavailable(true);
        assert!(domain
            .create_channel_notifications(&broadcast, &recipients)
            .await
            .is_err());
        domain.set_unavailable(false);
        assert_eq!(domain.notification_stats("u2").await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_listing_newest_first() {
        let domain = InMemoryDomain::new();
        let first = domain.create_notification(&request("u1")).await.unwrap();
        let second = domain.create_notification(&request("u1")).await.unwrap();

        let page = domain
            .notifications_for_user("u1", Page::new(1, 0))
            .await
            .unwrap();

        assert_eq!(page.notifications[0].id, second.id);
        assert!(page.has_more);

        domain.delete_notification(&first.id).await.unwrap();
        assert!(!domain.notification_exists(&first.id).await.unwrap());
    }
}
