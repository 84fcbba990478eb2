//! Domain Collaborators
//!
//! The source of truth behind every use-case service. Services only ever see
//! these traits; `memory::InMemoryDomain` implements all of them for the demo
//! binary and for tests.

pub mod memory;

use async_trait::async_trait;

use crate::error::ServiceResult;
use crate::models::{
    ActivitySnapshot, AnalyticsReport, Channel, ChannelNotificationRequest, ChannelStats,
    ChannelUpdate, ChurnPrediction, CreateChannelRequest, ExportFormat, FileDownload, FileRecord,
    FileStats, FileUpload, FileValidation, Message, MessagePage, MessageStats, Notification,
    NotificationPage, NotificationStats, Page, ProfileUpdate, SearchMessagesRequest,
    SendMessageRequest, SendNotificationRequest, TimeRange, TrackEventRequest, TrackedEvent,
    UploadFileRequest, UserBehavior, UserFilters, UserJourney, UserPage, UserProfile, UserStats,
};

pub use memory::InMemoryDomain;

// == Permissions ==
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    /// Whether `user_id` may perform `operation` (e.g. `"upload_file"`).
    async fn has_permission(&self, user_id: &str, operation: &str) -> ServiceResult<bool>;
}

// == Channels ==
#[async_trait]
pub trait ChannelRepository: Send + Sync {
    async fn create_channel(&self, request: &CreateChannelRequest) -> ServiceResult<Channel>;

    /// `NotFound` when the channel does not exist.
    async fn find_channel(&self, channel_id: &str) -> ServiceResult<Channel>;

    /// Channels the user owns or belongs to.
    async fn channels_for_user(&self, user_id: &str) -> ServiceResult<Vec<Channel>>;

    async fn update_channel(&self, channel_id: &str, updates: &ChannelUpdate)
        -> ServiceResult<Channel>;

    /// `Conflict` when already a member.
    async fn add_member(&self, channel_id: &str, member_id: &str) -> ServiceResult<Channel>;

    /// `NotFound` when not a member; the owner cannot be removed.
    async fn remove_member(&self, channel_id: &str, member_id: &str) -> ServiceResult<Channel>;

    /// Returns the channel as it was before deletion.
    async fn delete_channel(&self, channel_id: &str) -> ServiceResult<Channel>;

    /// Name matches among channels visible to `user_id`.
    async fn search_channels(
        &self,
        query: &str,
        user_id: &str,
        limit: usize,
    ) -> ServiceResult<Vec<Channel>>;

    async fn channel_stats(&self, channel_id: &str) -> ServiceResult<ChannelStats>;
}

// == Messages ==
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn send_message(&self, request: &SendMessageRequest) -> ServiceResult<Message>;

    async fn find_message(&self, message_id: &str) -> ServiceResult<Message>;

    /// Newest first.
    async fn channel_messages(&self, channel_id: &str, page: Page) -> ServiceResult<MessagePage>;

    /// Newest first.
    async fn user_messages(&self, user_id: &str, page: Page) -> ServiceResult<MessagePage>;

    async fn update_message(&self, message_id: &str, content: &str) -> ServiceResult<Message>;

    /// Returns the message as it was before deletion.
    async fn delete_message(&self, message_id: &str) -> ServiceResult<Message>;

    async fn search_messages(&self, request: &SearchMessagesRequest)
        -> ServiceResult<Vec<Message>>;

    async fn message_stats(
        &self,
        channel_id: Option<&str>,
        user_id: Option<&str>,
    ) -> ServiceResult<MessageStats>;

    async fn message_exists(&self, message_id: &str) -> ServiceResult<bool>;
}

// == Users ==
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, user_id: &str) -> ServiceResult<UserProfile>;

    async fn update_user(&self, user_id: &str, updates: &ProfileUpdate)
        -> ServiceResult<UserProfile>;

    async fn search_users(&self, query: &str, limit: usize) -> ServiceResult<Vec<UserProfile>>;

    async fn user_stats(&self, user_id: &str) -> ServiceResult<UserStats>;

    /// `page` is 1-based.
    async fn list_users(
        &self,
        page: usize,
        limit: usize,
        filters: &UserFilters,
    ) -> ServiceResult<UserPage>;

    async fn delete_user(&self, user_id: &str) -> ServiceResult<()>;

    async fn user_exists(&self, user_id: &str) -> ServiceResult<bool>;
}

// == Notifications ==
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create_notification(
        &self,
        request: &SendNotificationRequest,
    ) -> ServiceResult<Notification>;

    /// One notification per recipient, all stored or none.
    async fn create_channel_notifications(
        &self,
        request: &ChannelNotificationRequest,
        recipients: &[String],
    ) -> ServiceResult<Vec<Notification>>;

    async fn find_notification(&self, notification_id: &str) -> ServiceResult<Notification>;

    /// Newest first.
    async fn notifications_for_user(
        &self,
        user_id: &str,
        page: Page,
    ) -> ServiceResult<NotificationPage>;

    async fn mark_read(&self, notification_id: &str) -> ServiceResult<Notification>;

    /// Returns the notification as it was before deletion.
    async fn delete_notification(&self, notification_id: &str) -> ServiceResult<Notification>;

    async fn notification_stats(&self, user_id: &str) -> ServiceResult<NotificationStats>;

    async fn notification_exists(&self, notification_id: &str) -> ServiceResult<bool>;
}

// == Files ==
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Checks type and size against what the store accepts.
    async fn validate_file(&self, file: &FileUpload) -> ServiceResult<FileValidation>;

    async fn upload_file(&self, request: &UploadFileRequest) -> ServiceResult<FileRecord>;

    async fn find_file(&self, file_id: &str) -> ServiceResult<FileRecord>;

    async fn download_link(&self, file_id: &str) -> ServiceResult<FileDownload>;

    async fn file_stats(
        &self,
        channel_id: Option<&str>,
        user_id: Option<&str>,
    ) -> ServiceResult<FileStats>;

    async fn file_exists(&self, file_id: &str) -> ServiceResult<bool>;

    fn supported_file_types(&self) -> Vec<String>;

    fn max_file_size(&self) -> u64;
}

// == Analytics ==
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    async fn record_event(&self, request: &TrackEventRequest) -> ServiceResult<TrackedEvent>;

    async fn report(&self, range: &TimeRange) -> ServiceResult<AnalyticsReport>;

    async fn user_behavior(&self, user_id: &str, range: &TimeRange)
        -> ServiceResult<UserBehavior>;

    async fn real_time_activity(&self) -> ServiceResult<ActivitySnapshot>;

    async fn user_journey(&self, user_id: &str) -> ServiceResult<UserJourney>;

    async fn churn_prediction(&self, user_id: &str) -> ServiceResult<ChurnPrediction>;

    async fn export_events(&self, format: ExportFormat) -> ServiceResult<String>;
}
