//! Domain payloads, request DTOs and response envelopes
//!
//! Requests carry a `validate()` that runs before any collaborator or cache
//! call; payloads are what the collaborators return and what gets cached.

pub mod analytics;
pub mod channel;
pub mod file;
pub mod message;
pub mod notification;
pub mod responses;
pub mod user;

// Re-export commonly used types
pub use analytics::{
    ActivitySnapshot, AnalyticsReport, ChurnPrediction, ExportFormat, TimeRange, TrackEventRequest,
    TrackedEvent, UserBehavior, UserJourney,
};
pub use channel::{
    Channel, ChannelKind, ChannelStats, ChannelUpdate, CreateChannelRequest, MemberRequest,
    UpdateChannelRequest,
};
pub use file::{
    FileDownload, FileRecord, FileStats, FileStatsRequest, FileUpload, FileValidation,
    UploadFileRequest,
};
pub use message::{
    DeleteMessageRequest, Message, MessageKind, MessagePage, MessageStats, Page,
    SearchMessagesRequest, SendMessageRequest, UpdateMessageRequest,
};
pub use notification::{
    ChannelNotificationRequest, Notification, NotificationActionRequest, NotificationKind,
    NotificationPage, NotificationStats, SendNotificationRequest,
};
pub use responses::{CacheStatsSnapshot, ReadResponse, ServiceCacheStats, WriteResponse};
pub use user::{
    ProfileUpdate, UpdateProfileRequest, UserFilters, UserPage, UserProfile, UserStats, UserStatus,
};
