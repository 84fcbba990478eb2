//! Domain Use-Case Services
//!
//! One service per entity family. Each owns its own `CacheOrchestrator` and
//! talks to its collaborators through the `domain` traits. Reads go through
//! `CacheOrchestrator::read_through`; writes validate, check permission,
//! mutate, and only then invalidate the patterns listed in the service's
//! static invalidation map.

pub mod analytics;
pub mod channel;
pub mod file;
pub mod message;
pub mod notification;
pub mod user;

use tracing::{info, warn};

use crate::domain::PermissionChecker;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{ReadResponse, WriteResponse};

pub use analytics::{AnalyticsMutation, AnalyticsUseCaseService, ANALYTICS_INVALIDATIONS};
pub use channel::{ChannelMutation, ChannelUseCaseService, CHANNEL_INVALIDATIONS};
pub use file::{FileMutation, FileUseCaseService, FILE_INVALIDATIONS};
pub use message::{MessageMutation, MessageUseCaseService, MESSAGE_INVALIDATIONS};
pub use notification::{
    NotificationMutation, NotificationUseCaseService, NOTIFICATION_INVALIDATIONS,
};
pub use user::{UserMutation, UserUseCaseService, USER_INVALIDATIONS};

// == Shared Helpers ==

/// Turns a request's `validate()` outcome into a result.
pub(crate) fn check(validation: Option<String>) -> ServiceResult<()> {
    match validation {
        Some(reason) => Err(ServiceError::Validation(reason)),
        None => Ok(()),
    }
}

/// Fails with `PermissionDenied` unless the checker allows the operation.
pub(crate) async fn require_permission(
    checker: &dyn PermissionChecker,
    user_id: &str,
    operation: &str,
) -> ServiceResult<()> {
    if checker.has_permission(user_id, operation).await? {
        Ok(())
    } else {
        Err(ServiceError::permission_denied(user_id, operation))
    }
}

/// Wraps a mutation outcome in its envelope, logging either way.
pub(crate) fn write_response<T>(operation: &str, result: ServiceResult<T>) -> WriteResponse<T> {
    match result {
        Ok(payload) => {
            info!("{} succeeded", operation);
            WriteResponse::ok(payload)
        }
        Err(e) => {
            warn!("{} failed: {}", operation, e);
            WriteResponse::failed(&e)
        }
    }
}

/// Failure envelope for a read rejected before touching cache or collaborator.
pub(crate) fn read_rejected<T>(operation: &str, error: ServiceError) -> ReadResponse<T> {
    warn!("{} rejected: {}", operation, error);
    ReadResponse::failed(&error)
}
