//! File use cases
//!
//! Key layout:
//! - `file:info:{file}`
//! - `file:download:{file}`
//! - `file:stats:{channel}:{user}`, an absent scope being an empty segment

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{FileRepository, PermissionChecker};
use crate::error::ServiceError;
use crate::models::{
    FileDownload, FileRecord, FileStats, FileStatsRequest, FileUpload, FileValidation,
    ReadResponse, ServiceCacheStats, UploadFileRequest, WriteResponse,
};
use crate::orchestrator::{CacheKey, CacheOrchestrator, DataCategory, InvalidationMap};
use crate::services::{check, read_rejected, require_permission, write_response};

pub const NAMESPACE: &str = "file";
const SERVICE: &str = "FileUseCaseService";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMutation {
    Upload,
}

/// Any upload can change any scoped stats view, so the whole family goes.
pub static FILE_INVALIDATIONS: InvalidationMap<FileMutation> =
    InvalidationMap::new(&[(FileMutation::Upload, &["file:stats"])]);

pub struct FileUseCaseService {
    cache: CacheOrchestrator,
    files: Arc<dyn FileRepository>,
    permissions: Arc<dyn PermissionChecker>,
}

impl FileUseCaseService {
    pub fn new(
        cache: CacheOrchestrator,
        files: Arc<dyn FileRepository>,
        permissions: Arc<dyn PermissionChecker>,
    ) -> Self {
        Self {
            cache,
            files,
            permissions,
        }
    }

    // == Writes ==

    /// Permission first, then the collaborator's content rules, then upload.
    pub async fn upload_file(&self, request: &UploadFileRequest) -> WriteResponse<FileRecord> {
        let result = async {
            check(request.validate())?;
            require_permission(self.permissions.as_ref(), &request.sender_id, "upload_file")
                .await?;
            let validation = self.files.validate_file(&request.file).await?;
            if !validation.is_valid {
                let reason = validation
                    .error
                    .unwrap_or_else(|| "File failed validation".to_string());
                return Err(ServiceError::Validation(reason));
            }
            let record = self.files.upload_file(request).await?;
            let patterns = FILE_INVALIDATIONS.patterns_for(FileMutation::Upload, &[]);
            self.cache.invalidate_patterns(&patterns).await;
            Ok::<_, ServiceError>(record)
        }
        .await;
        write_response("upload_file", result)
    }

    // == Reads ==

    pub async fn download_file(&self, file_id: &str) -> ReadResponse<FileDownload> {
        if file_id.trim().is_empty() {
            return read_rejected("download_file", missing_file());
        }
        let key = CacheKey::new(NAMESPACE).with("download").with(file_id);
        self.cache
            .read_through(&key, DataCategory::FileDownload, || {
                self.files.download_link(file_id)
            })
            .await
    }

    pub async fn get_file(&self, file_id: &str) -> ReadResponse<FileRecord> {
        if file_id.trim().is_empty() {
            return read_rejected("get_file", missing_file());
        }
        let key = CacheKey::new(NAMESPACE).with("info").with(file_id);
        self.cache
            .read_through(&key, DataCategory::FileInfo, || self.files.find_file(file_id))
            .await
    }

    pub async fn get_file_stats(&self, request: &FileStatsRequest) -> ReadResponse<FileStats> {
        let channel_id = request.channel_id.as_deref().filter(|c| !c.is_empty());
        let user_id = request.user_id.as_deref().filter(|u| !u.is_empty());
        let key = CacheKey::new(NAMESPACE)
            .with("stats")
            .with(channel_id.unwrap_or_default())
            .with(user_id.unwrap_or_default());
        self.cache
            .read_through(&key, DataCategory::FileStats, || {
                self.files.file_stats(channel_id, user_id)
            })
            .await
    }

    /// Uncached pre-flight check.
    pub async fn validate_file(&self, file: &FileUpload) -> ReadResponse<FileValidation> {
        match self.files.validate_file(file).await {
            Ok(validation) => {
                debug!(
                    "Validated {} ({}): {}",
                    file.file_name, file.mime_type, validation.is_valid
                );
                ReadResponse::fresh(validation)
            }
            Err(e) => read_rejected("validate_file", e),
        }
    }

    pub fn supported_file_types(&self) -> Vec<String> {
        self.files.supported_file_types()
    }

    pub fn max_file_size(&self) -> u64 {
        self.files.max_file_size()
    }

    /// Uncached; failures read as absent.
    pub async fn file_exists(&self, file_id: &str) -> bool {
        match self.files.file_exists(file_id).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!("Existence check for file {} failed: {}", file_id, e);
                false
            }
        }
    }

    pub async fn get_file_cache_stats(&self) -> ServiceCacheStats {
        ServiceCacheStats::new(SERVICE, NAMESPACE, self.cache.get_cache_stats().await)
    }
}

fn missing_file() -> ServiceError {
    ServiceError::Validation("File ID is required".to_string())
}
