use async_trait::async_trait;
use chrono::{Duration, Utc};

use super::InMemoryDomain;
use crate::domain::FileRepository;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    FileDownload, FileRecord, FileStats, FileUpload, FileValidation, UploadFileRequest,
};

/// MIME types the in-memory store accepts.
pub const SUPPORTED_FILE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "video/mp4",
    "audio/mpeg",
    "application/pdf",
    "text/plain",
];

/// 50 MiB
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// How long a download link stays valid.
const DOWNLOAD_LINK_MINUTES: i64 = 15;

fn not_found(file_id: &str) -> ServiceError {
    ServiceError::NotFound(format!("file {}", file_id))
}

fn check(file: &FileUpload) -> FileValidation {
    if file.size_bytes == 0 {
        return FileValidation::invalid("File is empty");
    }
    if file.size_bytes > MAX_FILE_SIZE {
        return FileValidation::invalid(format!(
            "File exceeds maximum size of {} bytes",
            MAX_FILE_SIZE
        ));
    }
    if !SUPPORTED_FILE_TYPES.contains(&file.mime_type.as_str()) {
        return FileValidation::invalid(format!("Unsupported file type: {}", file.mime_type));
    }
    FileValidation::valid()
}

#[async_trait]
impl FileRepository for InMemoryDomain {
    async fn validate_file(&self, file: &FileUpload) -> ServiceResult<FileValidation> {
        self.ensure_available()?;
        Ok(check(file))
    }

    async fn upload_file(&self, request: &UploadFileRequest) -> ServiceResult<FileRecord> {
        self.ensure_available()?;
        if let Some(reason) = check(&request.file).error {
            return Err(ServiceError::Validation(reason));
        }

        let id = self.next_id("file");
        let record = FileRecord {
            url: format!("memory://files/{}/{}", id, request.file.file_name),
            id,
            file_name: request.file.file_name.clone(),
            mime_type: request.file.mime_type.clone(),
            size_bytes: request.file.size_bytes,
            channel_id: request.channel_id.clone(),
            sender_id: request.sender_id.clone(),
            uploaded_at: Utc::now(),
        };
        self.tables
            .write()
            .await
            .files
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn find_file(&self, file_id: &str) -> ServiceResult<FileRecord> {
        self.begin_read()?;
        self.tables
            .read()
            .await
            .files
            .get(file_id)
            .cloned()
            .ok_or_else(|| not_found(file_id))
    }

    async fn download_link(&self, file_id: &str) -> ServiceResult<FileDownload> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        let record = tables.files.get(file_id).ok_or_else(|| not_found(file_id))?;

        Ok(FileDownload {
            file_id: record.id.clone(),
            file_name: record.file_name.clone(),
            mime_type: record.mime_type.clone(),
            download_url: format!("{}?download=1", record.url),
            expires_at: Utc::now() + Duration::minutes(DOWNLOAD_LINK_MINUTES),
        })
    }

    async fn file_stats(
        &self,
        channel_id: Option<&str>,
        user_id: Option<&str>,
    ) -> ServiceResult<FileStats> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        let mut stats = FileStats::default();
        for record in tables.files.values().filter(|f| {
            channel_id.map_or(true, |c| f.channel_id == c)
                && user_id.map_or(true, |u| f.sender_id == u)
        }) {
            stats.total_files += 1;
            stats.total_bytes += record.size_bytes;
            *stats.by_mime_type.entry(record.mime_type.clone()).or_insert(0) += 1;
        }
        Ok(stats)
    }

    async fn file_exists(&self, file_id: &str) -> ServiceResult<bool> {
        self.ensure_available()?;
        Ok(self.tables.read().await.files.contains_key(file_id))
    }

    fn supported_file_types(&self) -> Vec<String> {
        SUPPORTED_FILE_TYPES.iter().map(|t| t.to_string()).collect()
    }

    fn max_file_size(&self) -> u64 {
        MAX_FILE_SIZE
    }
}
