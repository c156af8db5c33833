use crate::{
    config::media::MediaConfig,
    error::{AppError, AppResult},
};
use std::path::{Component, Path};
use tokio::fs;
use uuid::Uuid;

const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Media subdirectory for post images.
pub const POST_IMAGE_DIR: &str = "posts";

/// Media subdirectory for profile photos, bucketed by upload date.
pub fn profile_photo_dir(today: chrono::NaiveDate) -> String {
    format!("users/{}", today.format("%Y/%m/%d"))
}

/// Validate file magic bytes match the declared content type.
fn validate_magic_bytes(data: &[u8], content_type: &str) -> bool {
    match content_type {
        "image/jpeg" => data.len() >= 3 && data[..3] == [0xFF, 0xD8, 0xFF],
        "image/png" => data.len() >= 4 && data[..4] == [0x89, 0x50, 0x4E, 0x47],
        "image/gif" => data.len() >= 4 && data[..4] == [0x47, 0x49, 0x46, 0x38],
        "image/webp" => {
            data.len() >= 12
                && data[..4] == [0x52, 0x49, 0x46, 0x46]
                && data[8..12] == [0x57, 0x45, 0x42, 0x50]
        }
        _ => false,
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Checks an upload without touching the disk and returns its file extension.
pub fn check_image(
    config: &MediaConfig,
    field: &str,
    data: &[u8],
    content_type: &str,
) -> AppResult<&'static str> {
    if data.len() > config.max_upload_bytes {
        return Err(AppError::PayloadTooLarge);
    }

    if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
        return Err(AppError::field(
            field,
            format!(
                "Unsupported file type: {}. Allowed: jpeg, png, gif, webp",
                content_type
            ),
        ));
    }

    if !validate_magic_bytes(data, content_type) {
        return Err(AppError::field(
            field,
            "File content does not match declared content type",
        ));
    }

    extension_for(content_type).ok_or_else(|| AppError::field(field, "Unsupported file type"))
}

pub struct UploadService;

impl UploadService {
    /// Save an uploaded image under the media root.
    /// Returns the path relative to the media root (e.g. `posts/uuid.jpg`),
    /// which is what gets stored on the row.
    pub async fn save_image(
        config: &MediaConfig,
        field: &str,
        data: &[u8],
        content_type: &str,
        subdirectory: &str,
    ) -> AppResult<String> {
        let ext = check_image(config, field, data, content_type)?;

        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        let dir = config.media_root.join(subdirectory);

        fs::create_dir_all(&dir)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create media directory {:?}: {}", dir, e))?;

        let file_path = dir.join(&filename);
        fs::write(&file_path, data)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", file_path, e))?;

        tracing::debug!("Stored upload at {:?}", file_path);
        Ok(format!("{}/{}", subdirectory.trim_matches('/'), filename))
    }

    /// Best-effort removal of a previously stored file.
    pub async fn remove(config: &MediaConfig, relative: &str) {
        let relative = relative.trim_start_matches('/');
        let escapes_root = Path::new(relative)
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        if relative.is_empty() || escapes_root {
            return;
        }
        let path = config.media_root.join(relative);
        if let Err(e) = fs::remove_file(&path).await {
            tracing::warn!("Could not remove old media file {:?}: {}", path, e);
        }
    }

    pub async fn remove_all(config: &MediaConfig, paths: &[String]) {
        for relative in paths {
            Self::remove(config, relative).await;
        }
    }
}
