use crate::error::{AppError, AppResult};
use axum::{body::Bytes, extract::Multipart};

/// A file pulled out of a multipart body.
pub struct UploadedImage {
    pub data: Bytes,
    pub content_type: String,
}

/// Read the part named `field` from a multipart form. Other parts are
/// skipped.
pub async fn read_image_field(multipart: &mut Multipart, field: &str) -> AppResult<UploadedImage> {
    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::field(field, format!("Failed to read upload: {}", e)))?
    {
        if part.name() != Some(field) {
            continue;
        }

        let content_type = part
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let data = part
            .bytes()
            .await
            .map_err(|e| AppError::field(field, format!("Failed to read file data: {}", e)))?;

        return Ok(UploadedImage { data, content_type });
    }

    Err(AppError::field(field, "No file was submitted."))
}
