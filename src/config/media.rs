use std::env;
use std::path::PathBuf;

use super::env_or;

/// Where uploaded images live and how their URLs are built.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub media_root: PathBuf,
    /// Overrides the request-derived base URL (e.g. behind a proxy).
    pub public_base_url: Option<String>,
    pub max_upload_bytes: usize,
}

impl MediaConfig {
    pub fn from_env() -> Self {
        let media_root = env::var("MEDIA_ROOT").unwrap_or_else(|_| "./media".to_string());
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        Self {
            media_root: PathBuf::from(media_root),
            public_base_url,
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", 5 * 1024 * 1024),
        }
    }
}
