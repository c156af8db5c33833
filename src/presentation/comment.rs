use super::{format_timestamp, media_url, OrNull};
use crate::services::comment::CommentRow;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CommentDetail {
    pub id: i32,
    /// Post id
    pub post: i32,
    /// Author username
    pub author: String,
    #[schema(value_type = String)]
    pub author_photo: OrNull<String>,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

pub fn comment_detail(row: CommentRow, base_url: &str) -> CommentDetail {
    CommentDetail {
        id: row.id,
        post: row.post_id,
        author: row.author_username,
        author_photo: media_url(base_url, row.author_photo.as_deref()),
        content: row.content,
        created_at: format_timestamp(&row.created_at),
        updated_at: format_timestamp(&row.updated_at),
    }
}
