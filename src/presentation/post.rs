use super::{format_timestamp, media_url, CategoryDetail, OrNull};
use crate::services::post::PostRow;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthorSummary {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PostDetail {
    pub id: i32,
    pub title: String,
    pub content: String,
    /// Absolute URL or `"null"`
    #[schema(value_type = String)]
    pub image: OrNull<String>,
    /// `DD.MM.YYYY, HH:MM`
    pub created_at: String,
    pub updated_at: String,
    pub published: bool,
    pub view_count: i32,
    pub like_count: i32,
    pub author: AuthorSummary,
    /// Absolute URL or `"null"`
    #[schema(value_type = String)]
    pub author_photo: OrNull<String>,
    /// `{id, name}` or `"null"`
    #[schema(value_type = Object)]
    pub category: OrNull<CategoryDetail>,
}

pub fn post_detail(row: PostRow, base_url: &str) -> PostDetail {
    let category = match (row.category_id, row.category_name) {
        (Some(id), Some(name)) => OrNull::Value(CategoryDetail { id, name }),
        _ => OrNull::Null,
    };

    PostDetail {
        id: row.id,
        title: row.title,
        content: row.content,
        image: media_url(base_url, row.image.as_deref()),
        created_at: format_timestamp(&row.created_at),
        updated_at: format_timestamp(&row.updated_at),
        published: row.published,
        view_count: row.view_count,
        like_count: row.like_count,
        author: AuthorSummary {
            id: row.author_id,
            name: row.author_username,
        },
        author_photo: media_url(base_url, row.author_photo.as_deref()),
        category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn row() -> PostRow {
        let created = NaiveDate::from_ymd_opt(2024, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        PostRow {
            id: 5,
            title: "Hello".into(),
            content: "World".into(),
            image: Some("posts/cover.png".into()),
            published: true,
            view_count: 3,
            like_count: 1,
            created_at: created,
            updated_at: created,
            author_id: 9,
            author_username: "alice".into(),
            author_photo: None,
            category_id: Some(2),
            category_name: Some("Rust".into()),
        }
    }

    #[test]
    fn maps_full_row() {
        let view = post_detail(row(), "http://localhost:3000");
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["image"], json!("http://localhost:3000/media/posts/cover.png"));
        assert_eq!(value["created_at"], json!("31.12.2024, 23:59"));
        assert_eq!(value["author"], json!({"id": 9, "name": "alice"}));
        assert_eq!(value["author_photo"], json!("null"));
        assert_eq!(value["category"], json!({"id": 2, "name": "Rust"}));
        assert_eq!(value["view_count"], json!(3));
        assert_eq!(value["like_count"], json!(1));
    }

    #[test]
    fn missing_category_and_image_render_null_strings() {
        let mut r = row();
        r.category_id = None;
        r.category_name = None;
        r.image = None;
        let value = serde_json::to_value(post_detail(r, "http://h")).unwrap();
        assert_eq!(value["category"], json!("null"));
        assert_eq!(value["image"], json!("null"));
    }
}
