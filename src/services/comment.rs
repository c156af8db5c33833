use crate::{
    error::{AppError, AppResult},
    models::{comment, profile, user, Comment, CommentModel, Post},
    presentation::{comment_detail, CommentDetail},
    services::post::{ensure_visible, visible_to},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
};

#[derive(Debug, Clone, FromQueryResult)]
pub struct CommentRow {
    pub id: i32,
    pub post_id: i32,
    pub author_id: i32,
    pub author_username: String,
    pub author_photo: Option<String>,
    pub content: String,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

pub struct CommentService {
    db: DatabaseConnection,
}

impl CommentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Comments joined with their author, restricted to posts `viewer` can see.
    fn detail_query(viewer: Option<i32>) -> Select<Comment> {
        Comment::find()
            .select_only()
            .columns([
                comment::Column::Id,
                comment::Column::PostId,
                comment::Column::AuthorId,
                comment::Column::Content,
                comment::Column::CreatedAt,
                comment::Column::UpdatedAt,
            ])
            .column_as(user::Column::Username, "author_username")
            .column_as(profile::Column::Photo, "author_photo")
            .join(JoinType::InnerJoin, comment::Relation::Author.def())
            .join(JoinType::LeftJoin, user::Relation::Profile.def())
            .join(JoinType::InnerJoin, comment::Relation::Post.def())
            .filter(visible_to(viewer))
    }

    /// Comments oldest first, optionally narrowed to one post.
    pub async fn list(
        &self,
        viewer: Option<i32>,
        post_id: Option<i32>,
        base_url: &str,
        page: u64,
        page_size: u64,
    ) -> AppResult<(Vec<CommentDetail>, u64)> {
        let mut query = Self::detail_query(viewer);
        if let Some(post_id) = post_id {
            query = query.filter(comment::Column::PostId.eq(post_id));
        }

        let paginator = query
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .into_model::<CommentRow>()
            .paginate(&self.db, page_size);

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        let items = rows
            .into_iter()
            .map(|row| comment_detail(row, base_url))
            .collect();
        Ok((items, total))
    }

    pub async fn get_detail(
        &self,
        id: i32,
        viewer: Option<i32>,
        base_url: &str,
    ) -> AppResult<CommentDetail> {
        let row = Self::detail_query(viewer)
            .filter(comment::Column::Id.eq(id))
            .into_model::<CommentRow>()
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(comment_detail(row, base_url))
    }

    async fn get_by_id(&self, id: i32) -> AppResult<CommentModel> {
        Comment::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(&self, author_id: i32, post_id: i32, content: &str) -> AppResult<CommentModel> {
        let post = Post::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        ensure_visible(&post, Some(author_id))?;

        let now = chrono::Utc::now().naive_utc();
        let new_comment = comment::ActiveModel {
            post_id: Set(post_id),
            author_id: Set(author_id),
            content: Set(content.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let comment = new_comment.insert(&self.db).await?;
        Ok(comment)
    }

    /// Loads a comment for a write by `user_id`: NotFound when its post is
    /// hidden from the user, Forbidden when the user did not write it.
    async fn owned_by(&self, id: i32, user_id: i32) -> AppResult<CommentModel> {
        let existing = self.get_by_id(id).await?;
        let post = Post::find_by_id(existing.post_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        ensure_visible(&post, Some(user_id))?;

        if existing.author_id != user_id {
            return Err(AppError::Forbidden);
        }
        Ok(existing)
    }

    pub async fn update(&self, id: i32, user_id: i32, content: &str) -> AppResult<CommentModel> {
        let existing = self.owned_by(id, user_id).await?;

        let mut active: comment::ActiveModel = existing.into();
        active.content = Set(content.to_string());
        active.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: i32, user_id: i32) -> AppResult<()> {
        self.owned_by(id, user_id).await?;
        Comment::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn detail_query_keeps_authors_without_profile() {
        let sql = CommentService::detail_query(None)
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains(r#"INNER JOIN "users""#), "{sql}");
        assert!(sql.contains(r#"LEFT JOIN "profiles""#), "{sql}");
        assert!(sql.contains(r#""author_photo""#), "{sql}");
    }

    #[test]
    fn detail_query_hides_comments_on_foreign_drafts() {
        let sql = CommentService::detail_query(Some(9))
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains(r#"INNER JOIN "posts""#), "{sql}");
        assert!(
            sql.contains(r#""posts"."published" = TRUE OR "posts"."author_id" = 9"#),
            "{sql}"
        );
    }
}
