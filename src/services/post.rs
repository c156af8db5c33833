use crate::{
    error::{AppError, AppResult},
    models::{category, comment, favorite, post, post_like, post_view, profile, user},
    models::{Category, Comment, Favorite, Post, PostLike, PostModel, PostView},
    presentation::{post_detail, PostDetail},
};
use sea_orm::{
    sea_query::Condition, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Select, Set, TransactionTrait,
};

/// One row of the post feed: the post plus its author, the author's photo
/// and the category name.
#[derive(Debug, Clone, FromQueryResult)]
pub struct PostRow {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub published: bool,
    pub view_count: i32,
    pub like_count: i32,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
    pub author_id: i32,
    pub author_username: String,
    pub author_photo: Option<String>,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category_id: Option<i32>,
    pub published: bool,
}

/// Partial update. `category_id: Some(None)` clears the category.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category_id: Option<Option<i32>>,
    pub published: Option<bool>,
}

/// Published posts, plus the viewer's own drafts.
pub(crate) fn visible_to(viewer: Option<i32>) -> Condition {
    let cond = Condition::any().add(post::Column::Published.eq(true));
    match viewer {
        Some(user_id) => cond.add(post::Column::AuthorId.eq(user_id)),
        None => cond,
    }
}

fn is_visible(published: bool, author_id: i32, viewer: Option<i32>) -> bool {
    published || viewer == Some(author_id)
}

fn can_see(row: &PostRow, viewer: Option<i32>) -> bool {
    is_visible(row.published, row.author_id, viewer)
}

/// A draft does not exist for anyone but its author.
pub(crate) fn ensure_visible(post: &PostModel, viewer: Option<i32>) -> AppResult<()> {
    if is_visible(post.published, post.author_id, viewer) {
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}

pub struct PostService {
    db: DatabaseConnection,
}

impl PostService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The single query behind both the list and the detail endpoints.
    /// Category and profile are LEFT JOINed so posts without either still show up.
    pub fn feed_query() -> Select<Post> {
        Post::find()
            .select_only()
            .columns([
                post::Column::Id,
                post::Column::Title,
                post::Column::Content,
                post::Column::Image,
                post::Column::Published,
                post::Column::ViewCount,
                post::Column::LikeCount,
                post::Column::CreatedAt,
                post::Column::UpdatedAt,
                post::Column::AuthorId,
                post::Column::CategoryId,
            ])
            .column_as(user::Column::Username, "author_username")
            .column_as(profile::Column::Photo, "author_photo")
            .column_as(category::Column::Name, "category_name")
            .join(JoinType::InnerJoin, post::Relation::Author.def())
            .join(JoinType::LeftJoin, post::Relation::Category.def())
            .join(JoinType::LeftJoin, user::Relation::Profile.def())
    }

    pub async fn list_feed(
        &self,
        viewer: Option<i32>,
        base_url: &str,
        page: u64,
        page_size: u64,
    ) -> AppResult<(Vec<PostDetail>, u64)> {
        let paginator = Self::feed_query()
            .filter(visible_to(viewer))
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .into_model::<PostRow>()
            .paginate(&self.db, page_size);

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        let items = rows
            .into_iter()
            .map(|row| post_detail(row, base_url))
            .collect();
        Ok((items, total))
    }

    pub async fn feed_detail(
        &self,
        id: i32,
        viewer: Option<i32>,
        base_url: &str,
    ) -> AppResult<PostDetail> {
        let row = Self::feed_query()
            .filter(post::Column::Id.eq(id))
            .into_model::<PostRow>()
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        if !can_see(&row, viewer) {
            return Err(AppError::NotFound);
        }
        Ok(post_detail(row, base_url))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<PostModel> {
        Post::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Loads the post, or `Forbidden` if `user_id` is not its author.
    pub async fn ensure_author(&self, id: i32, user_id: i32) -> AppResult<PostModel> {
        let existing = self.get_by_id(id).await?;
        if existing.author_id != user_id {
            return Err(AppError::Forbidden);
        }
        Ok(existing)
    }

    async fn ensure_category(&self, category_id: Option<i32>) -> AppResult<()> {
        if let Some(id) = category_id {
            Category::find_by_id(id)
                .one(&self.db)
                .await?
                .ok_or_else(|| {
                    AppError::field(
                        "category",
                        format!("Invalid pk \"{}\" - object does not exist.", id),
                    )
                })?;
        }
        Ok(())
    }

    pub async fn create(&self, author_id: i32, input: NewPost) -> AppResult<PostModel> {
        self.ensure_category(input.category_id).await?;

        let now = chrono::Utc::now().naive_utc();
        let new_post = post::ActiveModel {
            author_id: Set(author_id),
            category_id: Set(input.category_id),
            title: Set(input.title),
            content: Set(input.content),
            published: Set(input.published),
            view_count: Set(0),
            like_count: Set(0),
            image: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let post = new_post.insert(&self.db).await?;
        tracing::info!("Post {} created by user {}", post.id, author_id);
        Ok(post)
    }

    /// Counters are not part of `PostChanges`; only the interaction
    /// services move them.
    pub async fn update(&self, id: i32, user_id: i32, changes: PostChanges) -> AppResult<PostModel> {
        let existing = self.ensure_author(id, user_id).await?;
        if let Some(category_id) = changes.category_id {
            self.ensure_category(category_id).await?;
        }

        let mut active: post::ActiveModel = existing.into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(content) = changes.content {
            active.content = Set(content);
        }
        if let Some(category_id) = changes.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(published) = changes.published {
            active.published = Set(published);
        }
        active.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Stores a new image path on the post and returns the one it replaced.
    pub async fn set_image(
        &self,
        id: i32,
        user_id: i32,
        image: String,
    ) -> AppResult<Option<String>> {
        let existing = self.ensure_author(id, user_id).await?;

        let previous = existing.image.clone();
        let mut active: post::ActiveModel = existing.into();
        active.image = Set(Some(image));
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        active.update(&self.db).await?;
        Ok(previous)
    }

    /// Returns the deleted row so the caller can clean up its image.
    pub async fn delete(&self, id: i32, user_id: i32) -> AppResult<PostModel> {
        let existing = self.ensure_author(id, user_id).await?;

        let txn = self.db.begin().await?;
        delete_post_with_dependents(&txn, id).await?;
        txn.commit().await?;

        tracing::info!("Post {} deleted by user {}", id, user_id);
        Ok(existing)
    }
}

/// Deletion hook for a post: comments, favorites, likes and views go first,
/// then the post row. Runs on whatever connection or transaction it is given.
pub(crate) async fn delete_post_with_dependents<C: ConnectionTrait>(
    conn: &C,
    post_id: i32,
) -> AppResult<()> {
    Comment::delete_many()
        .filter(comment::Column::PostId.eq(post_id))
        .exec(conn)
        .await?;
    Favorite::delete_many()
        .filter(favorite::Column::PostId.eq(post_id))
        .exec(conn)
        .await?;
    PostLike::delete_many()
        .filter(post_like::Column::PostId.eq(post_id))
        .exec(conn)
        .await?;
    PostView::delete_many()
        .filter(post_view::Column::PostId.eq(post_id))
        .exec(conn)
        .await?;
    Post::delete_by_id(post_id).exec(conn).await?;
    Ok(())
}
