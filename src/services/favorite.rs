use crate::{
    error::{AppError, AppResult},
    models::{favorite, post, Favorite, Post},
    presentation::{post_detail, PostDetail},
    services::post::{ensure_visible, visible_to, PostRow, PostService},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteState {
    Added,
    Removed,
}

impl FavoriteState {
    pub fn message(&self) -> &'static str {
        match self {
            FavoriteState::Added => "Added to favorites",
            FavoriteState::Removed => "Removed from favorites",
        }
    }
}

pub struct FavoriteService {
    db: DatabaseConnection,
}

impl FavoriteService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Toggle favorite: if exists -> delete, if not -> create.
    pub async fn toggle(&self, post_id: i32, user_id: i32) -> AppResult<FavoriteState> {
        let post = Post::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        ensure_visible(&post, Some(user_id))?;

        let existing = Favorite::find()
            .filter(favorite::Column::PostId.eq(post_id))
            .filter(favorite::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        match existing {
            Some(fav) => {
                Favorite::delete_by_id(fav.id).exec(&self.db).await?;
                Ok(FavoriteState::Removed)
            }
            None => {
                favorite::ActiveModel {
                    post_id: Set(post_id),
                    user_id: Set(user_id),
                    created_at: Set(chrono::Utc::now().naive_utc()),
                    ..Default::default()
                }
                .insert(&self.db)
                .await
                .map_err(|e| AppError::from_unique_violation(e, "Already in favorites"))?;
                Ok(FavoriteState::Added)
            }
        }
    }

    /// Favorites of `user_id` whose post the user can still see. Drafts
    /// that were favorited before being unpublished drop out.
    fn listed_favorites(user_id: i32) -> Select<Favorite> {
        Favorite::find()
            .join(JoinType::InnerJoin, favorite::Relation::Post.def())
            .filter(favorite::Column::UserId.eq(user_id))
            .filter(visible_to(Some(user_id)))
    }

    /// The user's favorited posts, most recently favorited first.
    pub async fn list_user_favorites(
        &self,
        user_id: i32,
        base_url: &str,
        page: u64,
        page_size: u64,
    ) -> AppResult<(Vec<PostDetail>, u64)> {
        let paginator = Self::listed_favorites(user_id)
            .order_by_desc(favorite::Column::CreatedAt)
            .order_by_desc(favorite::Column::Id)
            .paginate(&self.db, page_size);

        let total = paginator.num_items().await?;
        let favorites = paginator.fetch_page(page.saturating_sub(1)).await?;

        let post_ids: Vec<i32> = favorites.iter().map(|f| f.post_id).collect();
        if post_ids.is_empty() {
            return Ok((vec![], total));
        }

        let rows = PostService::feed_query()
            .filter(post::Column::Id.is_in(post_ids.clone()))
            .filter(visible_to(Some(user_id)))
            .into_model::<PostRow>()
            .all(&self.db)
            .await?;

        // Reorder rows to match favorite order
        let mut by_id: HashMap<i32, PostRow> = rows.into_iter().map(|r| (r.id, r)).collect();
        let ordered = post_ids
            .into_iter()
            .filter_map(|id| by_id.remove(&id))
            .map(|row| post_detail(row, base_url))
            .collect();

        Ok((ordered, total))
    }
}
