use crate::{
    error::{AppError, AppResult},
    models::{post, post_like, Post, PostLike},
    services::post::ensure_visible,
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    Liked,
    Unliked,
}

impl LikeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LikeState::Liked => "Liked",
            LikeState::Unliked => "Unliked",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeToggle {
    pub state: LikeState,
    pub like_count: i32,
}

pub struct LikeService {
    db: DatabaseConnection,
}

impl LikeService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Flip the caller's like on a post and move `like_count` with it.
    ///
    /// Runs in one transaction with the post row locked, so toggles from
    /// different users never lose an update of the counter.
    pub async fn toggle(&self, post_id: i32, user_id: i32) -> AppResult<LikeToggle> {
        let txn = self.db.begin().await?;

        let post = Post::find_by_id(post_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        ensure_visible(&post, Some(user_id))?;

        let existing = PostLike::find()
            .filter(post_like::Column::PostId.eq(post_id))
            .filter(post_like::Column::UserId.eq(user_id))
            .one(&txn)
            .await?;

        let (state, delta) = match existing {
            Some(like) => {
                PostLike::delete_by_id(like.id).exec(&txn).await?;
                (LikeState::Unliked, -1)
            }
            None => {
                post_like::ActiveModel {
                    post_id: Set(post_id),
                    user_id: Set(user_id),
                    created_at: Set(chrono::Utc::now().naive_utc()),
                    ..Default::default()
                }
                .insert(&txn)
                .await
                .map_err(|e| AppError::from_unique_violation(e, "Like already recorded"))?;
                (LikeState::Liked, 1)
            }
        };

        Post::update_many()
            .col_expr(
                post::Column::LikeCount,
                Expr::col(post::Column::LikeCount).add(delta),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        tracing::debug!("User {} {} post {}", user_id, state.as_str(), post_id);

        Ok(LikeToggle {
            state,
            like_count: post.like_count + delta,
        })
    }
}
