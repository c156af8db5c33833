use crate::{
    error::{AppError, AppResult},
    models::{post, post_view, Post, PostView},
    services::post::ensure_visible,
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewOutcome {
    /// First view by this user; carries the new count.
    Counted(i32),
    /// The user had already viewed the post; count unchanged.
    AlreadyViewed(i32),
    /// Anonymous caller, nothing recorded.
    Skipped,
}

impl ViewOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            ViewOutcome::Counted(_) => "OK",
            ViewOutcome::AlreadyViewed(_) => "Already viewed",
            ViewOutcome::Skipped => "Skipped",
        }
    }

    pub fn view_count(&self) -> Option<i32> {
        match self {
            ViewOutcome::Counted(n) | ViewOutcome::AlreadyViewed(n) => Some(*n),
            ViewOutcome::Skipped => None,
        }
    }
}

pub struct ViewService {
    db: DatabaseConnection,
}

impl ViewService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Counts the first view of `post_id` by `user_id`. Later views by the
    /// same user are no-ops.
    ///
    /// The post row is locked before the existence check, so two concurrent
    /// first views of the same pair serialize and exactly one is counted.
    pub async fn record_view(&self, post_id: i32, user_id: Option<i32>) -> AppResult<ViewOutcome> {
        let Some(user_id) = user_id else {
            let post = Post::find_by_id(post_id)
                .one(&self.db)
                .await?
                .ok_or(AppError::NotFound)?;
            ensure_visible(&post, None)?;
            return Ok(ViewOutcome::Skipped);
        };

        let txn = self.db.begin().await?;

        let post = Post::find_by_id(post_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        ensure_visible(&post, Some(user_id))?;

        let seen = PostView::find()
            .filter(post_view::Column::PostId.eq(post_id))
            .filter(post_view::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .is_some();
        if seen {
            txn.commit().await?;
            return Ok(ViewOutcome::AlreadyViewed(post.view_count));
        }

        post_view::ActiveModel {
            post_id: Set(post_id),
            user_id: Set(user_id),
            viewed_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "View already recorded"))?;

        Post::update_many()
            .col_expr(
                post::Column::ViewCount,
                Expr::col(post::Column::ViewCount).add(1),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        tracing::debug!("User {} viewed post {}", user_id, post_id);
        Ok(ViewOutcome::Counted(post.view_count + 1))
    }
}
