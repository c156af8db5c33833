use crate::{
    error::{AppError, AppResult},
    models::{comment, favorite, post, post_like, post_view, profile, user},
    models::{Comment, Favorite, Post, PostLike, PostView, Profile, User, UserModel},
    services::post::delete_post_with_dependents,
    utils::{hash_password, jwt, issue_token_pair, verify_password, TokenKind, TokenPair},
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QuerySelect, QueryTrait, Set, SqlErr, TransactionTrait,
};

pub const PASSWORD_MISMATCH: &str = "Passwords don't match.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

pub struct AccountService {
    db: DatabaseConnection,
}

impl AccountService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create the user and its empty profile. Nothing is written when any
    /// check fails.
    pub async fn register(&self, input: Registration) -> AppResult<UserModel> {
        if input.password != input.password2 {
            return Err(AppError::non_field(PASSWORD_MISMATCH));
        }

        let taken = User::find()
            .filter(user::Column::Username.eq(input.username.as_str()))
            .one(&self.db)
            .await?
            .is_some();
        if taken {
            return Err(AppError::field("username", USERNAME_TAKEN));
        }

        let password_hash = hash_password(&input.password)?;

        let txn = self.db.begin().await?;
        let user = create_user_with_profile(&txn, &input.username, &input.email, password_hash, false)
            .await?;
        txn.commit().await?;

        tracing::info!("User {} registered", user.username);
        Ok(user)
    }

    pub async fn login(&self, username: &str, password: &str) -> AppResult<(UserModel, TokenPair)> {
        let user = User::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let tokens = issue_token_pair(user.id)?;
        Ok((user, tokens))
    }

    /// Exchange a refresh token for a fresh pair. The user must still exist.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = jwt::decode_token(refresh_token, TokenKind::Refresh)
            .map_err(|_| AppError::Unauthorized)?;
        let user_id = claims.user_id().ok_or(AppError::Unauthorized)?;

        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(issue_token_pair(user_id)?)
    }

    /// Returns the media paths (post images, profile photo) the deleted
    /// rows pointed at; the caller removes the files.
    pub async fn delete_user(&self, user_id: i32) -> AppResult<Vec<String>> {
        let txn = self.db.begin().await?;
        User::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        let media = delete_user_with_dependents(&txn, user_id).await?;
        txn.commit().await?;

        tracing::info!("User {} deleted", user_id);
        Ok(media)
    }
}

/// Inserts a user row and its profile on `conn`. A username race surfaces as
/// the same field error as the up-front check.
pub(crate) async fn create_user_with_profile<C: ConnectionTrait>(
    conn: &C,
    username: &str,
    email: &str,
    password_hash: String,
    is_staff: bool,
) -> AppResult<UserModel> {
    let user = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        is_staff: Set(is_staff),
        date_joined: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::field("username", USERNAME_TAKEN),
        _ => AppError::Database(e),
    })?;

    profile::ActiveModel {
        user_id: Set(user.id),
        date_of_birth: Set(None),
        photo: Set(None),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    Ok(user)
}

/// Deletion hook for a user account.
///
/// Likes and views the user left are removed together with one unit of the
/// matching post counter. Then favorites, comments, the user's own posts
/// (through the post hook), the profile and finally the user row.
///
/// Returns the media paths of the removed post images and profile photo.
pub(crate) async fn delete_user_with_dependents<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
) -> AppResult<Vec<String>> {
    // (post, user) is unique, so each post loses at most one like and one view.
    let liked_posts = PostLike::find()
        .select_only()
        .column(post_like::Column::PostId)
        .filter(post_like::Column::UserId.eq(user_id))
        .into_query();
    Post::update_many()
        .col_expr(
            post::Column::LikeCount,
            Expr::col(post::Column::LikeCount).sub(1),
        )
        .filter(post::Column::Id.in_subquery(liked_posts))
        .exec(conn)
        .await?;
    PostLike::delete_many()
        .filter(post_like::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;

    let viewed_posts = PostView::find()
        .select_only()
        .column(post_view::Column::PostId)
        .filter(post_view::Column::UserId.eq(user_id))
        .into_query();
    Post::update_many()
        .col_expr(
            post::Column::ViewCount,
            Expr::col(post::Column::ViewCount).sub(1),
        )
        .filter(post::Column::Id.in_subquery(viewed_posts))
        .exec(conn)
        .await?;
    PostView::delete_many()
        .filter(post_view::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;

    Favorite::delete_many()
        .filter(favorite::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    Comment::delete_many()
        .filter(comment::Column::AuthorId.eq(user_id))
        .exec(conn)
        .await?;

    let own_posts: Vec<(i32, Option<String>)> = Post::find()
        .select_only()
        .column(post::Column::Id)
        .column(post::Column::Image)
        .filter(post::Column::AuthorId.eq(user_id))
        .into_tuple()
        .all(conn)
        .await?;

    let mut media = Vec::new();
    for (post_id, image) in own_posts {
        delete_post_with_dependents(conn, post_id).await?;
        media.extend(image);
    }

    let photos: Vec<Option<String>> = Profile::find()
        .select_only()
        .column(profile::Column::Photo)
        .filter(profile::Column::UserId.eq(user_id))
        .into_tuple()
        .all(conn)
        .await?;
    media.extend(photos.into_iter().flatten());

    Profile::delete_many()
        .filter(profile::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    User::delete_by_id(user_id).exec(conn).await?;
    Ok(media)
}
