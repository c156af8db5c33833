use crate::error::AppResult;
use crate::middleware::{AuthUser, RequestBase};
use crate::presentation::PostDetail;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::favorite::{FavoriteService, FavoriteState};
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoriteToggleResponse {
    /// `Added to favorites` or `Removed from favorites`
    pub status: String,
    /// Whether the post is now in the caller's favorites
    pub favorited: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/favorite/",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Favorite toggled", body = FavoriteToggleResponse),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
        (status = 404, description = "Post not found", body = crate::error::AppError),
    ),
    tag = "interactions"
)]
pub async fn toggle_favorite(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(post_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = FavoriteService::new(db);
    let state = service.toggle(post_id, auth_user.user_id).await?;
    Ok(ApiResponse::ok(FavoriteToggleResponse {
        status: state.message().to_string(),
        favorited: state == FavoriteState::Added,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/favorites/",
    security(("jwt_token" = [])),
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("page_size" = Option<u64>, Query, description = "Items per page (max 100)"),
    ),
    responses(
        (status = 200, description = "Favorited posts, most recent first", body = PaginatedResponse<PostDetail>),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
    ),
    tag = "interactions"
)]
pub async fn list_favorites(
    Extension(db): Extension<DatabaseConnection>,
    base: RequestBase,
    auth_user: AuthUser,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, page_size) = params.resolve();
    let service = FavoriteService::new(db);
    let (items, total) = service
        .list_user_favorites(auth_user.user_id, base.as_str(), page, page_size)
        .await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, page_size,
    )))
}
