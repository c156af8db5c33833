use crate::error::{AppError, AppResult};
use crate::middleware::{AuthUser, RequestBase};
use crate::presentation::CommentDetail;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::comment::CommentService;
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommentListQuery {
    /// Only comments on this post
    pub post: Option<i32>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommentRequest {
    /// Post ID
    pub post: i32,
    /// Comment body (1-1500 characters)
    #[validate(length(min = 1, max = 1500))]
    pub content: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 1500))]
    pub content: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/comments/",
    params(CommentListQuery),
    responses(
        (status = 200, description = "Comments, oldest first", body = PaginatedResponse<CommentDetail>),
    ),
    tag = "comments"
)]
pub async fn list_comments(
    Extension(db): Extension<DatabaseConnection>,
    base: RequestBase,
    viewer: Option<AuthUser>,
    Query(params): Query<CommentListQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, page_size) = PaginationQuery {
        page: params.page,
        page_size: params.page_size,
    }
    .resolve();

    let service = CommentService::new(db);
    let (items, total) = service
        .list(
            viewer.map(|u| u.user_id),
            params.post,
            base.as_str(),
            page,
            page_size,
        )
        .await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, page_size,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/comments/{id}/",
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment", body = CommentDetail),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn get_comment(
    Extension(db): Extension<DatabaseConnection>,
    base: RequestBase,
    viewer: Option<AuthUser>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CommentService::new(db);
    let comment = service
        .get_detail(id, viewer.map(|u| u.user_id), base.as_str())
        .await?;
    Ok(ApiResponse::ok(comment))
}

#[utoipa::path(
    post,
    path = "/api/v1/comments/",
    security(("jwt_token" = [])),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentDetail),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn create_comment(
    Extension(db): Extension<DatabaseConnection>,
    base: RequestBase,
    auth_user: AuthUser,
    Json(payload): Json<CreateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let service = CommentService::new(db);
    let comment = service
        .create(auth_user.user_id, payload.post, &payload.content)
        .await?;
    let detail = service
        .get_detail(comment.id, Some(auth_user.user_id), base.as_str())
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::ok(detail)))
}

#[utoipa::path(
    put,
    path = "/api/v1/comments/{id}/",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentDetail),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn update_comment(
    Extension(db): Extension<DatabaseConnection>,
    base: RequestBase,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let service = CommentService::new(db);
    service
        .update(id, auth_user.user_id, &payload.content)
        .await?;
    let detail = service
        .get_detail(id, Some(auth_user.user_id), base.as_str())
        .await?;
    Ok(ApiResponse::ok(detail))
}

#[utoipa::path(
    delete,
    path = "/api/v1/comments/{id}/",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted", body = String),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn delete_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CommentService::new(db);
    service.delete(id, auth_user.user_id).await?;
    Ok(ApiResponse::ok("Comment deleted"))
}
