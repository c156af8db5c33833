use crate::config::media::MediaConfig;
use crate::error::{AppError, AppResult};
use crate::handlers::double_option;
use crate::handlers::upload::read_image_field;
use crate::middleware::{AuthUser, RequestBase};
use crate::presentation::PostDetail;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::like::LikeService;
use crate::services::post::{NewPost, PostChanges, PostService};
use crate::services::upload::{UploadService, POST_IMAGE_DIR};
use crate::services::view::ViewService;
use axum::{
    extract::{Multipart, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePostRequest {
    /// Post title (1-150 characters)
    #[validate(length(min = 1, max = 150))]
    pub title: String,
    /// Post body (up to 1500 characters, may be empty)
    #[serde(default)]
    #[validate(length(max = 1500))]
    pub content: String,
    /// Category ID
    pub category: Option<i32>,
    /// Defaults to true
    pub published: Option<bool>,
}

/// Every field is optional; `"category": null` removes the category.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 150))]
    pub title: Option<String>,
    #[validate(length(max = 1500))]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub category: Option<Option<i32>>,
    pub published: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ViewCountResponse {
    /// `OK`, `Already viewed` or `Skipped` (anonymous caller)
    pub status: String,
    /// Absent for anonymous callers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_count: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeResponse {
    /// `Liked` or `Unliked`
    pub status: String,
    pub like_count: i32,
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/",
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("page_size" = Option<u64>, Query, description = "Items per page (max 100)"),
    ),
    responses(
        (status = 200, description = "Published posts and the caller's drafts, newest first", body = PaginatedResponse<PostDetail>),
    ),
    tag = "posts"
)]
pub async fn list_posts(
    Extension(db): Extension<DatabaseConnection>,
    base: RequestBase,
    viewer: Option<AuthUser>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, page_size) = params.resolve();

    let service = PostService::new(db);
    let (items, total) = service
        .list_feed(viewer.map(|u| u.user_id), base.as_str(), page, page_size)
        .await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, page_size,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}/",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post details", body = PostDetail),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn get_post(
    Extension(db): Extension<DatabaseConnection>,
    base: RequestBase,
    viewer: Option<AuthUser>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    let post = service
        .feed_detail(id, viewer.map(|u| u.user_id), base.as_str())
        .await?;
    Ok(ApiResponse::ok(post))
}

#[utoipa::path(
    post,
    path = "/api/v1/posts/",
    security(("jwt_token" = [])),
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostDetail),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "posts"
)]
pub async fn create_post(
    Extension(db): Extension<DatabaseConnection>,
    base: RequestBase,
    auth_user: AuthUser,
    Json(payload): Json<CreatePostRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let service = PostService::new(db);
    let post = service
        .create(
            auth_user.user_id,
            NewPost {
                title: payload.title,
                content: payload.content,
                category_id: payload.category,
                published: payload.published.unwrap_or(true),
            },
        )
        .await?;

    let detail = service
        .feed_detail(post.id, Some(auth_user.user_id), base.as_str())
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(detail)))
}

#[utoipa::path(
    put,
    path = "/api/v1/posts/{id}/",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostDetail),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn update_post(
    Extension(db): Extension<DatabaseConnection>,
    base: RequestBase,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdatePostRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let service = PostService::new(db);
    service
        .update(
            id,
            auth_user.user_id,
            PostChanges {
                title: payload.title,
                content: payload.content,
                category_id: payload.category,
                published: payload.published,
            },
        )
        .await?;

    let detail = service
        .feed_detail(id, Some(auth_user.user_id), base.as_str())
        .await?;
    Ok(ApiResponse::ok(detail))
}

#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}/",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post and its comments, likes, views and favorites deleted", body = String),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn delete_post(
    Extension(db): Extension<DatabaseConnection>,
    Extension(media): Extension<MediaConfig>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    let deleted = service.delete(id, auth_user.user_id).await?;

    if let Some(path) = deleted.image {
        UploadService::remove(&media, &path).await;
    }
    Ok(ApiResponse::ok("Post deleted"))
}

#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/image/",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    request_body(content_type = "multipart/form-data", description = "Form field `image`"),
    responses(
        (status = 200, description = "Image stored", body = PostDetail),
        (status = 400, description = "Missing or unsupported file", body = AppError),
        (status = 403, description = "Not the author", body = AppError),
        (status = 413, description = "File too large", body = AppError),
    ),
    tag = "posts"
)]
pub async fn upload_post_image(
    Extension(db): Extension<DatabaseConnection>,
    Extension(media): Extension<MediaConfig>,
    base: RequestBase,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    service.ensure_author(id, auth_user.user_id).await?;

    let upload = read_image_field(&mut multipart, "image").await?;
    let path = UploadService::save_image(
        &media,
        "image",
        &upload.data,
        &upload.content_type,
        POST_IMAGE_DIR,
    )
    .await?;

    match service.set_image(id, auth_user.user_id, path.clone()).await {
        Ok(Some(previous)) => UploadService::remove(&media, &previous).await,
        Ok(None) => {}
        Err(e) => {
            UploadService::remove(&media, &path).await;
            return Err(e);
        }
    }

    let detail = service
        .feed_detail(id, Some(auth_user.user_id), base.as_str())
        .await?;
    Ok(ApiResponse::ok(detail))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}/view_count/",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "View recorded, already seen, or skipped for anonymous callers", body = ViewCountResponse),
        (status = 404, description = "Post not found", body = AppError),
        (status = 409, description = "Concurrent first view", body = AppError),
    ),
    tag = "interactions"
)]
pub async fn view_count(
    Extension(db): Extension<DatabaseConnection>,
    viewer: Option<AuthUser>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = ViewService::new(db);
    let outcome = service.record_view(id, viewer.map(|u| u.user_id)).await?;

    Ok(ApiResponse::ok(ViewCountResponse {
        status: outcome.status().to_string(),
        view_count: outcome.view_count(),
    }))
}

/// Toggles the caller's like. It is a GET for compatibility with existing
/// clients.
#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}/like_count/",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Like toggled", body = LikeResponse),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 404, description = "Post not found", body = AppError),
        (status = 409, description = "Concurrent toggle", body = AppError),
    ),
    tag = "interactions"
)]
pub async fn like_count(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = LikeService::new(db);
    let toggle = service.toggle(id, auth_user.user_id).await?;

    Ok(ApiResponse::ok(LikeResponse {
        status: toggle.state.as_str().to_string(),
        like_count: toggle.like_count,
    }))
}
