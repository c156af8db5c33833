use crate::config::media::MediaConfig;
use crate::error::{AppError, AppResult};
use crate::handlers::double_option;
use crate::handlers::upload::read_image_field;
use crate::middleware::auth::{require_staff, AuthUser};
use crate::middleware::RequestBase;
use crate::presentation::ProfileDetail;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::account::AccountService;
use crate::services::profile::{ProfileChanges, ProfileService};
use crate::services::upload::{profile_photo_dir, UploadService};
use axum::{
    extract::{Multipart, Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// Any subset of the fields; `"date_of_birth": null` clears the date.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub date_of_birth: Option<Option<NaiveDate>>,
}

#[utoipa::path(
    get,
    path = "/api/v1/profiles/",
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("page_size" = Option<u64>, Query, description = "Items per page (max 100)"),
    ),
    responses(
        (status = 200, description = "Profiles", body = PaginatedResponse<ProfileDetail>),
    ),
    tag = "profiles"
)]
pub async fn list_profiles(
    Extension(db): Extension<DatabaseConnection>,
    base: RequestBase,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, page_size) = params.resolve();
    let service = ProfileService::new(db);
    let (items, total) = service.list(base.as_str(), page, page_size).await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, page_size,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/profiles/{id}/",
    params(("id" = i32, Path, description = "Profile ID")),
    responses(
        (status = 200, description = "Profile", body = ProfileDetail),
        (status = 404, description = "Profile not found", body = AppError),
    ),
    tag = "profiles"
)]
pub async fn get_profile(
    Extension(db): Extension<DatabaseConnection>,
    base: RequestBase,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = ProfileService::new(db);
    let profile = service.get(id, base.as_str()).await?;
    Ok(ApiResponse::ok(profile))
}

#[utoipa::path(
    get,
    path = "/api/v1/profiles/my_profile/",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "The caller's profile", body = ProfileDetail),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "profiles"
)]
pub async fn my_profile(
    Extension(db): Extension<DatabaseConnection>,
    base: RequestBase,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = ProfileService::new(db);
    let profile = service.get_own(auth_user.user_id, base.as_str()).await?;
    Ok(ApiResponse::ok(profile))
}

#[utoipa::path(
    put,
    path = "/api/v1/profiles/update_profile/",
    security(("jwt_token" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileDetail),
        (status = 400, description = "Validation error or taken username", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "profiles"
)]
pub async fn update_profile(
    Extension(db): Extension<DatabaseConnection>,
    base: RequestBase,
    auth_user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let service = ProfileService::new(db);
    let profile = service
        .update_own(
            auth_user.user_id,
            ProfileChanges {
                username: payload.username,
                email: payload.email,
                date_of_birth: payload.date_of_birth,
            },
            base.as_str(),
        )
        .await?;
    Ok(ApiResponse::ok(profile))
}

#[utoipa::path(
    post,
    path = "/api/v1/profiles/photo/",
    security(("jwt_token" = [])),
    request_body(content_type = "multipart/form-data", description = "Form field `photo`"),
    responses(
        (status = 200, description = "Photo stored", body = ProfileDetail),
        (status = 400, description = "Missing or unsupported file", body = AppError),
        (status = 413, description = "File too large", body = AppError),
    ),
    tag = "profiles"
)]
pub async fn upload_photo(
    Extension(db): Extension<DatabaseConnection>,
    Extension(media): Extension<MediaConfig>,
    base: RequestBase,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let upload = read_image_field(&mut multipart, "photo").await?;
    let dir = profile_photo_dir(chrono::Utc::now().date_naive());
    let path = UploadService::save_image(&media, "photo", &upload.data, &upload.content_type, &dir)
        .await?;

    let service = ProfileService::new(db);
    match service.set_photo(auth_user.user_id, path.clone()).await {
        Ok(Some(previous)) => UploadService::remove(&media, &previous).await,
        Ok(None) => {}
        Err(e) => {
            UploadService::remove(&media, &path).await;
            return Err(e);
        }
    }

    let profile = service.get_own(auth_user.user_id, base.as_str()).await?;
    Ok(ApiResponse::ok(profile))
}

#[utoipa::path(
    delete,
    path = "/api/v1/profiles/delete_profile/",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Account and everything it owns deleted", body = String),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "profiles"
)]
pub async fn delete_own_profile(
    Extension(db): Extension<DatabaseConnection>,
    Extension(media): Extension<MediaConfig>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = AccountService::new(db);
    let files = service.delete_user(auth_user.user_id).await?;
    UploadService::remove_all(&media, &files).await;
    Ok(ApiResponse::ok("Account deleted"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/profiles/{id}/",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Profile ID")),
    responses(
        (status = 200, description = "Profile and its user deleted", body = String),
        (status = 403, description = "Staff only", body = AppError),
        (status = 404, description = "Profile not found", body = AppError),
    ),
    tag = "profiles"
)]
pub async fn delete_profile(
    Extension(db): Extension<DatabaseConnection>,
    Extension(media): Extension<MediaConfig>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    require_staff(&db, &auth_user).await?;

    let service = ProfileService::new(db);
    let files = service.delete_by_id(id).await?;
    UploadService::remove_all(&media, &files).await;
    Ok(ApiResponse::ok("Profile deleted"))
}
