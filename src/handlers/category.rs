use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_staff, AuthUser};
use crate::presentation::CategoryDetail;
use crate::response::ApiResponse;
use crate::services::category::CategoryService;
use axum::{extract::Path, http::StatusCode, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    /// Category name (1-100 characters, unique)
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryListResponse {
    pub categories: Vec<CategoryDetail>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub category: CategoryDetail,
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/",
    responses(
        (status = 200, description = "All categories ordered by name", body = CategoryListResponse),
    ),
    tag = "categories"
)]
pub async fn list_categories(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    let service = CategoryService::new(db);
    let categories = service
        .list()
        .await?
        .into_iter()
        .map(CategoryDetail::from)
        .collect();
    Ok(ApiResponse::ok(CategoryListResponse { categories }))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}/",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 404, description = "Category not found", body = AppError),
    ),
    tag = "categories"
)]
pub async fn get_category(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CategoryService::new(db);
    let category = service.get_by_id(id).await?;
    Ok(ApiResponse::ok(CategoryResponse {
        category: category.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories/",
    security(("jwt_token" = [])),
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation error or duplicate name", body = AppError),
        (status = 403, description = "Staff only", body = AppError),
    ),
    tag = "categories"
)]
pub async fn create_category(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> AppResult<impl IntoResponse> {
    require_staff(&db, &auth_user).await?;
    payload.validate()?;

    let service = CategoryService::new(db);
    let category = service.create(&payload.name).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(CategoryResponse {
            category: category.into(),
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}/",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted; its posts are kept without a category", body = String),
        (status = 403, description = "Staff only", body = AppError),
        (status = 404, description = "Category not found", body = AppError),
    ),
    tag = "categories"
)]
pub async fn delete_category(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    require_staff(&db, &auth_user).await?;

    let service = CategoryService::new(db);
    service.delete(id).await?;
    Ok(ApiResponse::ok("Category deleted"))
}
