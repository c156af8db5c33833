use crate::error::{AppError, AppResult};
use crate::response::ApiResponse;
use crate::services::account::{AccountService, Registration};
use crate::utils::TokenPair;
use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Username (1-150 characters)
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    /// Email address
    #[validate(email)]
    pub email: String,
    /// Password (up to 64 characters)
    #[validate(length(min = 1, max = 64))]
    pub password: String,
    /// Must match `password`
    #[validate(length(min = 1, max = 64))]
    pub password2: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub username: String,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// JWT access token
    pub access: String,
    /// JWT refresh token
    pub refresh: String,
    pub user_id: i32,
    pub username: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/users/register/",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User and profile created", body = RegisterResponse),
        (status = 400, description = "Validation error, mismatched passwords or taken username", body = AppError),
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let service = AccountService::new(db);
    let user = service
        .register(Registration {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            password2: payload.password2,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(RegisterResponse {
            username: user.username,
            message: "User created successfully.".to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/login/",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AccountService::new(db);
    let (user, tokens) = service.login(&payload.username, &payload.password).await?;

    tracing::info!("User {} logged in", user.username);
    Ok(ApiResponse::ok(LoginResponse {
        access: tokens.access,
        refresh: tokens.refresh,
        user_id: user.id,
        username: user.username,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/token/refresh/",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Invalid or expired refresh token", body = AppError),
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<RefreshTokenRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AccountService::new(db);
    let tokens = service.refresh(&payload.refresh).await?;
    Ok(ApiResponse::ok(tokens))
}
