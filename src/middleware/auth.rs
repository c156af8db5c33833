use crate::{
    error::{AppError, AppResult},
    models::{User, UserModel},
    utils::jwt::{decode_token, TokenKind},
};
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
    Extension,
};
use sea_orm::{DatabaseConnection, EntityTrait};
use std::convert::Infallible;

/// Identity of the caller, inserted into request extensions by the auth
/// middlewares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i32,
}

/// Rejects the request unless it carries a valid access token for an
/// existing user.
pub async fn auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_user = resolve_identity(&db, &headers)
        .await?
        .ok_or(AppError::Unauthorized)?;
    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Attaches the caller's identity when a token is present and lets anonymous
/// requests through. A token that is present but invalid is still rejected.
pub async fn identify_middleware(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(auth_user) = resolve_identity(&db, &headers).await? {
        request.extensions_mut().insert(auth_user);
    }
    Ok(next.run(request).await)
}

async fn resolve_identity(
    db: &DatabaseConnection,
    headers: &HeaderMap,
) -> AppResult<Option<AuthUser>> {
    let Some(token) = extract_bearer_token(headers) else {
        return Ok(None);
    };

    let claims = decode_token(&token, TokenKind::Access).map_err(|e| {
        tracing::debug!("Rejected access token: {}", e);
        AppError::Unauthorized
    })?;
    let user_id = claims.user_id().ok_or(AppError::Unauthorized)?;

    // Tokens outlive deleted accounts
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Some(AuthUser { user_id }))
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Load the caller and verify the staff flag.
pub async fn require_staff(db: &DatabaseConnection, auth_user: &AuthUser) -> AppResult<UserModel> {
    let user = User::find_by_id(auth_user.user_id)
        .one(db)
        .await?
        .ok_or(AppError::Unauthorized)?;
    if !user.is_staff {
        return Err(AppError::Forbidden);
    }
    Ok(user)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(AppError::Unauthorized)
    }
}

/// `Option<AuthUser>` in a handler means "authenticated or anonymous".
impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthUser>().copied())
    }
}
