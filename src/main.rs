use axum::{
    extract::{DefaultBodyLimit, Extension},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use quill::config::{self, media::MediaConfig};
use quill::{handlers, migration, routes, services, utils};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Account routes
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh_token,
        // Post routes
        handlers::post::list_posts,
        handlers::post::get_post,
        handlers::post::create_post,
        handlers::post::update_post,
        handlers::post::delete_post,
        handlers::post::upload_post_image,
        // Interaction routes
        handlers::post::view_count,
        handlers::post::like_count,
        handlers::favorite::toggle_favorite,
        handlers::favorite::list_favorites,
        // Comment routes
        handlers::comment::list_comments,
        handlers::comment::get_comment,
        handlers::comment::create_comment,
        handlers::comment::update_comment,
        handlers::comment::delete_comment,
        // Category routes
        handlers::category::list_categories,
        handlers::category::get_category,
        handlers::category::create_category,
        handlers::category::delete_category,
        // Profile routes
        handlers::profile::list_profiles,
        handlers::profile::get_profile,
        handlers::profile::my_profile,
        handlers::profile::update_profile,
        handlers::profile::upload_photo,
        handlers::profile::delete_own_profile,
        handlers::profile::delete_profile,
    ),
    components(
        schemas(
            quill::response::ApiResponse<serde_json::Value>,
            quill::response::PaginatedResponse<serde_json::Value>,
            quill::response::PaginationQuery,
            quill::error::AppError,
            quill::utils::TokenPair,
            // View-models
            quill::presentation::PostDetail,
            quill::presentation::AuthorSummary,
            quill::presentation::CommentDetail,
            quill::presentation::CategoryDetail,
            quill::presentation::ProfileDetail,
            quill::presentation::UserSummary,
            // Accounts
            handlers::auth::RegisterRequest,
            handlers::auth::RegisterResponse,
            handlers::auth::LoginRequest,
            handlers::auth::LoginResponse,
            handlers::auth::RefreshTokenRequest,
            // Posts
            handlers::post::CreatePostRequest,
            handlers::post::UpdatePostRequest,
            handlers::post::ViewCountResponse,
            handlers::post::LikeResponse,
            handlers::favorite::FavoriteToggleResponse,
            // Comments
            handlers::comment::CreateCommentRequest,
            handlers::comment::UpdateCommentRequest,
            // Categories
            handlers::category::CreateCategoryRequest,
            handlers::category::CategoryListResponse,
            handlers::category::CategoryResponse,
            // Profiles
            handlers::profile::UpdateProfileRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and token refresh"),
        (name = "posts", description = "Post management operations"),
        (name = "interactions", description = "Views, likes and favorites"),
        (name = "comments", description = "Comment management operations"),
        (name = "categories", description = "Category operations"),
        (name = "profiles", description = "Profile operations"),
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quill=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration before doing anything else
    let (db_config, jwt_config, media_config) = validate_config()?;

    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting Quill API v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::connect(&db_config).await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    services::bootstrap_staff::ensure_bootstrap_staff(&db).await?;

    let app = create_app(&media_config)
        .layer(Extension(db))
        .layer(Extension(media_config));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<(
    config::database::DatabaseConfig,
    config::jwt::JwtConfig,
    MediaConfig,
)> {
    let jwt_config = config::jwt::JwtConfig::from_env()?;
    let db_config = config::database::DatabaseConfig::from_env()?;

    let media_config = MediaConfig::from_env();
    std::fs::create_dir_all(&media_config.media_root).map_err(|e| {
        anyhow::anyhow!(
            "Failed to create media directory '{}': {}",
            media_config.media_root.display(),
            e
        )
    })?;

    Ok((db_config, jwt_config, media_config))
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app(media: &MediaConfig) -> Router {
    // Multipart framing on top of the file itself
    let body_limit = media.max_upload_bytes + 64 * 1024;

    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest_service("/media", ServeDir::new(&media.media_root))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "Quill API",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
