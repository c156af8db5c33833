use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::{auth_middleware, identify_middleware};
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new().nest("/api/v1", api_routes())
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let public =
        public_routes(&rate_limit_config).layer(middleware::from_fn(identify_middleware));
    let protected =
        protected_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));

    public.merge(protected)
}

/// Routes reachable anonymously. The caller's identity is attached when a
/// token is sent; writes on these paths still require it through the
/// `AuthUser` extractor.
fn public_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Accounts
        .route("/users/register/", routing::post(handlers::register))
        .route("/users/login/", routing::post(handlers::login))
        .route(
            "/users/token/refresh/",
            routing::post(handlers::auth::refresh_token),
        )
        // Posts
        .route(
            "/posts/",
            routing::get(handlers::post::list_posts).post(handlers::post::create_post),
        )
        .route(
            "/posts/{id}/",
            routing::get(handlers::post::get_post)
                .put(handlers::post::update_post)
                .patch(handlers::post::update_post)
                .delete(handlers::post::delete_post),
        )
        .route(
            "/posts/{id}/view_count/",
            routing::get(handlers::post::view_count),
        )
        // Comments
        .route(
            "/comments/",
            routing::get(handlers::comment::list_comments)
                .post(handlers::comment::create_comment),
        )
        .route(
            "/comments/{id}/",
            routing::get(handlers::comment::get_comment)
                .put(handlers::comment::update_comment)
                .patch(handlers::comment::update_comment)
                .delete(handlers::comment::delete_comment),
        )
        // Categories (writes are staff only, checked in handler)
        .route(
            "/categories/",
            routing::get(handlers::category::list_categories)
                .post(handlers::category::create_category),
        )
        .route(
            "/categories/{id}/",
            routing::get(handlers::category::get_category)
                .delete(handlers::category::delete_category),
        )
        // Profiles
        .route(
            "/profiles/",
            routing::get(handlers::profile::list_profiles),
        )
        .route(
            "/profiles/{id}/",
            routing::get(handlers::profile::get_profile)
                .delete(handlers::profile::delete_profile),
        );

    with_optional_rate_limit(router, config.enabled, config.public)
}

/// Routes where every method needs a logged-in caller.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Interactions
        .route(
            "/posts/{id}/like_count/",
            routing::get(handlers::post::like_count),
        )
        .route(
            "/posts/{id}/favorite/",
            routing::post(handlers::favorite::toggle_favorite),
        )
        .route(
            "/favorites/",
            routing::get(handlers::favorite::list_favorites),
        )
        // Uploads
        .route(
            "/posts/{id}/image/",
            routing::post(handlers::post::upload_post_image),
        )
        .route(
            "/profiles/photo/",
            routing::post(handlers::profile::upload_photo),
        )
        // Own profile
        .route(
            "/profiles/my_profile/",
            routing::get(handlers::profile::my_profile),
        )
        .route(
            "/profiles/update_profile/",
            routing::put(handlers::profile::update_profile),
        )
        .route(
            "/profiles/delete_profile/",
            routing::delete(handlers::profile::delete_own_profile),
        );

    with_optional_rate_limit(router, config.enabled, config.protected)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let Some(governor_conf) = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
    else {
        tracing::warn!("Invalid rate limit rule {:?}, limiting disabled", rule);
        return router;
    };

    router.layer(GovernorLayer::new(governor_conf))
}
