#![allow(dead_code)]

use reqwest::Client;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Once,
};
use tokio::sync::OnceCell;

static INIT: Once = Once::new();
static SCHEMA_READY: OnceCell<()> = OnceCell::const_new();
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);
static CATEGORY_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        std::env::set_var("BCRYPT_COST", "4");
        let config = quill::config::jwt::JwtConfig::from_env().unwrap();
        let _ = quill::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
    pub media_root: PathBuf,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }
}

pub struct TestUser {
    pub id: i32,
    pub username: String,
    pub token: String,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_media(std::env::temp_dir().join("quill_test_media")).await
}

/// Like `spawn_app`, with uploads stored under `media_root`.
pub async fn spawn_app_with_media(media_root: PathBuf) -> TestApp {
    init_env();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    // Migrate and wipe once per test binary; tests inside a binary run in
    // parallel and only ever look at rows they created.
    SCHEMA_READY
        .get_or_init(|| async {
            quill::migration::Migrator::up(&db, None)
                .await
                .expect("Failed to run migrations");
            cleanup_tables(&db).await;
        })
        .await;

    let media_config = quill::config::media::MediaConfig {
        media_root: media_root.clone(),
        public_base_url: None,
        max_upload_bytes: 64 * 1024,
    };

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(quill::routes::create_routes())
        .nest_service(
            "/media",
            tower_http::services::ServeDir::new(media_root.clone()),
        )
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(media_config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client: Client::new(),
        media_root,
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = [
        "post_views",
        "post_likes",
        "favorites",
        "comments",
        "posts",
        "categories",
        "profiles",
        "users",
    ];

    for table in tables {
        let sql = format!("TRUNCATE TABLE {} RESTART IDENTITY CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

pub fn unique_name(prefix: &str) -> String {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}_{}_{}", prefix, std::process::id(), counter)
}

/// Register a user through the API, then log in.
pub async fn create_test_user(app: &TestApp, username_prefix: &str) -> TestUser {
    let username = unique_name(username_prefix);

    let resp = app
        .client
        .post(app.url("/users/register/"))
        .json(&serde_json::json!({
            "username": username,
            "email": format!("{}@test.com", username),
            "password": "test_password_123",
            "password2": "test_password_123"
        }))
        .send()
        .await
        .expect("Failed to register user");
    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse register response");
    assert_eq!(status, 201, "register '{}' failed: {}", username, body);

    let resp = app
        .client
        .post(app.url("/users/login/"))
        .json(&serde_json::json!({
            "username": username,
            "password": "test_password_123"
        }))
        .send()
        .await
        .expect("Failed to log in");
    let body: Value = resp.json().await.expect("Failed to parse login response");

    TestUser {
        id: body["data"]["user_id"]
            .as_i64()
            .unwrap_or_else(|| panic!("login response missing user_id: {}", body))
            as i32,
        token: body["data"]["access"]
            .as_str()
            .unwrap_or_else(|| panic!("login response missing access token: {}", body))
            .to_string(),
        username,
    }
}

/// Flip the staff flag directly in the database.
pub async fn make_staff(db: &DatabaseConnection, user_id: i32) {
    db.execute(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        "UPDATE users SET is_staff = TRUE WHERE id = $1",
        vec![user_id.into()],
    ))
    .await
    .expect("Failed to make user staff");
}

/// Create a post and return its id.
pub async fn create_test_post(app: &TestApp, token: &str, body: Value) -> i32 {
    let resp = app
        .client
        .post(app.url("/posts/"))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Failed to create post");
    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse post response");
    assert_eq!(status, 201, "create post failed: {}", body);
    body["data"]["id"].as_i64().expect("post id") as i32
}

/// Create a category as a fresh staff user; returns (id, name).
pub async fn create_test_category(app: &TestApp) -> (i32, String) {
    let staff = create_test_user(app, "staff").await;
    make_staff(&app.db, staff.id).await;

    let counter = CATEGORY_COUNTER.fetch_add(1, Ordering::SeqCst);
    let name = format!("Category {} {}", std::process::id(), counter);

    let resp = app
        .client
        .post(app.url("/categories/"))
        .bearer_auth(&staff.token)
        .json(&serde_json::json!({ "name": name }))
        .send()
        .await
        .expect("Failed to create category");
    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse category response");
    assert_eq!(status, 201, "create category failed: {}", body);

    let id = body["data"]["category"]["id"].as_i64().expect("category id") as i32;
    (id, name)
}

async fn scalar(db: &DatabaseConnection, sql: &str, post_id: i32) -> i64 {
    let row = db
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            sql,
            vec![post_id.into()],
        ))
        .await
        .expect("query failed")
        .expect("no row");
    row.try_get_by_index::<i64>(0).expect("not an integer")
}

/// Stored `(view_count, like_count)` of a post.
pub async fn post_counters(db: &DatabaseConnection, post_id: i32) -> (i64, i64) {
    let views = scalar(db, "SELECT view_count::BIGINT FROM posts WHERE id = $1", post_id).await;
    let likes = scalar(db, "SELECT like_count::BIGINT FROM posts WHERE id = $1", post_id).await;
    (views, likes)
}

/// Number of `(views, likes)` rows recorded for a post.
pub async fn interaction_rows(db: &DatabaseConnection, post_id: i32) -> (i64, i64) {
    let views = scalar(db, "SELECT COUNT(*) FROM post_views WHERE post_id = $1", post_id).await;
    let likes = scalar(db, "SELECT COUNT(*) FROM post_likes WHERE post_id = $1", post_id).await;
    (views, likes)
}

pub async fn get_json(app: &TestApp, path: &str, token: Option<&str>) -> (u16, Value) {
    let mut req = app.client.get(app.url(path));
    if let Some(token) = token {
        req = req.bearer_auth(token);
    }
    let resp = req.send().await.expect("request failed");
    let status = resp.status().as_u16();
    let body: Value = resp.json().await.unwrap_or(Value::Null);
    (status, body)
}

/// Path on disk behind a `/media/...` URL returned by the API.
pub fn media_file(app: &TestApp, url: &str) -> PathBuf {
    let prefix = format!("{}/media/", app.addr);
    let relative = url
        .strip_prefix(&prefix)
        .unwrap_or_else(|| panic!("not a media URL of this app: {}", url));
    app.media_root.join(relative)
}

/// Number of regular files under `dir`, recursively. A missing directory
/// counts as empty.
pub fn count_files(dir: &std::path::Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(Result::ok)
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}

pub fn png_part(name: &str) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00])
        .file_name(name.to_string())
        .mime_str("image/png")
        .expect("valid mime")
}
