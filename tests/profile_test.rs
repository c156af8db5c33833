mod common;

use sea_orm::{ConnectionTrait, Statement};
use serde_json::{json, Value};

#[tokio::test]
async fn update_own_profile() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "updater").await;
    let new_name = common::unique_name("renamed");

    let resp = app
        .client
        .put(app.url("/profiles/update_profile/"))
        .bearer_auth(&user.token)
        .json(&json!({
            "username": new_name,
            "email": "renamed@test.com",
            "date_of_birth": "1990-05-17"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["user"]["username"], new_name.as_str());
    assert_eq!(body["data"]["user"]["email"], "renamed@test.com");
    assert_eq!(body["data"]["date_of_birth"], "1990-05-17");

    // Clearing the date leaves the other fields alone
    let resp = app
        .client
        .put(app.url("/profiles/update_profile/"))
        .bearer_auth(&user.token)
        .json(&json!({"date_of_birth": null}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["date_of_birth"].is_null());
    assert_eq!(body["data"]["user"]["username"], new_name.as_str());

    let profile_id = body["data"]["id"].as_i64().unwrap();
    let (status, body) =
        common::get_json(&app, &format!("/profiles/{}/", profile_id), None).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["user"]["id"], user.id);
}

#[tokio::test]
async fn update_profile_rejects_taken_username() {
    let app = common::spawn_app().await;
    let first = common::create_test_user(&app, "first").await;
    let second = common::create_test_user(&app, "second").await;

    let resp = app
        .client
        .put(app.url("/profiles/update_profile/"))
        .bearer_auth(&second.token)
        .json(&json!({"username": first.username}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["fields"]["username"].is_array());
}

#[tokio::test]
async fn upload_profile_photo_shows_on_posts() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "photogenic").await;
    let post_id = common::create_test_post(&app, &user.token, json!({"title": "Selfie"})).await;

    let jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    let part = reqwest::multipart::Part::bytes(jpeg)
        .file_name("me.jpg")
        .mime_str("image/jpeg")
        .unwrap();
    let resp = app
        .client
        .post(app.url("/profiles/photo/"))
        .bearer_auth(&user.token)
        .multipart(reqwest::multipart::Form::new().part("photo", part))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let photo = body["data"]["photo"].as_str().unwrap().to_string();
    assert!(photo.starts_with(&format!("{}/media/users/", app.addr)), "{photo}");
    assert!(photo.ends_with(".jpg"));

    let (_, body) = common::get_json(&app, &format!("/posts/{}/", post_id), None).await;
    assert_eq!(body["data"]["author_photo"], photo.as_str());
}

#[tokio::test]
async fn oversized_photo_is_rejected() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "heavy").await;

    let mut data = vec![0xFF, 0xD8, 0xFF];
    data.resize(65 * 1024, 0);
    let part = reqwest::multipart::Part::bytes(data)
        .file_name("big.jpg")
        .mime_str("image/jpeg")
        .unwrap();
    let resp = app
        .client
        .post(app.url("/profiles/photo/"))
        .bearer_auth(&user.token)
        .multipart(reqwest::multipart::Form::new().part("photo", part))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 413);
}

#[tokio::test]
async fn deleting_account_rolls_back_counters() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "survivor").await;
    let leaver = common::create_test_user(&app, "leaver").await;
    let post_id = common::create_test_post(&app, &author.token, json!({"title": "Stays"})).await;
    let own_post =
        common::create_test_post(&app, &leaver.token, json!({"title": "Goes"})).await;

    common::get_json(&app, &format!("/posts/{}/view_count/", post_id), Some(&leaver.token)).await;
    common::get_json(&app, &format!("/posts/{}/like_count/", post_id), Some(&leaver.token)).await;
    assert_eq!(common::post_counters(&app.db, post_id).await, (1, 1));

    let resp = app
        .client
        .delete(app.url("/profiles/delete_profile/"))
        .bearer_auth(&leaver.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    assert_eq!(common::post_counters(&app.db, post_id).await, (0, 0));
    assert_eq!(common::interaction_rows(&app.db, post_id).await, (0, 0));

    let (status, _) = common::get_json(&app, &format!("/posts/{}/", own_post), None).await;
    assert_eq!(status, 404);

    let resp = app
        .client
        .post(app.url("/users/login/"))
        .json(&json!({"username": leaver.username, "password": "test_password_123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn only_staff_delete_other_profiles() {
    let app = common::spawn_app().await;
    let target = common::create_test_user(&app, "target").await;
    let plain = common::create_test_user(&app, "plain").await;
    let staff = common::create_test_user(&app, "moderator").await;
    common::make_staff(&app.db, staff.id).await;

    let (_, body) = common::get_json(&app, "/profiles/my_profile/", Some(&target.token)).await;
    let profile_id = body["data"]["id"].as_i64().unwrap();
    let path = format!("/profiles/{}/", profile_id);

    let resp = app
        .client
        .delete(app.url(&path))
        .bearer_auth(&plain.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .delete(app.url(&path))
        .bearer_auth(&staff.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (status, _) = common::get_json(&app, &path, None).await;
    assert_eq!(status, 404);
}

async fn upload(app: &common::TestApp, token: &str, path: &str, field: &str) -> reqwest::Response {
    let form =
        reqwest::multipart::Form::new().part(field.to_string(), common::png_part("pic.png"));
    app.client
        .post(app.url(path))
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn deleting_account_removes_uploaded_files() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "uploader").await;
    let post_id = common::create_test_post(&app, &user.token, json!({"title": "Gallery"})).await;

    let resp = upload(&app, &user.token, &format!("/posts/{}/image/", post_id), "image").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let image = common::media_file(&app, body["data"]["image"].as_str().unwrap());

    let resp = upload(&app, &user.token, "/profiles/photo/", "photo").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let photo = common::media_file(&app, body["data"]["photo"].as_str().unwrap());

    assert!(image.exists(), "{}", image.display());
    assert!(photo.exists(), "{}", photo.display());

    let resp = app
        .client
        .delete(app.url("/profiles/delete_profile/"))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    assert!(!image.exists(), "{}", image.display());
    assert!(!photo.exists(), "{}", photo.display());
}

#[tokio::test]
async fn staff_profile_delete_removes_photo() {
    let app = common::spawn_app().await;
    let target = common::create_test_user(&app, "pictured").await;
    let staff = common::create_test_user(&app, "janitor").await;
    common::make_staff(&app.db, staff.id).await;

    let resp = upload(&app, &target.token, "/profiles/photo/", "photo").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let profile_id = body["data"]["id"].as_i64().unwrap();
    let photo = common::media_file(&app, body["data"]["photo"].as_str().unwrap());
    assert!(photo.exists());

    let resp = app
        .client
        .delete(app.url(&format!("/profiles/{}/", profile_id)))
        .bearer_auth(&staff.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(!photo.exists(), "{}", photo.display());
}

#[tokio::test]
async fn failed_photo_update_leaves_no_file() {
    let media_root =
        std::env::temp_dir().join(format!("quill_test_media_{}_orphan", std::process::id()));
    let _ = std::fs::remove_dir_all(&media_root);
    let app = common::spawn_app_with_media(media_root.clone()).await;
    let user = common::create_test_user(&app, "profileless").await;

    app.db
        .execute(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "DELETE FROM profiles WHERE user_id = $1",
            vec![user.id.into()],
        ))
        .await
        .unwrap();

    let resp = upload(&app, &user.token, "/profiles/photo/", "photo").await;
    assert_eq!(resp.status(), 404);
    assert_eq!(common::count_files(&media_root), 0);

    let _ = std::fs::remove_dir_all(&media_root);
}
