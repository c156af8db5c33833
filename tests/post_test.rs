mod common;

use serde_json::{json, Value};

#[tokio::test]
async fn create_and_get_post() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "postuser").await;
    let (category_id, category_name) = common::create_test_category(&app).await;

    let resp = app
        .client
        .post(app.url("/posts/"))
        .bearer_auth(&author.token)
        .json(&json!({
            "title": "Test Post",
            "content": "Hello, world!",
            "category": category_id
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    let post_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["title"], "Test Post");
    assert_eq!(body["data"]["published"], true);
    assert_eq!(body["data"]["view_count"], 0);
    assert_eq!(body["data"]["like_count"], 0);

    let (status, body) = common::get_json(&app, &format!("/posts/{}/", post_id), None).await;
    assert_eq!(status, 200);
    let post = &body["data"];
    assert_eq!(post["content"], "Hello, world!");
    assert_eq!(post["author"]["id"], author.id);
    assert_eq!(post["author"]["name"], author.username.as_str());
    assert_eq!(post["category"]["id"], category_id);
    assert_eq!(post["category"]["name"], category_name.as_str());
    // No image, no profile photo yet
    assert_eq!(post["image"], "null");
    assert_eq!(post["author_photo"], "null");

    // DD.MM.YYYY, HH:MM
    let created = post["created_at"].as_str().unwrap();
    assert_eq!(created.len(), 17, "{created}");
    assert_eq!(&created[2..3], ".");
    assert_eq!(&created[5..6], ".");
    assert_eq!(&created[10..12], ", ");
}

#[tokio::test]
async fn post_without_category_is_listed() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "nocat").await;
    let post_id = common::create_test_post(&app, &author.token, json!({"title": "Loose"})).await;

    let (status, body) = common::get_json(&app, "/posts/?page_size=100", None).await;
    assert_eq!(status, 200);
    let items = body["data"]["items"].as_array().unwrap();
    let found = items
        .iter()
        .find(|p| p["id"] == post_id)
        .expect("post missing from feed");
    assert_eq!(found["category"], "null");
}

#[tokio::test]
async fn create_post_requires_auth_and_valid_input() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/posts/"))
        .json(&json!({"title": "Nope"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let author = common::create_test_user(&app, "validator").await;
    let resp = app
        .client
        .post(app.url("/posts/"))
        .bearer_auth(&author.token)
        .json(&json!({"title": "", "content": "x".repeat(1501)}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["fields"]["title"].is_array());
    assert!(body["fields"]["content"].is_array());

    let resp = app
        .client
        .post(app.url("/posts/"))
        .bearer_auth(&author.token)
        .json(&json!({"title": "Orphan", "category": 999999}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["fields"]["category"].is_array());
}

#[tokio::test]
async fn only_author_can_update_or_delete() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "owner").await;
    let other = common::create_test_user(&app, "intruder").await;
    let post_id = common::create_test_post(&app, &author.token, json!({"title": "Mine"})).await;

    let resp = app
        .client
        .patch(app.url(&format!("/posts/{}/", post_id)))
        .bearer_auth(&other.token)
        .json(&json!({"title": "Hijacked"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .delete(app.url(&format!("/posts/{}/", post_id)))
        .bearer_auth(&other.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .patch(app.url(&format!("/posts/{}/", post_id)))
        .bearer_auth(&author.token)
        .json(&json!({"content": "Edited"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Mine");
    assert_eq!(body["data"]["content"], "Edited");
}

#[tokio::test]
async fn update_cannot_touch_counters() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "sneaky").await;
    let post_id = common::create_test_post(&app, &author.token, json!({"title": "Counts"})).await;

    let resp = app
        .client
        .put(app.url(&format!("/posts/{}/", post_id)))
        .bearer_auth(&author.token)
        .json(&json!({"title": "Counts", "like_count": 100, "view_count": 100}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(common::post_counters(&app.db, post_id).await, (0, 0));
}

#[tokio::test]
async fn drafts_are_hidden_from_others() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "drafter").await;
    let other = common::create_test_user(&app, "reader").await;
    let post_id = common::create_test_post(
        &app,
        &author.token,
        json!({"title": "Draft", "published": false}),
    )
    .await;

    let (status, _) = common::get_json(&app, &format!("/posts/{}/", post_id), None).await;
    assert_eq!(status, 404);
    let (status, _) =
        common::get_json(&app, &format!("/posts/{}/", post_id), Some(&other.token)).await;
    assert_eq!(status, 404);
    let (status, body) =
        common::get_json(&app, &format!("/posts/{}/", post_id), Some(&author.token)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["published"], false);

    let (_, body) = common::get_json(&app, "/posts/?page_size=100", Some(&other.token)).await;
    let items = body["data"]["items"].as_array().unwrap();
    assert!(items.iter().all(|p| p["id"] != post_id));
}

#[tokio::test]
async fn delete_post_removes_dependents() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "deleter").await;
    let fan = common::create_test_user(&app, "fan").await;
    let post_id = common::create_test_post(&app, &author.token, json!({"title": "Doomed"})).await;

    common::get_json(&app, &format!("/posts/{}/view_count/", post_id), Some(&fan.token)).await;
    common::get_json(&app, &format!("/posts/{}/like_count/", post_id), Some(&fan.token)).await;
    app.client
        .post(app.url(&format!("/posts/{}/favorite/", post_id)))
        .bearer_auth(&fan.token)
        .send()
        .await
        .unwrap();
    app.client
        .post(app.url("/comments/"))
        .bearer_auth(&fan.token)
        .json(&json!({"post": post_id, "content": "Bye"}))
        .send()
        .await
        .unwrap();

    let resp = app
        .client
        .delete(app.url(&format!("/posts/{}/", post_id)))
        .bearer_auth(&author.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (status, _) = common::get_json(&app, &format!("/posts/{}/", post_id), None).await;
    assert_eq!(status, 404);
    assert_eq!(common::interaction_rows(&app.db, post_id).await, (0, 0));

    let (_, body) = common::get_json(&app, "/favorites/", Some(&fan.token)).await;
    assert_eq!(body["data"]["total"], 0);
    let (_, body) = common::get_json(&app, &format!("/comments/?post={}", post_id), None).await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn upload_post_image() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "painter").await;
    let post_id = common::create_test_post(&app, &author.token, json!({"title": "Picture"})).await;

    let png = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00];
    let part = reqwest::multipart::Part::bytes(png)
        .file_name("cover.png")
        .mime_str("image/png")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("image", part);

    let resp = app
        .client
        .post(app.url(&format!("/posts/{}/image/", post_id)))
        .bearer_auth(&author.token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let image = body["data"]["image"].as_str().unwrap();
    assert!(image.starts_with(&format!("{}/media/posts/", app.addr)), "{image}");
    assert!(image.ends_with(".png"), "{image}");

    // The URL is served
    let resp = app.client.get(image).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    // Wrong bytes for the declared type
    let part = reqwest::multipart::Part::bytes(b"%PDF-1.4".to_vec())
        .file_name("doc.png")
        .mime_str("image/png")
        .unwrap();
    let resp = app
        .client
        .post(app.url(&format!("/posts/{}/image/", post_id)))
        .bearer_auth(&author.token)
        .multipart(reqwest::multipart::Form::new().part("image", part))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}
