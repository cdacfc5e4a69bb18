mod common;

use axum::http::StatusCode;
use common::{video_body, TestApp, CDN_BASE};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn create_requires_session() {
    let app = TestApp::new();

    let resp = app.post_json("/api/video", video_body("anon"), None).await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_requires_all_fields() {
    let app = TestApp::new();
    let token = app.token_for(Uuid::new_v4());

    let mut body = video_body("partial");
    body["videoUrl"] = json!("");
    let resp = app.post_json("/api/video", body, Some(&token)).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.error_message(),
        "title, description, videoUrl and thumbnailUrl are required"
    );
}

#[tokio::test]
async fn delete_requires_id() {
    let app = TestApp::new();
    let token = app.token_for(Uuid::new_v4());

    let resp = app.delete("/api/video", Some(&token)).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "video id is required");
}

#[tokio::test]
async fn create_defaults() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let user = app.create_user("vid_default").await;

    let video = app.create_video(&user, video_body("clip")).await;

    assert_eq!(video["controls"], true);
    assert_eq!(video["videoUrl"], format!("{}/clip.mp4?tr=ar-9-16,c-at_max", CDN_BASE));
    assert_eq!(video["transformation"]["quality"], 100);
    assert!(video["transformation"].get("filter").is_none());
}

#[tokio::test]
async fn filter_is_ignored_for_videos() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let user = app.create_user("vid_filter").await;

    let mut body = video_body("filtered");
    body["controls"] = json!(false);
    body["transformation"] = json!({ "aspectRatio": "16:9", "quality": 70, "filter": "sepia" });
    let video = app.create_video(&user, body).await;

    assert_eq!(video["controls"], false);
    assert_eq!(video["videoUrl"], format!("{}/filtered.mp4?tr=q-70", CDN_BASE));
}

#[tokio::test]
async fn list_and_get_by_id() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let user = app.create_user("vid_list").await;
    let video = app.create_video(&user, video_body("listed")).await;
    let id = video["id"].as_str().unwrap();

    let resp = app.get("/api/video", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp
        .json()
        .as_array()
        .unwrap()
        .iter()
        .any(|item| item["id"] == id));

    let resp = app.get(&format!("/api/video?id={}", id), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["title"], "Video listed");
}

#[tokio::test]
async fn owner_updates_and_others_cannot() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let owner = app.create_user("vid_owner").await;
    let intruder = app.create_user("vid_intruder").await;
    let video = app.create_video(&owner, video_body("owned")).await;
    let path = format!("/api/video?id={}", video["id"].as_str().unwrap());

    let resp = app
        .put_json(&path, json!({ "controls": false }), Some(&intruder.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.error_message(), "video not found or access denied");

    let resp = app.delete(&path, Some(&intruder.access_token)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = app
        .put_json(
            &path,
            json!({ "controls": false, "transformation": { "aspectRatio": "1:1" } }),
            Some(&owner.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["controls"], false);
    assert_eq!(body["videoUrl"], format!("{}/owned.mp4?tr=ar-1-1,c-at_max", CDN_BASE));
}

#[tokio::test]
async fn owner_can_delete() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let user = app.create_user("vid_delete").await;
    let video = app.create_video(&user, video_body("gone")).await;
    let path = format!("/api/video?id={}", video["id"].as_str().unwrap());

    let resp = app.delete(&path, Some(&user.access_token)).await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app.get(&path, None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.error_message(), "video not found");
}
