use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn uploaded_images_are_stored_under_the_owner() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "securepass").await;

    let res = app
        .upload_with_token(
            &[
                ("beach.png", "image/png", b"png-bytes"),
                ("my pic.jpg", "image/jpeg", b"jpeg-bytes"),
            ],
            &token,
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    let urls = res.body["urls"].as_array().unwrap();
    assert_eq!(urls.len(), 2);
    let first = urls[0].as_str().unwrap();
    let second = urls[1].as_str().unwrap();
    assert!(first.contains("/alice/"), "{first}");
    assert!(first.ends_with("-beach.png"), "{first}");
    assert!(second.ends_with("-my-pic.jpg"), "{second}");

    let store = app.blob_store();
    assert_eq!(store.get(first).unwrap(), b"png-bytes");
    assert_eq!(store.content_type(first).as_deref(), Some("image/png"));
}

#[tokio::test]
async fn non_image_uploads_are_refused_and_nothing_is_kept() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "securepass").await;

    let res = app
        .upload_with_token(
            &[
                ("beach.png", "image/png", b"png-bytes"),
                ("notes.txt", "text/plain", b"hello"),
            ],
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    assert!(app.blob_store().is_empty());
}

#[tokio::test]
async fn upload_without_files_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "securepass").await;

    let res = app.upload_with_token(&[], &token).await;

    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn upload_without_object_storage_is_a_configuration_error() {
    let app = TestApp::spawn_with_storage(false).await;
    let token = app.create_authenticated_user("alice", "securepass").await;

    let res = app
        .upload_with_token(&[("beach.png", "image/png", b"png-bytes")], &token)
        .await;

    assert_eq!(res.status, 500);
    assert_eq!(res.body["code"], "CONFIGURATION_ERROR");
}

#[tokio::test]
async fn upload_requires_a_session() {
    let app = TestApp::spawn().await;

    let res = app
        .upload_with_token(&[("beach.png", "image/png", b"png-bytes")], "bogus")
        .await;

    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn bulk_delete_removes_own_uploads() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "securepass").await;
    let a = app.upload_png(&token, "a.png").await;
    let b = app.upload_png(&token, "b.png").await;

    let res = app
        .delete_json_with_token(routes::UPLOAD, &json!({"urls": [a, b]}), &token)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["deleted"], 2);
    assert!(app.blob_store().is_empty());
}

#[tokio::test]
async fn bulk_delete_rejects_malformed_bodies() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "securepass").await;

    for body in [json!({}), json!({"urls": "nope"}), json!({"urls": []})] {
        let res = app.delete_json_with_token(routes::UPLOAD, &body, &token).await;
        assert_eq!(res.status, 400, "{body}: {}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn bulk_delete_refuses_other_users_uploads() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice", "securepass").await;
    let bob = app.create_authenticated_user("bob", "securepass").await;
    let url = app.upload_png(&alice, "a.png").await;

    let res = app
        .delete_json_with_token(routes::UPLOAD, &json!({"urls": [url]}), &bob)
        .await;

    assert_eq!(res.status, 403);
    assert_eq!(app.blob_store().len(), 1);
}

#[tokio::test]
async fn a_name_matching_a_url_segment_grants_no_access() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice", "securepass").await;
    let objects = app.create_authenticated_user("objects", "securepass").await;
    let url = app.upload_png(&alice, "beach.png").await;

    let res = app
        .delete_json_with_token(routes::UPLOAD, &json!({"urls": [url]}), &objects)
        .await;

    assert_eq!(res.status, 403, "{}", res.text);
    assert_eq!(res.body["code"], "PROHIBITED_ACTION");
    assert!(app.blob_store().get(&url).is_some());
}

#[tokio::test]
async fn bulk_delete_rejects_urls_outside_object_storage() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "securepass").await;
    let kept = app.upload_png(&token, "a.png").await;

    let res = app
        .delete_json_with_token(
            routes::UPLOAD,
            &json!({"urls": [kept, "https://example.com/alice/a.png"]}),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    assert_eq!(app.blob_store().len(), 1);
}

#[tokio::test]
async fn bulk_delete_without_object_storage_is_a_configuration_error() {
    let app = TestApp::spawn_with_storage(false).await;
    let token = app.create_authenticated_user("alice", "securepass").await;

    let res = app
        .delete_json_with_token(
            routes::UPLOAD,
            &json!({"urls": ["memory://objects/alice/x-a.png"]}),
            &token,
        )
        .await;

    assert_eq!(res.status, 500);
    assert_eq!(res.body["code"], "CONFIGURATION_ERROR");
}

#[tokio::test]
async fn title_generation_without_configuration_is_reported() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "securepass").await;

    let invalid = app
        .post_with_token(
            routes::TITLES,
            &json!({"photo_data_uri": "https://example.com/a.jpg"}),
            &token,
        )
        .await;
    assert_eq!(invalid.status, 400);

    let res = app
        .post_with_token(
            routes::TITLES,
            &json!({"photo_data_uri": "data:image/png;base64,iVBORw0KGgo="}),
            &token,
        )
        .await;
    assert_eq!(res.status, 500);
    assert_eq!(res.body["code"], "CONFIGURATION_ERROR");
}
