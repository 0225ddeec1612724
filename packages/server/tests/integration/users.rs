use serde_json::json;

use crate::common::{PROTECTED_PASSWORD, PROTECTED_USER, TestApp, routes};

#[tokio::test]
async fn list_users_shows_names_without_credentials() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "securepass").await;

    let res = app.get_with_token(routes::USERS, &token).await;

    assert_eq!(res.status, 200);
    let users = res.body.as_array().unwrap();
    let names: Vec<&str> = users.iter().map(|u| u["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["alice", PROTECTED_USER]);
    for user in users {
        assert!(user["id"].is_string());
        assert!(user.get("password_hash").is_none());
    }
}

#[tokio::test]
async fn protected_user_cannot_be_deleted_in_any_spelling() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "securepass").await;

    for name in [PROTECTED_USER, "STAR", "Star"] {
        let res = app.delete_with_token(&routes::user(name), &token).await;
        assert_eq!(res.status, 403, "{name}: {}", res.text);
        assert_eq!(res.body["code"], "PROHIBITED_ACTION");
    }

    assert_eq!(app.login(PROTECTED_USER, PROTECTED_PASSWORD).await.status, 200);
}

#[tokio::test]
async fn protected_user_cannot_delete_itself() {
    let app = TestApp::spawn().await;
    let token = app.protected_user_token().await;

    let res = app
        .delete_with_token(&routes::user(PROTECTED_USER), &token)
        .await;

    assert_eq!(res.status, 403);
    assert_eq!(app.get_with_token(routes::ME, &token).await.status, 200);
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "securepass").await;

    let res = app.delete_with_token(&routes::user("ghost"), &token).await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn deleting_a_user_removes_everything_they_own() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice", "securepass").await;
    let bob = app.create_authenticated_user("bob", "securepass").await;

    let trip = app.create_collection(&bob, "Trip").await;
    let home = app.create_collection(&bob, "Home").await;
    let a = app.upload_png(&bob, "a.png").await;
    let b = app.upload_png(&bob, "b.png").await;
    app.add_photo(&bob, &trip, &a, "A").await;
    app.add_photo(&bob, &home, &b, "B").await;
    let kept = app.upload_png(&alice, "mine.png").await;

    let res = app.delete_with_token(&routes::user("bob"), &alice).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["name"], "bob");
    assert_eq!(res.body["session_ended"], false);
    // two photos, two collections, one user
    assert_eq!(res.body["documents_deleted"], 5);
    assert_eq!(res.body["blobs_deleted"].as_array().unwrap().len(), 2);
    assert_eq!(res.body["warnings"], json!([]));

    assert_eq!(app.blob_store().len(), 1);
    assert!(app.blob_store().get(&kept).is_some());

    let me = app.get_with_token(routes::ME, &bob).await;
    assert_eq!(me.status, 401);
    assert_eq!(app.login("bob", "securepass").await.status, 401);

    let users = app.get_with_token(routes::USERS, &alice).await;
    let names: Vec<&str> = users
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["alice", PROTECTED_USER]);
}

#[tokio::test]
async fn deleting_yourself_ends_your_session() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "securepass").await;
    app.create_collection(&token, "Trip").await;

    let res = app.delete_with_token(&routes::user("Alice"), &token).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["name"], "alice");
    assert_eq!(res.body["session_ended"], true);
    assert_eq!(app.get_with_token(routes::ME, &token).await.status, 401);
}

#[tokio::test]
async fn a_deleted_name_can_be_registered_again() {
    let app = TestApp::spawn().await;
    let admin = app.protected_user_token().await;
    let old = app.create_authenticated_user("alice", "securepass").await;
    app.create_collection(&old, "Old stuff").await;

    app.delete_with_token(&routes::user("alice"), &admin).await;
    let fresh = app.create_authenticated_user("alice", "newpass").await;

    let tree = app.get_with_token(routes::COLLECTIONS, &fresh).await;
    assert_eq!(tree.body, json!([]));
}

#[tokio::test]
async fn blob_cleanup_failure_does_not_stop_user_deletion() {
    let app = TestApp::spawn_with_storage(false).await;
    let alice = app.create_authenticated_user("alice", "securepass").await;
    let bob = app.create_authenticated_user("bob", "securepass").await;
    let trip = app.create_collection(&bob, "Trip").await;
    app.add_photo(&bob, &trip, "https://cdn.example.com/a.jpg", "A")
        .await;

    let res = app.delete_with_token(&routes::user("bob"), &alice).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["documents_deleted"], 3);
    assert_eq!(res.body["blobs_deleted"], json!([]));
    assert_eq!(res.body["warnings"].as_array().unwrap().len(), 1);
    assert_eq!(app.login("bob", "securepass").await.status, 401);
}
