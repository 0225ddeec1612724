use std::time::Duration;

use common::docstore::{CollectionPath, DocumentStore, Query};
use serde_json::json;

use crate::common::{TestApp, routes};

mod collections {
    use super::*;

    #[tokio::test]
    async fn created_collection_appears_in_the_owners_tree() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let res = app
            .post_with_token(routes::COLLECTIONS, &json!({"title": "  Summer  "}), &token)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["title"], "Summer");
        assert_eq!(res.body["owner_name"], "alice");

        let tree = app.get_with_token(routes::COLLECTIONS, &token).await;
        assert_eq!(tree.status, 200);
        let list = tree.body.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["id"], res.body["id"]);
        assert_eq!(list[0]["photos"], json!([]));
    }

    #[tokio::test]
    async fn tree_lists_newest_collection_first() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        app.create_collection(&token, "First").await;
        app.create_collection(&token, "Second").await;

        let tree = app.get_with_token(routes::COLLECTIONS, &token).await;

        let titles: Vec<&str> = tree
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, ["Second", "First"]);
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let res = app
            .post_with_token(routes::COLLECTIONS, &json!({"title": "   "}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn other_users_collections_are_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;
        let id = app.create_collection(&alice, "Private").await;

        let get = app.get_with_token(&routes::collection(&id), &bob).await;
        assert_eq!(get.status, 404);
        assert_eq!(get.body["code"], "NOT_FOUND");

        let delete = app.delete_with_token(&routes::collection(&id), &bob).await;
        assert_eq!(delete.status, 404);

        let tree = app.get_with_token(routes::COLLECTIONS, &bob).await;
        assert_eq!(tree.body, json!([]));
        assert_eq!(
            app.get_with_token(&routes::collection(&id), &alice).await.status,
            200
        );
    }

    #[tokio::test]
    async fn rename_updates_the_title() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_collection(&token, "Old").await;

        let res = app
            .patch_with_token(&routes::collection(&id), &json!({"title": "New"}), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"], "New");
        let get = app.get_with_token(&routes::collection(&id), &token).await;
        assert_eq!(get.body["title"], "New");
    }

    #[tokio::test]
    async fn unknown_collection_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let res = app
            .get_with_token(&routes::collection("does-not-exist"), &token)
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn delete_removes_photos_variants_and_blobs() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_collection(&token, "Trip").await;
        let photo_url = app.upload_png(&token, "beach.png").await;
        let thumb_url = app.upload_png(&token, "beach-thumb.png").await;
        let photo_id = app.add_photo(&token, &id, &photo_url, "Beach").await;
        let variants = app
            .post_with_token(
                &routes::variants(&id, &photo_id),
                &json!({"variants": [{"src": thumb_url}]}),
                &token,
            )
            .await;
        assert_eq!(variants.status, 201, "{}", variants.text);

        let res = app.delete_with_token(&routes::collection(&id), &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["documents_deleted"], 3);
        assert_eq!(res.body["warnings"], json!([]));
        let mut deleted: Vec<String> = res.body["blobs_deleted"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u.as_str().unwrap().to_string())
            .collect();
        deleted.sort();
        let mut expected = vec![photo_url.clone(), thumb_url.clone()];
        expected.sort();
        assert_eq!(deleted, expected);

        assert!(app.blob_store().is_empty());
        assert_eq!(
            app.get_with_token(&routes::collection(&id), &token).await.status,
            404
        );
        let photos = CollectionPath::parse(&format!("collections/{id}/photos")).unwrap();
        assert!(app.docs.query(&photos, &Query::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_without_object_storage_still_removes_documents() {
        let app = TestApp::spawn_with_storage(false).await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_collection(&token, "Trip").await;
        app.add_photo(&token, &id, "https://cdn.example.com/a.jpg", "A")
            .await;

        let res = app.delete_with_token(&routes::collection(&id), &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["documents_deleted"], 2);
        assert_eq!(res.body["blobs_deleted"], json!([]));
        assert_eq!(res.body["warnings"].as_array().unwrap().len(), 1);
        assert_eq!(
            app.get_with_token(&routes::collection(&id), &token).await.status,
            404
        );
    }

    #[tokio::test]
    async fn linked_sources_do_not_block_cleanup_of_uploads() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_collection(&token, "Trip").await;
        let own = app.upload_png(&token, "own.png").await;
        app.add_photo(&token, &id, &own, "Own").await;
        app.add_photo(&token, &id, "https://example.com/x.jpg", "Linked")
            .await;

        let res = app.delete_with_token(&routes::collection(&id), &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["documents_deleted"], 3);
        assert_eq!(res.body["blobs_deleted"], json!([own]));
        let warnings = res.body["warnings"].as_array().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].as_str().unwrap().contains("https://example.com/x.jpg"));
        assert!(app.blob_store().is_empty());
    }
}

mod photos {
    use super::*;

    #[tokio::test]
    async fn added_photos_are_returned_with_ids() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_collection(&token, "Trip").await;

        let res = app
            .post_with_token(
                &routes::photos(&id),
                &json!({"photos": [
                    {"src": "https://cdn.example.com/a.jpg", "title": "A"},
                    {"src": "https://cdn.example.com/b.jpg", "title": "B"},
                ]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["photos"].as_array().unwrap().len(), 2);
        assert_eq!(res.body["failures"], json!([]));
        for photo in res.body["photos"].as_array().unwrap() {
            assert!(photo["id"].is_string());
            assert_eq!(photo["collection_id"], id.as_str());
        }
    }

    #[tokio::test]
    async fn invalid_item_rejects_the_whole_request() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_collection(&token, "Trip").await;

        let res = app
            .post_with_token(
                &routes::photos(&id),
                &json!({"photos": [
                    {"src": "https://cdn.example.com/a.jpg", "title": "A"},
                    {"src": "  ", "title": "B"},
                ]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        let view = app.get_with_token(&routes::collection(&id), &token).await;
        assert_eq!(view.body["photos"], json!([]));
    }

    #[tokio::test]
    async fn adding_to_another_users_collection_is_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;
        let id = app.create_collection(&alice, "Trip").await;

        let res = app
            .post_with_token(
                &routes::photos(&id),
                &json!({"photos": [{"src": "https://cdn.example.com/a.jpg", "title": "A"}]}),
                &bob,
            )
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn reorder_puts_photos_in_the_given_order() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_collection(&token, "Trip").await;
        let a = app.add_photo(&token, &id, "https://cdn.example.com/a.jpg", "A").await;
        let b = app.add_photo(&token, &id, "https://cdn.example.com/b.jpg", "B").await;
        let c = app.add_photo(&token, &id, "https://cdn.example.com/c.jpg", "C").await;

        let res = app
            .put_with_token(
                &routes::photos_reorder(&id),
                &json!({"photo_ids": [b, c, a]}),
                &token,
            )
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        let view = app.get_with_token(&routes::collection(&id), &token).await;
        let titles: Vec<&str> = view.body["photos"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, ["B", "C", "A"]);
        assert_eq!(view.body["photos"][0]["order"], 0);
    }

    #[tokio::test]
    async fn reorder_rejects_duplicates() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_collection(&token, "Trip").await;
        let a = app.add_photo(&token, &id, "https://cdn.example.com/a.jpg", "A").await;

        let res = app
            .put_with_token(
                &routes::photos_reorder(&id),
                &json!({"photo_ids": [a, a]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn rename_and_delete_a_photo() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_collection(&token, "Trip").await;
        let url = app.upload_png(&token, "a.png").await;
        let photo_id = app.add_photo(&token, &id, &url, "A").await;

        let renamed = app
            .patch_with_token(
                &routes::photo(&id, &photo_id),
                &json!({"title": "Sunset"}),
                &token,
            )
            .await;
        assert_eq!(renamed.status, 200, "{}", renamed.text);
        assert_eq!(renamed.body["title"], "Sunset");

        let deleted = app
            .delete_with_token(&routes::photo(&id, &photo_id), &token)
            .await;
        assert_eq!(deleted.status, 200, "{}", deleted.text);
        assert_eq!(deleted.body["documents_deleted"], 1);
        assert_eq!(deleted.body["blobs_deleted"], json!([url]));
        assert!(app.blob_store().is_empty());

        let again = app
            .delete_with_token(&routes::photo(&id, &photo_id), &token)
            .await;
        assert_eq!(again.status, 404);
    }

    #[tokio::test]
    async fn variants_are_listed_under_their_photo_and_deleted_alone() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_collection(&token, "Trip").await;
        let photo_id = app
            .add_photo(&token, &id, "https://cdn.example.com/a.jpg", "A")
            .await;
        let thumb = app.upload_png(&token, "thumb.png").await;

        let added = app
            .post_with_token(
                &routes::variants(&id, &photo_id),
                &json!({"variants": [{"src": thumb}]}),
                &token,
            )
            .await;
        assert_eq!(added.status, 201, "{}", added.text);
        let variant_id = added.body["variants"][0]["id"].as_str().unwrap().to_string();

        let view = app.get_with_token(&routes::collection(&id), &token).await;
        assert_eq!(view.body["photos"][0]["variants"][0]["src"], thumb.as_str());

        let deleted = app
            .delete_with_token(&routes::variant(&id, &photo_id, &variant_id), &token)
            .await;
        assert_eq!(deleted.status, 200, "{}", deleted.text);
        assert_eq!(deleted.body["blobs_deleted"], json!([thumb]));

        let view = app.get_with_token(&routes::collection(&id), &token).await;
        assert_eq!(view.body["photos"][0]["variants"], json!([]));
        assert_eq!(view.body["photos"][0]["title"], "A");
    }

    #[tokio::test]
    async fn deleting_a_photo_never_removes_another_users_upload() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;
        let url = app.upload_png(&alice, "beach.png").await;
        let id = app.create_collection(&bob, "Borrowed").await;
        let photo_id = app.add_photo(&bob, &id, &url, "Not mine").await;

        let res = app
            .delete_with_token(&routes::photo(&id, &photo_id), &bob)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["documents_deleted"], 1);
        assert_eq!(res.body["blobs_deleted"], json!([]));
        assert_eq!(res.body["warnings"].as_array().unwrap().len(), 1);
        assert!(app.blob_store().get(&url).is_some());
    }

    #[tokio::test]
    async fn deleting_a_variant_never_removes_another_users_upload() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;
        let url = app.upload_png(&alice, "thumb.png").await;
        let id = app.create_collection(&bob, "Borrowed").await;
        let own = app.upload_png(&bob, "own.png").await;
        let photo_id = app.add_photo(&bob, &id, &own, "Mine").await;
        let added = app
            .post_with_token(
                &routes::variants(&id, &photo_id),
                &json!({"variants": [{"src": url}]}),
                &bob,
            )
            .await;
        assert_eq!(added.status, 201, "{}", added.text);
        let variant_id = added.body["variants"][0]["id"].as_str().unwrap().to_string();

        let res = app
            .delete_with_token(&routes::variant(&id, &photo_id, &variant_id), &bob)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["blobs_deleted"], json!([]));
        assert_eq!(res.body["warnings"].as_array().unwrap().len(), 1);
        assert!(app.blob_store().get(&url).is_some());
        assert!(app.blob_store().get(&own).is_some());
    }

    #[tokio::test]
    async fn variants_for_a_missing_photo_are_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_collection(&token, "Trip").await;

        let res = app
            .post_with_token(
                &routes::variants(&id, "missing"),
                &json!({"variants": [{"src": "https://cdn.example.com/t.jpg"}]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 404);
    }
}

mod live {
    use super::*;

    /// Read from the event stream until `needle` shows up.
    async fn read_until(res: &mut reqwest::Response, buffer: &mut String, needle: &str) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !buffer.contains(needle) {
                let chunk = res
                    .chunk()
                    .await
                    .expect("stream error")
                    .expect("stream ended early");
                buffer.push_str(&String::from_utf8_lossy(&chunk));
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {needle:?}; got {buffer:?}"));
    }

    #[tokio::test]
    async fn events_stream_sends_a_snapshot_after_each_change() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let mut res = app
            .client
            .get(app.url("/api/v1/collections/events"))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        assert!(
            res.headers()["content-type"]
                .to_str()
                .unwrap()
                .starts_with("text/event-stream")
        );

        let mut buffer = String::new();
        read_until(&mut res, &mut buffer, "event: snapshot").await;
        buffer.clear();

        app.create_collection(&token, "Live Update").await;

        read_until(&mut res, &mut buffer, "Live Update").await;
        assert!(buffer.contains("event: snapshot"));
    }

    #[tokio::test]
    async fn events_stream_requires_a_session() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token("/api/v1/collections/events").await;

        assert_eq!(res.status, 401);
    }
}
