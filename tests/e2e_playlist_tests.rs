//! End-to-end tests for playlists and their ordered entries

mod common;

use common::{TestClient, TestServer};
use reqwest::StatusCode;
use serde_json::{json, Value};

fn entry_video_ids(entries: &[Value]) -> Vec<i64> {
    entries
        .iter()
        .map(|e| e["video"]["id"].as_i64().unwrap())
        .collect()
}

fn entry_positions(entries: &[Value]) -> Vec<i64> {
    entries
        .iter()
        .map(|e| e["membership"]["position"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_create_and_get_playlist() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client
        .create_playlist("  Morning loop  ", Some("Lobby screen"))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let playlist: Value = response.json().await.unwrap();
    assert_eq!(playlist["name"], "Morning loop");
    assert_eq!(playlist["description"], "Lobby screen");

    let id = playlist["id"].as_i64().unwrap();
    let fetched: Value = client.get_playlist(id, false).await.json().await.unwrap();
    assert_eq!(fetched["name"], "Morning loop");
    assert!(fetched.get("videos").is_none());

    let fetched: Value = client.get_playlist(id, true).await.json().await.unwrap();
    assert_eq!(fetched["videos"], json!([]));
}

#[tokio::test]
async fn test_create_playlist_requires_name() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.create_playlist("   ", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("name"));
}

#[tokio::test]
async fn test_list_playlists_with_video_counts() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    let video_id = client.upload_test_video("clip.mp4").await;
    let first = client.create_test_playlist("First").await;
    let second = client.create_test_playlist("Second").await;
    client.add_test_playlist_video(second, video_id).await;
    client.add_test_playlist_video(second, video_id).await;

    let playlists: Vec<Value> = client.list_playlists().await.json().await.unwrap();
    assert_eq!(playlists.len(), 2);
    let count_of = |id: i64| {
        playlists
            .iter()
            .find(|p| p["id"] == id)
            .map(|p| p["video_count"].as_u64().unwrap())
            .unwrap()
    };
    assert_eq!(count_of(first), 0);
    assert_eq!(count_of(second), 2);
}

#[tokio::test]
async fn test_update_playlist() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    let response = client.create_playlist("Old", Some("desc")).await;
    let id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let response = client.update_playlist(id, json!({ "name": "New" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let playlist: Value = response.json().await.unwrap();
    assert_eq!(playlist["name"], "New");
    assert_eq!(playlist["description"], "desc");

    let response = client
        .update_playlist(id, json!({ "description": null }))
        .await;
    let playlist: Value = response.json().await.unwrap();
    assert_eq!(playlist["name"], "New");
    assert!(playlist["description"].is_null());

    let response = client.update_playlist(id, json!({ "name": "" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_playlist() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    let id = client.create_test_playlist("Gone soon").await;

    let response = client.delete_playlist(id).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(client.get_playlist(id, false).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(client.delete_playlist(id).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_playlists_are_private_to_owner() {
    let server = TestServer::spawn().await;
    let owner = TestClient::authenticated(server.base_url.clone()).await;
    let other = TestClient::authenticated_other(server.base_url.clone()).await;
    let id = owner.create_test_playlist("Mine").await;
    let other_video = other.upload_test_video("theirs.mp4").await;

    assert_eq!(other.get_playlist(id, false).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        other.list_playlist_videos(id).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        other.add_playlist_video(id, other_video).await.status(),
        StatusCode::NOT_FOUND
    );
    // Owner can't add someone else's video either
    assert_eq!(
        owner.add_playlist_video(id, other_video).await.status(),
        StatusCode::NOT_FOUND
    );
    let playlists: Vec<Value> = other.list_playlists().await.json().await.unwrap();
    assert!(playlists.is_empty());
}

#[tokio::test]
async fn test_add_videos_appends_in_order() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    let a = client.upload_test_video("a.mp4").await;
    let b = client.upload_test_video("b.mp4").await;
    let id = client.create_test_playlist("Lobby").await;

    let response = client.add_playlist_video(id, a).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let membership: Value = response.json().await.unwrap();
    assert_eq!(membership["position"], 1);
    assert_eq!(membership["video_id"], a);

    client.add_test_playlist_video(id, b).await;
    client.add_test_playlist_video(id, a).await;

    let entries: Vec<Value> = client.list_playlist_videos(id).await.json().await.unwrap();
    assert_eq!(entry_video_ids(&entries), vec![a, b, a]);
    assert_eq!(entry_positions(&entries), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_remove_entries_keeps_positions_dense() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    let a = client.upload_test_video("a.mp4").await;
    let b = client.upload_test_video("b.mp4").await;
    let c = client.upload_test_video("c.mp4").await;
    let id = client.create_test_playlist("Lobby").await;
    client.add_test_playlist_video(id, a).await;
    let m_b = client.add_test_playlist_video(id, b).await;
    client.add_test_playlist_video(id, c).await;
    client.add_test_playlist_video(id, a).await;

    let response = client.remove_playlist_entry(id, m_b).await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["removed"], true);

    let entries: Vec<Value> = client.list_playlist_videos(id).await.json().await.unwrap();
    assert_eq!(entry_video_ids(&entries), vec![a, c, a]);
    assert_eq!(entry_positions(&entries), vec![1, 2, 3]);

    // Removing by video id drops only the first occurrence
    let body: Value = client
        .remove_playlist_video(id, a)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["removed"], true);
    let entries: Vec<Value> = client.list_playlist_videos(id).await.json().await.unwrap();
    assert_eq!(entry_video_ids(&entries), vec![c, a]);
    assert_eq!(entry_positions(&entries), vec![1, 2]);

    let body: Value = client
        .remove_playlist_entry(id, m_b)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["removed"], false);
}

#[tokio::test]
async fn test_reorder_entries() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    let a = client.upload_test_video("a.mp4").await;
    let b = client.upload_test_video("b.mp4").await;
    let c = client.upload_test_video("c.mp4").await;
    let id = client.create_test_playlist("Lobby").await;
    let m_a = client.add_test_playlist_video(id, a).await;
    let m_b = client.add_test_playlist_video(id, b).await;
    let m_c = client.add_test_playlist_video(id, c).await;

    let response = client.reorder_playlist(id, &[m_c, m_a, m_b]).await;
    assert_eq!(response.status(), StatusCode::OK);
    let entries: Vec<Value> = response.json().await.unwrap();
    assert_eq!(entry_video_ids(&entries), vec![c, a, b]);
    assert_eq!(entry_positions(&entries), vec![1, 2, 3]);

    // Partial list: the rest follows in its previous order
    let entries: Vec<Value> = client
        .reorder_playlist(id, &[m_b])
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(entry_video_ids(&entries), vec![b, c, a]);
}

#[tokio::test]
async fn test_reorder_rejects_non_sequence_payload() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    let a = client.upload_test_video("a.mp4").await;
    let b = client.upload_test_video("b.mp4").await;
    let id = client.create_test_playlist("Lobby").await;
    client.add_test_playlist_video(id, a).await;
    client.add_test_playlist_video(id, b).await;

    for payload in [json!({ "membership_ids": 5 }), json!({ "membership_ids": ["x"] })] {
        let response = client.reorder_playlist_raw(id, payload.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", payload);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].is_string(), "{}", payload);
    }

    // Order is untouched
    let entries: Vec<Value> = client
        .list_playlist_videos(id)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(entry_video_ids(&entries), vec![a, b]);
}

#[tokio::test]
async fn test_deleting_playlist_clears_schedule_slot() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    let id = client.create_test_playlist("Monday").await;

    let response = client
        .update_player_settings(json!({ "monday_playlist_id": id }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    client.delete_playlist(id).await;

    let settings: Value = client.get_player_settings().await.json().await.unwrap();
    assert!(settings["monday_playlist_id"].is_null());
}
