//! End-to-end tests for the weekly schedule and attended playback

mod common;

use common::{TestClient, TestServer, TEST_USER_ID};
use reqwest::StatusCode;
use serde_json::{json, Value};

const DAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

#[tokio::test]
async fn test_schedule_created_on_first_read() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.get_player_settings().await;
    assert_eq!(response.status(), StatusCode::OK);
    let settings: Value = response.json().await.unwrap();
    assert_eq!(settings["user_id"], TEST_USER_ID);
    assert_eq!(settings["loop_playlist"], false);
    for day in DAYS {
        assert!(settings[format!("{}_playlist_id", day)].is_null());
    }

    // Reading again returns the same row
    let again: Value = client.get_player_settings().await.json().await.unwrap();
    assert_eq!(again["id"], settings["id"]);
}

#[tokio::test]
async fn test_partial_schedule_update() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    let morning = client.create_test_playlist("Morning").await;
    let weekend = client.create_test_playlist("Weekend").await;

    let response = client
        .update_player_settings(json!({
            "monday_playlist_id": morning,
            "saturday_playlist_id": weekend,
            "loop_playlist": true,
        }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let settings: Value = response.json().await.unwrap();
    assert_eq!(settings["monday_playlist_id"], morning);
    assert_eq!(settings["saturday_playlist_id"], weekend);
    assert_eq!(settings["loop_playlist"], true);

    // Absent keys stay, explicit null clears
    let settings: Value = client
        .update_player_settings(json!({ "monday_playlist_id": null }))
        .await
        .json()
        .await
        .unwrap();
    assert!(settings["monday_playlist_id"].is_null());
    assert_eq!(settings["saturday_playlist_id"], weekend);
    assert_eq!(settings["loop_playlist"], true);
}

#[tokio::test]
async fn test_schedule_rejects_foreign_or_unknown_playlist() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    let other = TestClient::authenticated_other(server.base_url.clone()).await;
    let theirs = other.create_test_playlist("Theirs").await;

    let response = client
        .update_player_settings(json!({ "friday_playlist_id": theirs }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .update_player_settings(json!({ "friday_playlist_id": 9999 }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let settings: Value = client.get_player_settings().await.json().await.unwrap();
    assert!(settings["friday_playlist_id"].is_null());
}

#[tokio::test]
async fn test_schedule_rejects_unknown_fields() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client
        .update_player_settings(json!({ "funday_playlist_id": 1 }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_schedules_are_per_user() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    let other = TestClient::authenticated_other(server.base_url.clone()).await;
    let mine = client.create_test_playlist("Mine").await;

    client
        .update_player_settings(json!({ "tuesday_playlist_id": mine }))
        .await;

    let theirs: Value = other.get_player_settings().await.json().await.unwrap();
    assert!(theirs["tuesday_playlist_id"].is_null());
}

#[tokio::test]
async fn test_today_resolves_bound_playlist() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let today: Value = client.get_today().await.json().await.unwrap();
    let weekday = today["weekday"].as_str().unwrap().to_string();
    assert!(DAYS.contains(&weekday.as_str()));
    assert!(today["playlist_id"].is_null());

    let id = client.create_test_playlist("Today").await;
    let mut update = serde_json::Map::new();
    for day in DAYS {
        update.insert(format!("{}_playlist_id", day), json!(id));
    }
    client.update_player_settings(Value::Object(update)).await;

    let today: Value = client.get_today().await.json().await.unwrap();
    assert_eq!(today["playlist_id"], id);
}

#[tokio::test]
async fn test_attended_next_stops_without_loop() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    let a = client.upload_test_video("a.mp4").await;
    let b = client.upload_test_video("b.mp4").await;
    let id = client.create_test_playlist("Lobby").await;
    client.add_test_playlist_video(id, a).await;
    client.add_test_playlist_video(id, b).await;

    let body: Value = client.player_next(id, 0, "ended").await.json().await.unwrap();
    assert_eq!(body["next"], json!({ "play": 1 }));

    let body: Value = client.player_next(id, 1, "ended").await.json().await.unwrap();
    assert_eq!(body["next"], "stop");

    client
        .update_player_settings(json!({ "loop_playlist": true }))
        .await;
    let body: Value = client.player_next(id, 1, "error").await.json().await.unwrap();
    assert_eq!(body["next"], json!({ "play": 0 }));
}

#[tokio::test]
async fn test_attended_next_edge_cases() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;
    let id = client.create_test_playlist("Empty").await;

    let body: Value = client.player_next(id, 0, "ended").await.json().await.unwrap();
    assert_eq!(body["next"], "empty");

    let video = client.upload_test_video("a.mp4").await;
    client.add_test_playlist_video(id, video).await;
    let response = client.player_next(id, 5, "ended").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client.player_next(id, 0, "bored").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client.player_next(9999, 0, "ended").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
