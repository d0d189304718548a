//! HTTP client for end-to-end tests
//!
//! Wraps reqwest and provides methods for the server endpoints.
//! When API routes or request formats change, update only this file.

#![allow(dead_code)]

use super::constants::*;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unauthenticated client
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true) // Automatically handle session cookies
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client logged in as `TEST_USER`.
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String) -> Self {
        Self::authenticated_as(base_url, TEST_USER, TEST_PASS).await
    }

    /// Creates a client logged in as `OTHER_USER`.
    pub async fn authenticated_other(base_url: String) -> Self {
        Self::authenticated_as(base_url, OTHER_USER, OTHER_PASS).await
    }

    async fn authenticated_as(base_url: String, email: &str, password: &str) -> Self {
        let client = Self::new(base_url);

        let response = client.login(email, password).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Test user authentication failed: {:?}",
            response.text().await
        );

        client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /v1/auth/login
    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/v1/auth/login"))
            .json(&json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// POST /v1/auth/logout
    pub async fn logout(&self) -> Response {
        self.client
            .post(self.url("/v1/auth/logout"))
            .send()
            .await
            .expect("Logout request failed")
    }

    /// GET /
    pub async fn home(&self) -> Response {
        self.client
            .get(self.url("/"))
            .send()
            .await
            .expect("Home request failed")
    }

    // ========================================================================
    // Video Endpoints
    // ========================================================================

    /// POST /v1/videos/upload
    pub async fn upload_video_bytes(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
        duration: Option<f64>,
    ) -> Response {
        let part = Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .expect("Invalid content type");
        let mut form = Form::new().part("file", part);
        if let Some(duration) = duration {
            form = form.text("duration", duration.to_string());
        }
        self.client
            .post(self.url("/v1/videos/upload"))
            .multipart(form)
            .send()
            .await
            .expect("Upload request failed")
    }

    /// Uploads `TEST_VIDEO_BYTES` as an mp4 and returns the created video id.
    pub async fn upload_test_video(&self, filename: &str) -> i64 {
        let response = self
            .upload_video_bytes(filename, "video/mp4", TEST_VIDEO_BYTES.to_vec(), Some(12.5))
            .await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let video: Value = response.json().await.expect("Invalid upload response");
        video["id"].as_i64().expect("Missing video id")
    }

    /// GET /v1/videos
    pub async fn list_videos(&self) -> Response {
        self.client
            .get(self.url("/v1/videos"))
            .send()
            .await
            .expect("List videos request failed")
    }

    /// GET /v1/videos/{id}
    pub async fn get_video(&self, id: i64) -> Response {
        self.client
            .get(self.url(&format!("/v1/videos/{}", id)))
            .send()
            .await
            .expect("Get video request failed")
    }

    /// DELETE /v1/videos/{id}
    pub async fn delete_video(&self, id: i64) -> Response {
        self.client
            .delete(self.url(&format!("/v1/videos/{}", id)))
            .send()
            .await
            .expect("Delete video request failed")
    }

    /// POST /v1/videos/{id}/thumbnail
    pub async fn set_thumbnail(&self, id: i64, thumbnail_data: &str) -> Response {
        self.client
            .post(self.url(&format!("/v1/videos/{}/thumbnail", id)))
            .json(&json!({ "thumbnail_data": thumbnail_data }))
            .send()
            .await
            .expect("Set thumbnail request failed")
    }

    // ========================================================================
    // Media Endpoints
    // ========================================================================

    /// GET /v1/media/videos/{id}
    pub async fn stream_video(&self, id: i64, range: Option<&str>) -> Response {
        let mut request = self.client.get(self.url(&format!("/v1/media/videos/{}", id)));
        if let Some(range) = range {
            request = request.header("Range", range);
        }
        request.send().await.expect("Stream request failed")
    }

    /// GET /v1/media/videos/{id}/thumbnail
    pub async fn get_thumbnail(&self, id: i64) -> Response {
        self.client
            .get(self.url(&format!("/v1/media/videos/{}/thumbnail", id)))
            .send()
            .await
            .expect("Thumbnail request failed")
    }

    // ========================================================================
    // Playlist Endpoints
    // ========================================================================

    /// POST /v1/playlists
    pub async fn create_playlist(&self, name: &str, description: Option<&str>) -> Response {
        self.client
            .post(self.url("/v1/playlists"))
            .json(&json!({ "name": name, "description": description }))
            .send()
            .await
            .expect("Create playlist request failed")
    }

    /// Creates a playlist and returns its id.
    pub async fn create_test_playlist(&self, name: &str) -> i64 {
        let response = self.create_playlist(name, None).await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let playlist: Value = response.json().await.expect("Invalid playlist response");
        playlist["id"].as_i64().expect("Missing playlist id")
    }

    /// GET /v1/playlists
    pub async fn list_playlists(&self) -> Response {
        self.client
            .get(self.url("/v1/playlists"))
            .send()
            .await
            .expect("List playlists request failed")
    }

    /// GET /v1/playlists/{id}
    pub async fn get_playlist(&self, id: i64, include_videos: bool) -> Response {
        self.client
            .get(self.url(&format!(
                "/v1/playlists/{}?include_videos={}",
                id, include_videos
            )))
            .send()
            .await
            .expect("Get playlist request failed")
    }

    /// PUT /v1/playlists/{id}
    pub async fn update_playlist(&self, id: i64, body: Value) -> Response {
        self.client
            .put(self.url(&format!("/v1/playlists/{}", id)))
            .json(&body)
            .send()
            .await
            .expect("Update playlist request failed")
    }

    /// DELETE /v1/playlists/{id}
    pub async fn delete_playlist(&self, id: i64) -> Response {
        self.client
            .delete(self.url(&format!("/v1/playlists/{}", id)))
            .send()
            .await
            .expect("Delete playlist request failed")
    }

    /// GET /v1/playlists/{id}/videos
    pub async fn list_playlist_videos(&self, id: i64) -> Response {
        self.client
            .get(self.url(&format!("/v1/playlists/{}/videos", id)))
            .send()
            .await
            .expect("List playlist videos request failed")
    }

    /// POST /v1/playlists/{id}/videos
    pub async fn add_playlist_video(&self, id: i64, video_id: i64) -> Response {
        self.client
            .post(self.url(&format!("/v1/playlists/{}/videos", id)))
            .json(&json!({ "video_id": video_id }))
            .send()
            .await
            .expect("Add playlist video request failed")
    }

    /// Adds a video and returns the new membership id.
    pub async fn add_test_playlist_video(&self, id: i64, video_id: i64) -> i64 {
        let response = self.add_playlist_video(id, video_id).await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let membership: Value = response.json().await.expect("Invalid membership response");
        membership["id"].as_i64().expect("Missing membership id")
    }

    /// DELETE /v1/playlists/{id}/videos?video_id=N
    pub async fn remove_playlist_video(&self, id: i64, video_id: i64) -> Response {
        self.client
            .delete(self.url(&format!(
                "/v1/playlists/{}/videos?video_id={}",
                id, video_id
            )))
            .send()
            .await
            .expect("Remove playlist video request failed")
    }

    /// DELETE /v1/playlists/{id}/videos/{membership_id}
    pub async fn remove_playlist_entry(&self, id: i64, membership_id: i64) -> Response {
        self.client
            .delete(self.url(&format!("/v1/playlists/{}/videos/{}", id, membership_id)))
            .send()
            .await
            .expect("Remove playlist entry request failed")
    }

    /// PUT /v1/playlists/{id}/videos/reorder
    pub async fn reorder_playlist(&self, id: i64, membership_ids: &[i64]) -> Response {
        self.client
            .put(self.url(&format!("/v1/playlists/{}/videos/reorder", id)))
            .json(&json!({ "membership_ids": membership_ids }))
            .send()
            .await
            .expect("Reorder request failed")
    }

    /// PUT /v1/playlists/{id}/videos/reorder with an arbitrary body
    pub async fn reorder_playlist_raw(&self, id: i64, body: Value) -> Response {
        self.client
            .put(self.url(&format!("/v1/playlists/{}/videos/reorder", id)))
            .json(&body)
            .send()
            .await
            .expect("Reorder request failed")
    }

    // ========================================================================
    // Schedule and Player Endpoints
    // ========================================================================

    /// GET /v1/player-settings
    pub async fn get_player_settings(&self) -> Response {
        self.client
            .get(self.url("/v1/player-settings"))
            .send()
            .await
            .expect("Get player settings request failed")
    }

    /// PUT /v1/player-settings
    pub async fn update_player_settings(&self, body: Value) -> Response {
        self.client
            .put(self.url("/v1/player-settings"))
            .json(&body)
            .send()
            .await
            .expect("Update player settings request failed")
    }

    /// GET /v1/player-settings/today
    pub async fn get_today(&self) -> Response {
        self.client
            .get(self.url("/v1/player-settings/today"))
            .send()
            .await
            .expect("Today request failed")
    }

    /// POST /v1/player/next
    pub async fn player_next(&self, playlist_id: i64, current_index: usize, reason: &str) -> Response {
        self.client
            .post(self.url("/v1/player/next"))
            .json(&json!({
                "playlist_id": playlist_id,
                "current_index": current_index,
                "reason": reason,
            }))
            .send()
            .await
            .expect("Player next request failed")
    }

    // ========================================================================
    // Public Kiosk Endpoints
    // ========================================================================

    /// GET /v1/public/player
    pub async fn public_player(&self) -> Response {
        self.client
            .get(self.url("/v1/public/player"))
            .send()
            .await
            .expect("Public player request failed")
    }

    /// GET /v1/public/player-settings
    pub async fn public_player_settings(&self) -> Response {
        self.client
            .get(self.url("/v1/public/player-settings"))
            .send()
            .await
            .expect("Public player settings request failed")
    }

    /// GET /v1/public/playlists/{id}
    pub async fn public_playlist(&self, id: i64) -> Response {
        self.client
            .get(self.url(&format!("/v1/public/playlists/{}", id)))
            .send()
            .await
            .expect("Public playlist request failed")
    }

    /// POST /v1/public/player/next
    pub async fn public_player_next(
        &self,
        playlist_id: i64,
        current_index: usize,
        reason: &str,
    ) -> Response {
        self.public_player_next_after_errors(playlist_id, current_index, reason, 0)
            .await
    }

    /// POST /v1/public/player/next, reporting earlier failures in a row
    pub async fn public_player_next_after_errors(
        &self,
        playlist_id: i64,
        current_index: usize,
        reason: &str,
        consecutive_errors: usize,
    ) -> Response {
        self.client
            .post(self.url("/v1/public/player/next"))
            .json(&json!({
                "playlist_id": playlist_id,
                "current_index": current_index,
                "reason": reason,
                "consecutive_errors": consecutive_errors,
            }))
            .send()
            .await
            .expect("Public player next request failed")
    }

    // ========================================================================
    // System Endpoints
    // ========================================================================

    /// POST /v1/system/reboot
    pub async fn reboot(&self) -> Response {
        self.client
            .post(self.url("/v1/system/reboot"))
            .send()
            .await
            .expect("Reboot request failed")
    }
}
