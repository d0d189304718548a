mod models;
mod schema;
mod sqlite_content_store;

pub use models::*;
pub use schema::CONTENT_VERSIONED_SCHEMAS;
pub use sqlite_content_store::SqliteContentStore;

use crate::error::PlayResult;

pub trait VideoStore: Send + Sync {
    fn insert_video(&self, video: &NewVideo) -> PlayResult<Video>;

    /// Returns Ok(None) if the video does not exist or, when `owner` is
    /// given, belongs to someone else.
    fn get_video(&self, video_id: VideoId, owner: Option<UserId>) -> PlayResult<Option<Video>>;

    /// Newest first.
    fn list_videos(&self, user_id: UserId) -> PlayResult<Vec<Video>>;

    fn set_video_thumbnail(&self, video_id: VideoId, thumbnail: &str) -> PlayResult<bool>;

    /// Deletes an owned video and returns the deleted row.
    /// Returns Ok(None) if there was nothing to delete and
    /// `PlayError::Conflict` while any playlist still references it.
    fn delete_video(&self, video_id: VideoId, owner: UserId) -> PlayResult<Option<Video>>;
}

pub trait PlaylistStore: Send + Sync {
    fn create_playlist(
        &self,
        user_id: UserId,
        name: &str,
        description: Option<&str>,
    ) -> PlayResult<Playlist>;

    fn get_playlist(
        &self,
        playlist_id: PlaylistId,
        owner: Option<UserId>,
    ) -> PlayResult<Option<Playlist>>;

    /// Most recently modified first.
    fn list_playlists(&self, user_id: UserId) -> PlayResult<Vec<PlaylistSummary>>;

    fn update_playlist(
        &self,
        playlist_id: PlaylistId,
        owner: UserId,
        update: &PlaylistUpdate,
    ) -> PlayResult<Option<Playlist>>;

    /// Memberships cascade, schedule slots pointing at the playlist are cleared.
    fn delete_playlist(&self, playlist_id: PlaylistId, owner: UserId) -> PlayResult<bool>;
}

/// Ordered collection of videos inside a playlist.
///
/// Positions of a playlist always form the dense sequence 1..N. Every
/// mutation is scoped to a single playlist and refreshes its `updated`
/// timestamp. Ownership is checked by the caller.
pub trait PlaylistMembershipStore: Send + Sync {
    /// Adds `video_id` at position `1 + max(position)`. Duplicates are allowed.
    fn append(&self, playlist_id: PlaylistId, video_id: VideoId) -> PlayResult<Membership>;

    /// Returns false when no such membership exists in the playlist.
    fn remove_by_membership_id(
        &self,
        playlist_id: PlaylistId,
        membership_id: MembershipId,
    ) -> PlayResult<bool>;

    /// Removes one occurrence of the video (the lowest position).
    /// Returns false when the video is not in the playlist.
    fn remove_by_video_id(&self, playlist_id: PlaylistId, video_id: VideoId) -> PlayResult<bool>;

    /// Replaces the ordering. Foreign and repeated ids are ignored, members
    /// missing from `ordered` follow in their previous relative order.
    fn reorder(&self, playlist_id: PlaylistId, ordered: &[MembershipId]) -> PlayResult<()>;

    /// Entries ascending by position, ties by membership id.
    fn list_ordered(
        &self,
        playlist_id: PlaylistId,
        owner: Option<UserId>,
    ) -> PlayResult<Vec<PlaylistEntry>>;
}

pub trait ScheduleStore: Send + Sync {
    fn get_schedule(&self, user_id: UserId) -> PlayResult<Option<WeeklyScheduleConfig>>;

    /// Inserts the default config (no loop, all slots empty).
    /// Fails with `PlayError::Conflict` if the user already has one.
    fn insert_default_schedule(&self, user_id: UserId) -> PlayResult<WeeklyScheduleConfig>;

    /// Applies the provided fields. Returns Ok(None) if the user has no config.
    fn apply_schedule_update(
        &self,
        user_id: UserId,
        update: &ScheduleUpdate,
    ) -> PlayResult<Option<WeeklyScheduleConfig>>;
}

pub trait ContentStore:
    VideoStore + PlaylistStore + PlaylistMembershipStore + ScheduleStore + Send + Sync
{
}

impl<T> ContentStore for T where
    T: VideoStore + PlaylistStore + PlaylistMembershipStore + ScheduleStore + Send + Sync
{
}
