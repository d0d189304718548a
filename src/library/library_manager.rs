use crate::content_store::{
    ContentStore, Membership, MembershipId, NewVideo, Playlist, PlaylistEntry, PlaylistId, PlaylistSummary,
    PlaylistUpdate, ScheduleUpdate, UserId, Video, VideoId, WeeklyScheduleConfig,
};
use crate::error::{PlayError, PlayResult};
use crate::media::BlobStore;
use crate::playback::{AdvanceReason, PlaybackCursor, PlaybackMode, PlaybackStep};
use crate::schedule::{self, resolve_today, ScheduleClock};
use jiff::Zoned;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

const MAX_PLAYLIST_NAME_LEN: usize = 200;

/// What the kiosk should be doing right now.
#[derive(Debug, Clone, PartialEq)]
pub enum TodayPlayback {
    /// No playlist bound to today (or no schedule at all).
    NotConfigured,
    /// A playlist is bound but has no entries.
    Empty { playlist: Playlist },
    Ready {
        playlist: Playlist,
        entries: Vec<PlaylistEntry>,
    },
}

#[derive(Debug, Clone)]
pub struct KioskView {
    pub now: Zoned,
    pub loop_playlist: bool,
    pub playback: TodayPlayback,
}

/// Entry point for every user-facing content operation.
///
/// Checks that the acting user owns what they touch, collapsing "missing"
/// and "someone else's" into `NotFound`, then delegates to the stores.
pub struct LibraryManager {
    store: Arc<dyn ContentStore>,
    blobs: BlobStore,
    clock: ScheduleClock,
}

fn not_found(what: &str, id: i64) -> PlayError {
    PlayError::NotFound(format!("{} {} not found", what, id))
}

fn validate_name(name: &str) -> PlayResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(PlayError::InvalidInput("playlist name is required".to_string()));
    }
    if trimmed.chars().count() > MAX_PLAYLIST_NAME_LEN {
        return Err(PlayError::InvalidInput(format!(
            "playlist name longer than {} characters",
            MAX_PLAYLIST_NAME_LEN
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

impl LibraryManager {
    pub fn new(store: Arc<dyn ContentStore>, blobs: BlobStore, clock: ScheduleClock) -> Self {
        Self {
            store,
            blobs,
            clock,
        }
    }

    pub fn clock(&self) -> &ScheduleClock {
        &self.clock
    }

    // Videos

    pub fn list_videos(&self, user_id: UserId) -> PlayResult<Vec<Video>> {
        self.store.list_videos(user_id)
    }

    pub fn get_video(&self, user_id: UserId, video_id: VideoId) -> PlayResult<Video> {
        self.store
            .get_video(video_id, Some(user_id))?
            .ok_or_else(|| not_found("video", video_id))
    }

    pub async fn upload_video(
        &self,
        user_id: UserId,
        original_filename: &str,
        declared_type: Option<&str>,
        duration: Option<f64>,
        data: &[u8],
    ) -> PlayResult<Video> {
        let stored = self
            .blobs
            .save_video(original_filename, declared_type, data)
            .await?;
        let inserted = self.store.insert_video(&NewVideo {
            user_id,
            filename: stored.filename.clone(),
            original_filename: original_filename.to_string(),
            file_size: stored.size,
            mime_type: Some(stored.mime_type),
            duration,
        });
        match inserted {
            Ok(video) => {
                info!("User {} uploaded video {} ({})", user_id, video.id, video.filename);
                Ok(video)
            }
            Err(e) => {
                if let Err(cleanup) = self.blobs.delete_video(&stored.filename).await {
                    warn!("Failed to remove orphan blob {}: {}", stored.filename, cleanup);
                }
                Err(e)
            }
        }
    }

    pub async fn delete_video(&self, user_id: UserId, video_id: VideoId) -> PlayResult<()> {
        let video = self
            .store
            .delete_video(video_id, user_id)?
            .ok_or_else(|| not_found("video", video_id))?;
        if let Err(e) = self.blobs.delete_video(&video.filename).await {
            warn!("Failed to remove blob of video {}: {}", video_id, e);
        }
        if let Some(thumbnail) = &video.thumbnail {
            if let Err(e) = self.blobs.delete_thumbnail(thumbnail).await {
                warn!("Failed to remove thumbnail of video {}: {}", video_id, e);
            }
        }
        info!("User {} deleted video {}", user_id, video_id);
        Ok(())
    }

    pub async fn set_video_thumbnail(
        &self,
        user_id: UserId,
        video_id: VideoId,
        encoded: &str,
    ) -> PlayResult<Video> {
        let video = self.get_video(user_id, video_id)?;
        let filename = self.blobs.save_thumbnail(video_id, encoded).await?;
        if !self.store.set_video_thumbnail(video_id, &filename)? {
            self.blobs.delete_thumbnail(&filename).await?;
            return Err(not_found("video", video_id));
        }
        if let Some(previous) = &video.thumbnail {
            if let Err(e) = self.blobs.delete_thumbnail(previous).await {
                warn!("Failed to remove old thumbnail {}: {}", previous, e);
            }
        }
        self.get_video(user_id, video_id)
    }

    /// Location of the video bytes, for unauthenticated playback.
    pub fn video_blob(&self, video_id: VideoId) -> PlayResult<(Video, PathBuf)> {
        let video = self
            .store
            .get_video(video_id, None)?
            .ok_or_else(|| not_found("video", video_id))?;
        let path = self.blobs.video_path(&video.filename)?;
        Ok((video, path))
    }

    pub fn thumbnail_blob(&self, video_id: VideoId) -> PlayResult<PathBuf> {
        let video = self
            .store
            .get_video(video_id, None)?
            .ok_or_else(|| not_found("video", video_id))?;
        let thumbnail = video
            .thumbnail
            .ok_or_else(|| PlayError::NotFound(format!("video {} has no thumbnail", video_id)))?;
        Ok(self.blobs.thumbnail_path(&thumbnail)?)
    }

    // Playlists

    pub fn list_playlists(&self, user_id: UserId) -> PlayResult<Vec<PlaylistSummary>> {
        self.store.list_playlists(user_id)
    }

    pub fn create_playlist(
        &self,
        user_id: UserId,
        name: &str,
        description: Option<&str>,
    ) -> PlayResult<Playlist> {
        let name = validate_name(name)?;
        let description = normalize_description(description);
        self.store
            .create_playlist(user_id, &name, description.as_deref())
    }

    pub fn get_playlist(&self, user_id: UserId, playlist_id: PlaylistId) -> PlayResult<Playlist> {
        self.store
            .get_playlist(playlist_id, Some(user_id))?
            .ok_or_else(|| not_found("playlist", playlist_id))
    }

    pub fn update_playlist(
        &self,
        user_id: UserId,
        playlist_id: PlaylistId,
        update: &PlaylistUpdate,
    ) -> PlayResult<Playlist> {
        let update = PlaylistUpdate {
            name: update.name.as_deref().map(validate_name).transpose()?,
            description: update
                .description
                .as_ref()
                .map(|d| normalize_description(d.as_deref())),
        };
        self.store
            .update_playlist(playlist_id, user_id, &update)?
            .ok_or_else(|| not_found("playlist", playlist_id))
    }

    pub fn delete_playlist(&self, user_id: UserId, playlist_id: PlaylistId) -> PlayResult<()> {
        if !self.store.delete_playlist(playlist_id, user_id)? {
            return Err(not_found("playlist", playlist_id));
        }
        info!("User {} deleted playlist {}", user_id, playlist_id);
        Ok(())
    }

    // Playlist entries

    pub fn list_entries(
        &self,
        user_id: UserId,
        playlist_id: PlaylistId,
    ) -> PlayResult<Vec<PlaylistEntry>> {
        self.store
            .list_ordered(playlist_id, Some(user_id))
            .map_err(|e| match e {
                PlayError::NotFound(_) => not_found("playlist", playlist_id),
                other => other,
            })
    }

    pub fn add_video_to_playlist(
        &self,
        user_id: UserId,
        playlist_id: PlaylistId,
        video_id: VideoId,
    ) -> PlayResult<Membership> {
        self.get_playlist(user_id, playlist_id)?;
        self.get_video(user_id, video_id)?;
        self.store.append(playlist_id, video_id)
    }

    pub fn remove_entry(
        &self,
        user_id: UserId,
        playlist_id: PlaylistId,
        membership_id: MembershipId,
    ) -> PlayResult<bool> {
        self.get_playlist(user_id, playlist_id)?;
        self.store.remove_by_membership_id(playlist_id, membership_id)
    }

    pub fn remove_video_from_playlist(
        &self,
        user_id: UserId,
        playlist_id: PlaylistId,
        video_id: VideoId,
    ) -> PlayResult<bool> {
        self.get_playlist(user_id, playlist_id)?;
        self.store.remove_by_video_id(playlist_id, video_id)
    }

    pub fn reorder_entries(
        &self,
        user_id: UserId,
        playlist_id: PlaylistId,
        membership_ids: &[MembershipId],
    ) -> PlayResult<Vec<PlaylistEntry>> {
        self.get_playlist(user_id, playlist_id)?;
        self.store.reorder(playlist_id, membership_ids)?;
        self.list_entries(user_id, playlist_id)
    }

    // Schedule

    pub fn schedule(&self, user_id: UserId) -> PlayResult<WeeklyScheduleConfig> {
        schedule::get_or_create(&*self.store, user_id)
    }

    pub fn update_schedule(
        &self,
        user_id: UserId,
        update: &ScheduleUpdate,
    ) -> PlayResult<WeeklyScheduleConfig> {
        for playlist_id in update.bound_playlist_ids() {
            self.get_playlist(user_id, playlist_id)?;
        }
        schedule::update(&*self.store, user_id, update)
    }

    /// Today's weekday in the configured zone and the playlist bound to it.
    pub fn today(&self, user_id: UserId) -> PlayResult<(Zoned, Option<PlaylistId>)> {
        let now = self.clock.now();
        let config = self.store.get_schedule(user_id)?;
        let playlist_id = resolve_today(config.as_ref(), &now);
        Ok((now, playlist_id))
    }

    // Playback

    /// Advances playback of `playlist_id`, carrying the client's count of
    /// back to back failures.
    pub fn next_in_playlist(
        &self,
        user_id: UserId,
        playlist_id: PlaylistId,
        current_index: usize,
        consecutive_errors: usize,
        mode: PlaybackMode,
        reason: AdvanceReason,
    ) -> PlayResult<PlaybackStep> {
        let entries = self.list_entries(user_id, playlist_id)?;
        let loop_playlist = self
            .store
            .get_schedule(user_id)?
            .map(|config| config.loop_playlist)
            .unwrap_or(false);
        let mut cursor = PlaybackCursor::resume(
            &entries,
            current_index,
            consecutive_errors,
            mode,
            loop_playlist,
        );
        let step = cursor.advance(reason)?;
        if step.all_failing {
            warn!(
                "Every entry of playlist {} failed in a row for user {}",
                playlist_id, user_id
            );
        }
        Ok(step)
    }

    /// Resolves what the unattended display of `owner` should play now.
    pub fn kiosk_view(&self, owner: UserId) -> PlayResult<KioskView> {
        let now = self.clock.now();
        let config = self.store.get_schedule(owner)?;
        let loop_playlist = config.as_ref().map(|c| c.loop_playlist).unwrap_or(false);

        let Some(playlist_id) = resolve_today(config.as_ref(), &now) else {
            return Ok(KioskView {
                now,
                loop_playlist,
                playback: TodayPlayback::NotConfigured,
            });
        };
        let Some(playlist) = self.store.get_playlist(playlist_id, Some(owner))? else {
            warn!(
                "Schedule of user {} points at missing playlist {}",
                owner, playlist_id
            );
            return Ok(KioskView {
                now,
                loop_playlist,
                playback: TodayPlayback::NotConfigured,
            });
        };
        let entries = self.list_entries(owner, playlist_id)?;
        let playback = if entries.is_empty() {
            TodayPlayback::Empty { playlist }
        } else {
            TodayPlayback::Ready { playlist, entries }
        };
        Ok(KioskView {
            now,
            loop_playlist,
            playback,
        })
    }
}
