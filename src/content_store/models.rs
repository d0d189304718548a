use jiff::civil::Weekday;
use serde::{Deserialize, Deserializer, Serialize};

pub type UserId = usize;
pub type VideoId = i64;
pub type PlaylistId = i64;
pub type MembershipId = i64;

/// An uploaded video. The bytes live in the blob store under `filename`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: VideoId,
    pub user_id: UserId,
    pub filename: String,
    pub original_filename: String,
    pub file_size: u64,
    pub mime_type: Option<String>,
    /// Seconds, when the uploader knew it.
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
    pub created: i64,
}

#[derive(Debug, Clone)]
pub struct NewVideo {
    pub user_id: UserId,
    pub filename: String,
    pub original_filename: String,
    pub file_size: u64,
    pub mime_type: Option<String>,
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: PlaylistId,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub created: i64,
    pub updated: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSummary {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub video_count: usize,
}

/// Metadata change for a playlist. `description: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlaylistUpdate {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
}

/// One (playlist, video, position) row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: MembershipId,
    pub playlist_id: PlaylistId,
    pub video_id: VideoId,
    /// 1-based, dense within the playlist.
    pub position: usize,
    pub added: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub membership: Membership,
    pub video: Video,
}

/// Per-user weekly schedule: one optional playlist per weekday plus the loop toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyScheduleConfig {
    pub id: i64,
    pub user_id: UserId,
    pub loop_playlist: bool,
    pub monday_playlist_id: Option<PlaylistId>,
    pub tuesday_playlist_id: Option<PlaylistId>,
    pub wednesday_playlist_id: Option<PlaylistId>,
    pub thursday_playlist_id: Option<PlaylistId>,
    pub friday_playlist_id: Option<PlaylistId>,
    pub saturday_playlist_id: Option<PlaylistId>,
    pub sunday_playlist_id: Option<PlaylistId>,
    pub created: i64,
    pub updated: i64,
}

impl WeeklyScheduleConfig {
    pub fn slot(&self, weekday: Weekday) -> Option<PlaylistId> {
        match weekday {
            Weekday::Monday => self.monday_playlist_id,
            Weekday::Tuesday => self.tuesday_playlist_id,
            Weekday::Wednesday => self.wednesday_playlist_id,
            Weekday::Thursday => self.thursday_playlist_id,
            Weekday::Friday => self.friday_playlist_id,
            Weekday::Saturday => self.saturday_playlist_id,
            Weekday::Sunday => self.sunday_playlist_id,
        }
    }

    pub fn slots(&self) -> [(Weekday, Option<PlaylistId>); 7] {
        [
            (Weekday::Monday, self.monday_playlist_id),
            (Weekday::Tuesday, self.tuesday_playlist_id),
            (Weekday::Wednesday, self.wednesday_playlist_id),
            (Weekday::Thursday, self.thursday_playlist_id),
            (Weekday::Friday, self.friday_playlist_id),
            (Weekday::Saturday, self.saturday_playlist_id),
            (Weekday::Sunday, self.sunday_playlist_id),
        ]
    }
}

/// Partial update of a [`WeeklyScheduleConfig`].
///
/// For each day slot: `None` leaves the slot untouched, `Some(None)` clears
/// it and `Some(Some(id))` binds it to a playlist. In JSON an absent key is
/// `None` and an explicit `null` is `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleUpdate {
    pub loop_playlist: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub monday_playlist_id: Option<Option<PlaylistId>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub tuesday_playlist_id: Option<Option<PlaylistId>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub wednesday_playlist_id: Option<Option<PlaylistId>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub thursday_playlist_id: Option<Option<PlaylistId>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub friday_playlist_id: Option<Option<PlaylistId>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub saturday_playlist_id: Option<Option<PlaylistId>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub sunday_playlist_id: Option<Option<PlaylistId>>,
}

impl ScheduleUpdate {
    pub fn is_empty(&self) -> bool {
        self.loop_playlist.is_none() && self.day_slots().iter().all(|(_, v)| v.is_none())
    }

    /// Day slot changes keyed by weekday, in Monday..Sunday order.
    pub fn day_slots(&self) -> [(Weekday, Option<Option<PlaylistId>>); 7] {
        [
            (Weekday::Monday, self.monday_playlist_id),
            (Weekday::Tuesday, self.tuesday_playlist_id),
            (Weekday::Wednesday, self.wednesday_playlist_id),
            (Weekday::Thursday, self.thursday_playlist_id),
            (Weekday::Friday, self.friday_playlist_id),
            (Weekday::Saturday, self.saturday_playlist_id),
            (Weekday::Sunday, self.sunday_playlist_id),
        ]
    }

    /// Playlist ids the update would bind, ignoring clears.
    pub fn bound_playlist_ids(&self) -> Vec<PlaylistId> {
        self.day_slots()
            .iter()
            .filter_map(|(_, v)| v.flatten())
            .collect()
    }

    pub fn set_slot(&mut self, weekday: Weekday, value: Option<PlaylistId>) -> &mut Self {
        let slot = match weekday {
            Weekday::Monday => &mut self.monday_playlist_id,
            Weekday::Tuesday => &mut self.tuesday_playlist_id,
            Weekday::Wednesday => &mut self.wednesday_playlist_id,
            Weekday::Thursday => &mut self.thursday_playlist_id,
            Weekday::Friday => &mut self.friday_playlist_id,
            Weekday::Saturday => &mut self.saturday_playlist_id,
            Weekday::Sunday => &mut self.sunday_playlist_id,
        };
        *slot = Some(value);
        self
    }
}

/// Lets an `Option<Option<T>>` tell an absent field from an explicit `null`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
