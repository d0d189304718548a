//! Schedule settings and playback routes, for the signed-in user and for
//! the unattended kiosk.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use jiff::Zoned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::api_error::{error_response, ApiResult, JsonBody};
use super::session::Session;
use super::state::{GuardedLibraryManager, ServerState};
use super::ServerConfig;
use crate::content_store::{Playlist, PlaylistEntry, PlaylistId, ScheduleUpdate};
use crate::library::{KioskView, TodayPlayback};
use crate::playback::{AdvanceReason, PlaybackMode};
use crate::schedule::weekday_name;

#[derive(Debug, Serialize)]
struct TodayResponse {
    weekday: &'static str,
    playlist_id: Option<PlaylistId>,
}

#[derive(Debug, Deserialize)]
struct NextBody {
    playlist_id: PlaylistId,
    current_index: usize,
    reason: AdvanceReason,
    /// Failures in a row the player saw before this one.
    #[serde(default)]
    consecutive_errors: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum KioskState {
    NotConfigured,
    Empty,
    Ready,
}

#[derive(Debug, Serialize)]
struct KioskResponse {
    state: KioskState,
    weekday: &'static str,
    time_zone: String,
    local_time: String,
    loop_playlist: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    playlist: Option<Playlist>,
    #[serde(skip_serializing_if = "Option::is_none")]
    videos: Option<Vec<PlaylistEntry>>,
}

#[derive(Debug, Serialize)]
struct PublicPlaylistResponse {
    #[serde(flatten)]
    playlist: Playlist,
    videos: Vec<PlaylistEntry>,
}

fn local_time(now: &Zoned) -> String {
    now.strftime("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

impl KioskResponse {
    fn new(view: KioskView, time_zone: &str) -> Self {
        let (state, playlist, videos) = match view.playback {
            TodayPlayback::NotConfigured => (KioskState::NotConfigured, None, None),
            TodayPlayback::Empty { playlist } => (KioskState::Empty, Some(playlist), None),
            TodayPlayback::Ready { playlist, entries } => {
                (KioskState::Ready, Some(playlist), Some(entries))
            }
        };
        KioskResponse {
            state,
            weekday: weekday_name(view.now.weekday()),
            time_zone: time_zone.to_string(),
            local_time: local_time(&view.now),
            loop_playlist: view.loop_playlist,
            playlist,
            videos,
        }
    }
}

// Signed-in user

async fn get_player_settings(
    session: Session,
    State(library): State<GuardedLibraryManager>,
) -> ApiResult<Response> {
    Ok(Json(library.schedule(session.user_id)?).into_response())
}

/// Absent keys keep their value, an explicit `null` clears a day.
async fn put_player_settings(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    JsonBody(update): JsonBody<ScheduleUpdate>,
) -> ApiResult<Response> {
    Ok(Json(library.update_schedule(session.user_id, &update)?).into_response())
}

async fn get_today(
    session: Session,
    State(library): State<GuardedLibraryManager>,
) -> ApiResult<Response> {
    let (now, playlist_id) = library.today(session.user_id)?;
    Ok(Json(TodayResponse {
        weekday: weekday_name(now.weekday()),
        playlist_id,
    })
    .into_response())
}

async fn post_player_next(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    JsonBody(body): JsonBody<NextBody>,
) -> ApiResult<Response> {
    let step = library.next_in_playlist(
        session.user_id,
        body.playlist_id,
        body.current_index,
        body.consecutive_errors,
        PlaybackMode::Attended,
        body.reason,
    )?;
    Ok(Json(step).into_response())
}

// Kiosk

fn no_owner_response() -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "no default schedule owner configured",
    )
}

async fn get_public_player(
    State(config): State<ServerConfig>,
    State(library): State<GuardedLibraryManager>,
) -> ApiResult<Response> {
    let Some(owner) = config.default_schedule_owner_id else {
        return Ok(no_owner_response());
    };
    let view = library.kiosk_view(owner)?;
    debug!("Kiosk view for owner {}: {:?}", owner, view.playback);
    Ok(Json(KioskResponse::new(view, library.clock().name())).into_response())
}

async fn get_public_player_settings(
    State(config): State<ServerConfig>,
    State(library): State<GuardedLibraryManager>,
) -> ApiResult<Response> {
    let Some(owner) = config.default_schedule_owner_id else {
        return Ok(no_owner_response());
    };
    Ok(Json(library.schedule(owner)?).into_response())
}

async fn get_public_playlist(
    State(config): State<ServerConfig>,
    State(library): State<GuardedLibraryManager>,
    Path(id): Path<PlaylistId>,
) -> ApiResult<Response> {
    let Some(owner) = config.default_schedule_owner_id else {
        return Ok(no_owner_response());
    };
    let playlist = library.get_playlist(owner, id)?;
    let videos = library.list_entries(owner, id)?;
    Ok(Json(PublicPlaylistResponse { playlist, videos }).into_response())
}

async fn post_public_player_next(
    State(config): State<ServerConfig>,
    State(library): State<GuardedLibraryManager>,
    JsonBody(body): JsonBody<NextBody>,
) -> ApiResult<Response> {
    let Some(owner) = config.default_schedule_owner_id else {
        return Ok(no_owner_response());
    };
    let step = library.next_in_playlist(
        owner,
        body.playlist_id,
        body.current_index,
        body.consecutive_errors,
        PlaybackMode::Kiosk,
        body.reason,
    )?;
    Ok(Json(step).into_response())
}

pub fn player_settings_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(get_player_settings).put(put_player_settings))
        .route("/today", get(get_today))
}

pub fn player_routes() -> Router<ServerState> {
    Router::new().route("/next", post(post_player_next))
}

pub fn public_routes() -> Router<ServerState> {
    Router::new()
        .route("/player", get(get_public_player))
        .route("/player-settings", get(get_public_player_settings))
        .route("/playlists/{id}", get(get_public_playlist))
        .route("/player/next", post(post_public_player_next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ScheduleClock;
    use jiff::Timestamp;

    fn saturday_noon() -> Zoned {
        // 2024-06-15 is a Saturday.
        let instant: Timestamp = "2024-06-15T12:00:00Z".parse().unwrap();
        ScheduleClock::utc().at(instant)
    }

    fn playlist(id: PlaylistId) -> Playlist {
        Playlist {
            id,
            user_id: 1,
            name: "Lobby".to_string(),
            description: None,
            created: 0,
            updated: 0,
        }
    }

    #[test]
    fn kiosk_response_reports_state() {
        let not_configured = KioskResponse::new(
            KioskView {
                now: saturday_noon(),
                loop_playlist: false,
                playback: TodayPlayback::NotConfigured,
            },
            "UTC",
        );
        let json = serde_json::to_value(&not_configured).unwrap();
        assert_eq!(json["state"], "not_configured");
        assert_eq!(json["weekday"], "saturday");
        assert_eq!(json["time_zone"], "UTC");
        assert!(json.get("playlist").is_none());

        let empty = KioskResponse::new(
            KioskView {
                now: saturday_noon(),
                loop_playlist: true,
                playback: TodayPlayback::Empty {
                    playlist: playlist(4),
                },
            },
            "UTC",
        );
        let json = serde_json::to_value(&empty).unwrap();
        assert_eq!(json["state"], "empty");
        assert_eq!(json["playlist"]["id"], 4);
        assert_eq!(json["loop_playlist"], true);
        assert!(json.get("videos").is_none());
    }

    #[test]
    fn formats_local_time_with_offset() {
        assert_eq!(local_time(&saturday_noon()), "2024-06-15T12:00:00+00:00");
    }
}
