//! Video and playlist management routes.
//!
//! Every handler acts on behalf of the session user; items owned by someone
//! else answer exactly like missing ones.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::api_error::{error_response, ApiResult, JsonBody};
use super::session::Session;
use super::state::{GuardedLibraryManager, ServerState};
use crate::content_store::{
    MembershipId, Playlist, PlaylistEntry, PlaylistId, PlaylistUpdate, VideoId,
};

/// Multipart framing overhead allowed on top of the video size limit.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Base64 thumbnails are captured client-side from a video frame.
const THUMBNAIL_BODY_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize)]
struct DeletedResponse {
    deleted: i64,
}

#[derive(Debug, Serialize)]
struct RemovedResponse {
    removed: bool,
}

#[derive(Debug, Deserialize)]
struct ThumbnailBody {
    thumbnail_data: String,
}

#[derive(Debug, Serialize)]
struct ThumbnailResponse {
    thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatePlaylistBody {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistQuery {
    #[serde(default)]
    include_videos: bool,
}

#[derive(Debug, Serialize)]
struct PlaylistDetails {
    #[serde(flatten)]
    playlist: Playlist,
    #[serde(skip_serializing_if = "Option::is_none")]
    videos: Option<Vec<PlaylistEntry>>,
}

#[derive(Debug, Deserialize)]
struct AddVideoBody {
    video_id: VideoId,
}

#[derive(Debug, Deserialize)]
struct RemoveVideoQuery {
    video_id: VideoId,
}

#[derive(Debug, Deserialize)]
struct ReorderBody {
    membership_ids: Vec<MembershipId>,
}

// Videos

async fn list_videos(
    session: Session,
    State(library): State<GuardedLibraryManager>,
) -> ApiResult<Response> {
    Ok(Json(library.list_videos(session.user_id)?).into_response())
}

async fn get_video(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    Path(id): Path<VideoId>,
) -> ApiResult<Response> {
    Ok(Json(library.get_video(session.user_id, id)?).into_response())
}

/// POST /upload, multipart with a `file` field and an optional `duration`.
async fn upload_video(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let mut file: Option<(String, Option<String>, Vec<u8>)> = None;
    let mut duration: Option<f64> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read multipart upload: {}", e);
                return Ok(error_response(e.status(), e.body_text()));
            }
        };
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().map(str::to_string);
                match field.bytes().await {
                    Ok(bytes) => file = Some((filename, content_type, bytes.to_vec())),
                    Err(e) => {
                        warn!("Failed to read file data: {}", e);
                        return Ok(error_response(e.status(), e.body_text()));
                    }
                }
            }
            "duration" => {
                if let Ok(text) = field.text().await {
                    duration = text.trim().parse::<f64>().ok().filter(|d| *d >= 0.0);
                }
            }
            _ => {}
        }
    }

    let Some((filename, content_type, data)) = file else {
        return Ok(error_response(StatusCode::BAD_REQUEST, "No video file uploaded"));
    };
    if filename.is_empty() {
        return Ok(error_response(StatusCode::BAD_REQUEST, "No filename provided"));
    }

    debug!(
        "User {} uploading {} ({} bytes, {:?})",
        session.user_id,
        filename,
        data.len(),
        content_type
    );
    let video = library
        .upload_video(
            session.user_id,
            &filename,
            content_type.as_deref(),
            duration,
            &data,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(video)).into_response())
}

async fn delete_video(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    Path(id): Path<VideoId>,
) -> ApiResult<Response> {
    library.delete_video(session.user_id, id).await?;
    Ok(Json(DeletedResponse { deleted: id }).into_response())
}

async fn set_video_thumbnail(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    Path(id): Path<VideoId>,
    JsonBody(body): JsonBody<ThumbnailBody>,
) -> ApiResult<Response> {
    let video = library
        .set_video_thumbnail(session.user_id, id, &body.thumbnail_data)
        .await?;
    Ok(Json(ThumbnailResponse {
        thumbnail: video.thumbnail,
    })
    .into_response())
}

// Playlists

async fn list_playlists(
    session: Session,
    State(library): State<GuardedLibraryManager>,
) -> ApiResult<Response> {
    Ok(Json(library.list_playlists(session.user_id)?).into_response())
}

async fn create_playlist(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    JsonBody(body): JsonBody<CreatePlaylistBody>,
) -> ApiResult<Response> {
    let playlist =
        library.create_playlist(session.user_id, &body.name, body.description.as_deref())?;
    Ok((StatusCode::CREATED, Json(playlist)).into_response())
}

async fn get_playlist(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    Path(id): Path<PlaylistId>,
    Query(query): Query<PlaylistQuery>,
) -> ApiResult<Response> {
    let playlist = library.get_playlist(session.user_id, id)?;
    let videos = if query.include_videos {
        Some(library.list_entries(session.user_id, id)?)
    } else {
        None
    };
    Ok(Json(PlaylistDetails { playlist, videos }).into_response())
}

async fn update_playlist(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    Path(id): Path<PlaylistId>,
    JsonBody(update): JsonBody<PlaylistUpdate>,
) -> ApiResult<Response> {
    Ok(Json(library.update_playlist(session.user_id, id, &update)?).into_response())
}

async fn delete_playlist(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    Path(id): Path<PlaylistId>,
) -> ApiResult<Response> {
    library.delete_playlist(session.user_id, id)?;
    Ok(Json(DeletedResponse { deleted: id }).into_response())
}

async fn list_playlist_videos(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    Path(id): Path<PlaylistId>,
) -> ApiResult<Response> {
    Ok(Json(library.list_entries(session.user_id, id)?).into_response())
}

async fn add_playlist_video(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    Path(id): Path<PlaylistId>,
    JsonBody(body): JsonBody<AddVideoBody>,
) -> ApiResult<Response> {
    let membership = library.add_video_to_playlist(session.user_id, id, body.video_id)?;
    Ok((StatusCode::CREATED, Json(membership)).into_response())
}

/// DELETE /{id}/videos?video_id=N removes one occurrence of the video.
async fn remove_playlist_video(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    Path(id): Path<PlaylistId>,
    Query(query): Query<RemoveVideoQuery>,
) -> ApiResult<Response> {
    let removed = library.remove_video_from_playlist(session.user_id, id, query.video_id)?;
    Ok(Json(RemovedResponse { removed }).into_response())
}

async fn remove_playlist_entry(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    Path((id, membership_id)): Path<(PlaylistId, MembershipId)>,
) -> ApiResult<Response> {
    let removed = library.remove_entry(session.user_id, id, membership_id)?;
    Ok(Json(RemovedResponse { removed }).into_response())
}

async fn reorder_playlist_videos(
    session: Session,
    State(library): State<GuardedLibraryManager>,
    Path(id): Path<PlaylistId>,
    JsonBody(body): JsonBody<ReorderBody>,
) -> ApiResult<Response> {
    let entries = library.reorder_entries(session.user_id, id, &body.membership_ids)?;
    Ok(Json(entries).into_response())
}

pub fn video_routes(max_upload_size: u64) -> Router<ServerState> {
    let body_limit = usize::try_from(max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/", get(list_videos))
        .route(
            "/upload",
            post(upload_video).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/{id}", get(get_video).delete(delete_video))
        .route(
            "/{id}/thumbnail",
            post(set_video_thumbnail).layer(DefaultBodyLimit::max(THUMBNAIL_BODY_LIMIT)),
        )
}

pub fn playlist_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(list_playlists).post(create_playlist))
        .route(
            "/{id}",
            get(get_playlist).put(update_playlist).delete(delete_playlist),
        )
        .route(
            "/{id}/videos",
            get(list_playlist_videos)
                .post(add_playlist_video)
                .delete(remove_playlist_video),
        )
        .route("/{id}/videos/reorder", put(reorder_playlist_videos))
        .route("/{id}/videos/{membership_id}", delete(remove_playlist_entry))
}
