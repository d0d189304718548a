//! Video and thumbnail streaming

use super::state::{GuardedLibraryManager, ServerState};
use crate::content_store::VideoId;
use crate::error::PlayError;
use axum::{
    body::Body,
    extract::{OptionalFromRequestParts, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use super::api_error::{ApiError, ApiResult};
use std::convert::Infallible;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, BufReader, SeekFrom},
};
use tokio_util::io::ReaderStream;
use tracing::debug;

const HEADER_BYTE_RANGE: &str = "Range";
const STREAM_BUFFER_SIZE: usize = 4096 * 16;
const THUMBNAIL_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// A single `bytes=` range as sent by the client, not yet checked against
/// the file length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    start_inclusive: Option<u64>,
    end_inclusive: Option<u64>,
}

impl ByteRange {
    pub fn new(start_inclusive: Option<u64>, end_inclusive: Option<u64>) -> ByteRange {
        ByteRange {
            start_inclusive,
            end_inclusive,
        }
    }

    fn parse<S: AsRef<str>>(s: S) -> Option<ByteRange> {
        let v = s.as_ref().trim().strip_prefix("bytes=")?;
        // Multiple ranges are not supported, the caller falls back to the whole file.
        if v.contains(',') {
            return None;
        }
        let (start, end) = v.split_once('-')?;
        let start = match start.trim() {
            "" => None,
            s => Some(s.parse::<u64>().ok()?),
        };
        let end = match end.trim() {
            "" => None,
            e => Some(e.parse::<u64>().ok()?),
        };
        Some(ByteRange {
            start_inclusive: start,
            end_inclusive: end,
        })
    }

    /// Resolves the range to inclusive byte offsets within a file of
    /// `file_length` bytes. Returns None when it cannot be satisfied.
    fn resolve(&self, file_length: u64) -> Option<(u64, u64)> {
        if file_length == 0 {
            return None;
        }
        let last = file_length - 1;
        let (start, end) = match (self.start_inclusive, self.end_inclusive) {
            (None, None) => (0, last),
            // Suffix range: the final `n` bytes.
            (None, Some(n)) => {
                if n == 0 {
                    return None;
                }
                (file_length.saturating_sub(n), last)
            }
            (Some(start), None) => (start, last),
            (Some(start), Some(end)) => (start, end.min(last)),
        };
        if start > last || start > end {
            return None;
        }
        Some((start, end))
    }
}

impl OptionalFromRequestParts<ServerState> for ByteRange {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts
            .headers
            .get(HEADER_BYTE_RANGE)
            .and_then(|x| x.to_str().ok())
            .and_then(ByteRange::parse))
    }
}

fn range_not_satisfiable(file_length: u64) -> Response {
    Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(header::CONTENT_RANGE, format!("bytes */{}", file_length))
        .body(Body::empty())
        .unwrap_or_else(|_| StatusCode::RANGE_NOT_SATISFIABLE.into_response())
}

fn internal_error(e: axum::http::Error) -> ApiError {
    ApiError(PlayError::Unavailable(e.to_string()))
}

/// GET /videos/{id}. Public, the kiosk plays without a session.
pub async fn stream_video(
    byte_range: Option<ByteRange>,
    State(library): State<GuardedLibraryManager>,
    Path(id): Path<VideoId>,
) -> ApiResult<Response> {
    let (video, path) = library.video_blob(id)?;
    debug!("Streaming video {} from {}", video.id, path.display());

    let mut file = File::open(&path).await.map_err(PlayError::from)?;
    let file_length = file.metadata().await.map_err(PlayError::from)?.len();

    let (status_code, start, end) = match byte_range {
        None => (StatusCode::OK, 0, file_length.saturating_sub(1)),
        Some(range) => match range.resolve(file_length) {
            Some((start, end)) => (StatusCode::PARTIAL_CONTENT, start, end),
            None => return Ok(range_not_satisfiable(file_length)),
        },
    };
    let chunk_size = if file_length == 0 { 0 } else { end - start + 1 };

    if start > 0 {
        file.seek(SeekFrom::Start(start))
            .await
            .map_err(PlayError::from)?;
    }

    let file_reader = BufReader::with_capacity(STREAM_BUFFER_SIZE, file.take(chunk_size));
    let stream = ReaderStream::with_capacity(file_reader, STREAM_BUFFER_SIZE);
    let content_type = video
        .mime_type
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let mut builder = Response::builder()
        .status(status_code)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_LENGTH, chunk_size);
    if status_code == StatusCode::PARTIAL_CONTENT {
        builder = builder.header(
            header::CONTENT_RANGE,
            format!("bytes {}-{}/{}", start, end, file_length),
        );
    }
    builder
        .body(Body::from_stream(stream))
        .map_err(internal_error)
}

/// GET /videos/{id}/thumbnail
pub async fn get_thumbnail(
    State(library): State<GuardedLibraryManager>,
    Path(id): Path<VideoId>,
) -> ApiResult<Response> {
    let path = library.thumbnail_blob(id)?;
    let data = tokio::fs::read(&path).await.map_err(PlayError::from)?;
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/jpeg")
        .header(header::CACHE_CONTROL, THUMBNAIL_CACHE_CONTROL)
        .body(Body::from(data))
        .map_err(internal_error)
}

#[cfg(test)]
mod tests {
    use super::ByteRange;

    fn assert_byte_range(s: &str, a: Option<u64>, b: Option<u64>) {
        assert_eq!(ByteRange::parse(s), Some(ByteRange::new(a, b)));
    }

    fn assert_no_byte_range(s: &str) {
        assert_eq!(ByteRange::parse(s), None);
    }

    #[test]
    fn parses_byte_range() {
        assert_no_byte_range("asd");
        assert_no_byte_range("bytes=");
        assert_no_byte_range("bytes=a-b");
        assert_no_byte_range("bytes=0-1,5-6");
        assert_byte_range("bytes=-", None, None);
        assert_byte_range("bytes=11-", Some(11), None);
        assert_byte_range("bytes=-111", None, Some(111));
        assert_byte_range("bytes=11-111", Some(11), Some(111));
    }

    #[test]
    fn resolves_against_file_length() {
        assert_eq!(ByteRange::new(Some(0), Some(9)).resolve(100), Some((0, 9)));
        assert_eq!(ByteRange::new(Some(90), None).resolve(100), Some((90, 99)));
        assert_eq!(ByteRange::new(Some(90), Some(500)).resolve(100), Some((90, 99)));
        assert_eq!(ByteRange::new(None, Some(10)).resolve(100), Some((90, 99)));
        assert_eq!(ByteRange::new(None, Some(500)).resolve(100), Some((0, 99)));
        assert_eq!(ByteRange::new(None, None).resolve(100), Some((0, 99)));
    }

    #[test]
    fn rejects_unsatisfiable_ranges() {
        assert_eq!(ByteRange::new(Some(100), None).resolve(100), None);
        assert_eq!(ByteRange::new(Some(50), Some(10)).resolve(100), None);
        assert_eq!(ByteRange::new(None, Some(0)).resolve(100), None);
        assert_eq!(ByteRange::new(Some(0), None).resolve(0), None);
    }
}
