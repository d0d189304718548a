use crate::error::PlayError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Errors that can occur while storing or locating media blobs.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("File too large: {0} bytes (max: {1})")]
    FileTooLarge(u64, u64),

    #[error("Invalid thumbnail: {0}")]
    InvalidThumbnail(String),
}

impl From<MediaError> for PlayError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Io(e) => PlayError::from(e),
            too_large @ MediaError::FileTooLarge(..) => PlayError::TooLarge(too_large.to_string()),
            other => PlayError::InvalidInput(other.to_string()),
        }
    }
}

/// Video MIME types accepted on upload.
pub const ALLOWED_VIDEO_TYPES: &[&str] = &[
    "video/mp4",
    "video/webm",
    "video/ogg",
    "video/quicktime",
    "video/x-msvideo",
];

const VIDEOS_DIR: &str = "videos";
const THUMBNAILS_DIR: &str = "thumbnails";

/// A video blob written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
}

/// Filesystem store for video and thumbnail bytes, keyed by generated filename.
pub struct BlobStore {
    root: PathBuf,
    max_video_size: u64,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>, max_video_size: u64) -> Self {
        Self {
            root: root.into(),
            max_video_size,
        }
    }

    /// Creates the blob directories.
    pub async fn init(&self) -> Result<(), MediaError> {
        fs::create_dir_all(self.root.join(VIDEOS_DIR)).await?;
        fs::create_dir_all(self.root.join(THUMBNAILS_DIR)).await?;
        Ok(())
    }

    pub fn video_path(&self, filename: &str) -> Result<PathBuf, MediaError> {
        Ok(self.root.join(VIDEOS_DIR).join(stored_name(filename)?))
    }

    pub fn thumbnail_path(&self, filename: &str) -> Result<PathBuf, MediaError> {
        Ok(self.root.join(THUMBNAILS_DIR).join(stored_name(filename)?))
    }

    /// Validates and writes an uploaded video under a fresh unique name.
    pub async fn save_video(
        &self,
        original_filename: &str,
        declared_type: Option<&str>,
        data: &[u8],
    ) -> Result<StoredBlob, MediaError> {
        let size = data.len() as u64;
        if size > self.max_video_size {
            return Err(MediaError::FileTooLarge(size, self.max_video_size));
        }
        if data.is_empty() {
            return Err(MediaError::UnsupportedFileType("empty file".to_string()));
        }
        let mime_type = check_video_type(declared_type, data)?;

        let filename = format!(
            "{}_{}_{}",
            unix_now(),
            uuid::Uuid::new_v4().simple(),
            sanitize_filename(original_filename)?
        );
        let path = self.video_path(&filename)?;
        write_file(&path, data).await?;
        debug!("Stored video {} ({} bytes)", filename, size);

        Ok(StoredBlob {
            filename,
            mime_type,
            size,
        })
    }

    /// Decodes a base64 image (plain or `data:` URL) and stores it as the
    /// thumbnail of `video_id`. Returns the generated filename.
    pub async fn save_thumbnail(&self, video_id: i64, encoded: &str) -> Result<String, MediaError> {
        let data = decode_thumbnail(encoded)?;
        let filename = format!("thumb_{}_{}.jpg", video_id, unix_now_millis());
        let path = self.thumbnail_path(&filename)?;
        write_file(&path, &data).await?;
        debug!("Stored thumbnail {} ({} bytes)", filename, data.len());
        Ok(filename)
    }

    pub async fn delete_video(&self, filename: &str) -> Result<(), MediaError> {
        remove_if_exists(&self.video_path(filename)?).await
    }

    pub async fn delete_thumbnail(&self, filename: &str) -> Result<(), MediaError> {
        remove_if_exists(&self.thumbnail_path(filename)?).await
    }
}

async fn write_file(path: &Path, data: &[u8]) -> Result<(), MediaError> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.flush().await?;
    Ok(())
}

async fn remove_if_exists(path: &Path) -> Result<(), MediaError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Blob {:?} already gone", path);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn unix_now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// The declared type must be an allowed video type. When the sniffer
/// recognises the bytes they must look like a video too (Ogg video is
/// reported as an Ogg audio container).
fn check_video_type(declared: Option<&str>, data: &[u8]) -> Result<String, MediaError> {
    let sniffed = infer::get(data).map(|kind| kind.mime_type());
    let declared = match declared {
        Some("application/octet-stream") | None => sniffed,
        other => other,
    };
    let Some(declared) = declared else {
        return Err(MediaError::UnsupportedFileType("unknown".to_string()));
    };
    if !ALLOWED_VIDEO_TYPES.contains(&declared) {
        return Err(MediaError::UnsupportedFileType(declared.to_string()));
    }
    match sniffed {
        Some(actual) if !actual.starts_with("video/") && actual != "audio/ogg" => Err(
            MediaError::UnsupportedFileType(format!("{} (declared {})", actual, declared)),
        ),
        _ => Ok(declared.to_string()),
    }
}

fn decode_thumbnail(encoded: &str) -> Result<Vec<u8>, MediaError> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, payload)) if prefix.starts_with("data:image/") => payload,
        Some((prefix, _)) => {
            return Err(MediaError::InvalidThumbnail(format!(
                "unexpected data url prefix '{}'",
                prefix
            )))
        }
        None => encoded,
    };
    let data = BASE64
        .decode(payload.trim())
        .map_err(|e| MediaError::InvalidThumbnail(e.to_string()))?;
    if data.is_empty() {
        return Err(MediaError::InvalidThumbnail("empty image".to_string()));
    }
    if let Some(kind) = infer::get(&data) {
        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(MediaError::InvalidThumbnail(format!(
                "not an image: {}",
                kind.mime_type()
            )));
        }
    }
    Ok(data)
}

/// Reduces an uploaded filename to a safe single path component.
fn sanitize_filename(filename: &str) -> Result<String, MediaError> {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| MediaError::InvalidFilename(filename.to_string()))?;

    if name.contains('\0') || name.starts_with('.') {
        return Err(MediaError::InvalidFilename(filename.to_string()));
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();

    if sanitized.is_empty() {
        return Err(MediaError::InvalidFilename(filename.to_string()));
    }
    Ok(sanitized)
}

/// Stored names are generated by us, anything with a path in it is rejected.
fn stored_name(filename: &str) -> Result<&str, MediaError> {
    if filename.is_empty()
        || filename.starts_with('.')
        || filename.contains(['/', '\\', '\0'])
    {
        return Err(MediaError::InvalidFilename(filename.to_string()));
    }
    Ok(filename)
}
