mod blob_store;

pub use blob_store::{BlobStore, MediaError, StoredBlob, ALLOWED_VIDEO_TYPES};
