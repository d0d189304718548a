//! PLAY server library
//!
//! This library exposes the internal modules for testing and for the
//! `cli-auth` tool.

pub mod config;
pub mod content_store;
pub mod error;
pub mod library;
pub mod media;
pub mod playback;
pub mod schedule;
pub mod server;
pub mod sqlite_persistence;
pub mod user;

// Re-export commonly used types for convenience
pub use error::{PlayError, PlayResult};
pub use library::LibraryManager;
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig, ServerState};
pub use user::{SqliteUserStore, UserManager, UserStore};
