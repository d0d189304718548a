pub mod config;
mod api_error;
mod http_layers;
mod library_routes;
mod player_routes;
pub mod server;
mod session;
pub mod state;
mod stream_video;
mod system_routes;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
pub use state::{GuardedLibraryManager, GuardedUserManager, ServerState};
