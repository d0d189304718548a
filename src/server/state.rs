use axum::extract::FromRef;

use crate::library::LibraryManager;
use crate::user::UserManager;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use super::ServerConfig;

pub type GuardedLibraryManager = Arc<LibraryManager>;
pub type GuardedUserManager = Arc<Mutex<UserManager>>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub library: GuardedLibraryManager,
    pub user_manager: GuardedUserManager,
    pub hash: String,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        library: GuardedLibraryManager,
        user_manager: GuardedUserManager,
    ) -> Self {
        ServerState {
            config,
            start_time: Instant::now(),
            library,
            user_manager,
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

impl FromRef<ServerState> for GuardedLibraryManager {
    fn from_ref(input: &ServerState) -> Self {
        input.library.clone()
    }
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
