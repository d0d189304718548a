//! Test fixture creation for the databases and media directory

use super::constants::*;
use anyhow::Result;
use play_server::user::{SqliteUserStore, UserManager};
use std::path::PathBuf;
use tempfile::TempDir;

/// Creates a temporary data directory holding a user database with
/// `TEST_USER` (id 1) and `OTHER_USER` (id 2), both with a password.
/// Returns (temp_dir, user_db_path)
pub fn create_test_db_with_users() -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("user.db");

    let user_manager = UserManager::new(Box::new(SqliteUserStore::new(&db_path)?));
    for (email, password) in [(TEST_USER, TEST_PASS), (OTHER_USER, OTHER_PASS)] {
        user_manager.add_user(email)?;
        user_manager.create_password_credentials(email, password)?;
    }

    Ok((dir, db_path))
}
