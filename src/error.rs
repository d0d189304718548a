use rusqlite::ErrorCode;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by the content, schedule and library layers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlayError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A uniqueness or reference constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An upload exceeded the configured size limit.
    #[error("Too large: {0}")]
    TooLarge(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type PlayResult<T> = std::result::Result<T, PlayError>;

impl From<rusqlite::Error> for PlayError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::QueryReturnedNoRows => PlayError::NotFound(err.to_string()),
            rusqlite::Error::SqliteFailure(e, msg) if e.code == ErrorCode::ConstraintViolation => {
                let msg = msg.clone().unwrap_or_else(|| err.to_string());
                if msg.contains("FOREIGN KEY") {
                    PlayError::NotFound(msg)
                } else {
                    PlayError::Conflict(msg)
                }
            }
            _ => PlayError::Unavailable(err.to_string()),
        }
    }
}

impl From<std::io::Error> for PlayError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => PlayError::NotFound(err.to_string()),
            _ => PlayError::Unavailable(err.to_string()),
        }
    }
}

/// Locks `mutex`, turning a poisoned lock into [`PlayError::Unavailable`].
pub fn lock<T>(mutex: &Mutex<T>) -> PlayResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| PlayError::Unavailable("connection lock poisoned".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE parent (id INTEGER PRIMARY KEY, name TEXT UNIQUE);
             CREATE TABLE child (id INTEGER PRIMARY KEY, parent_id INTEGER NOT NULL REFERENCES parent(id));
             INSERT INTO parent (id, name) VALUES (1, 'a');",
        )
        .unwrap();
        conn
    }

    #[test]
    fn unique_violation_maps_to_conflict() {
        let err = conn()
            .execute("INSERT INTO parent (name) VALUES ('a')", [])
            .unwrap_err();
        assert!(matches!(PlayError::from(err), PlayError::Conflict(_)));
    }

    #[test]
    fn foreign_key_violation_maps_to_not_found() {
        let err = conn()
            .execute("INSERT INTO child (parent_id) VALUES (42)", [])
            .unwrap_err();
        assert!(matches!(PlayError::from(err), PlayError::NotFound(_)));
    }

    #[test]
    fn missing_row_maps_to_not_found() {
        let err = conn()
            .query_row("SELECT id FROM parent WHERE id = 99", [], |r| r.get::<_, i64>(0))
            .unwrap_err();
        assert!(matches!(PlayError::from(err), PlayError::NotFound(_)));
    }

    #[test]
    fn poisoned_lock_is_unavailable() {
        let mutex = std::sync::Arc::new(Mutex::new(0));
        let cloned = mutex.clone();
        let _ = std::thread::spawn(move || {
            let _guard = cloned.lock().unwrap();
            panic!("poison");
        })
        .join();
        assert!(matches!(lock(&mutex), Err(PlayError::Unavailable(_))));
    }
}
