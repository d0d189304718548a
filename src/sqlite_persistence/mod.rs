mod versioned_schema;

pub use versioned_schema::*;

use anyhow::{bail, Context, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// How long a connection waits on a locked database before giving up.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) a database file whose layout is described by `schemas`.
///
/// A fresh file gets the latest schema. An existing file is validated against
/// the schema matching its stored version and then migrated forward, each
/// step inside its own transaction.
pub fn open_versioned_db<P: AsRef<Path>>(
    db_path: P,
    schemas: &[VersionedSchema],
) -> Result<Connection> {
    let db_path = db_path.as_ref();
    let latest = schemas.last().context("No schema versions defined")?;

    let conn = if db_path.exists() {
        Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open database {:?}", db_path))?
    } else {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to create database {:?}", db_path))?;
        info!("Creating database {:?} at version {}", db_path, latest.version);
        latest.create(&conn)?;
        conn
    };
    conn.execute("PRAGMA foreign_keys = ON;", [])?;
    conn.busy_timeout(BUSY_TIMEOUT)?;

    let db_version = conn
        .query_row("PRAGMA user_version;", [], |row| row.get::<usize, i64>(0))
        .context("Failed to read database version")?
        - BASE_DB_VERSION as i64;
    if db_version < 0 {
        bail!(
            "Database version {} is too old, does not contain base db version {}",
            db_version,
            BASE_DB_VERSION
        );
    }
    let version = db_version as usize;
    if version >= schemas.len() {
        bail!("Database version {} is too new", version);
    }
    schemas[version].validate(&conn)?;

    migrate_if_needed(&conn, schemas, version)?;
    Ok(conn)
}

fn migrate_if_needed(conn: &Connection, schemas: &[VersionedSchema], from: usize) -> Result<()> {
    for schema in schemas.iter().skip(from + 1) {
        info!("Migrating db to version {}", schema.version);
        let tx = conn.unchecked_transaction()?;
        if let Some(migration_fn) = schema.migration {
            migration_fn(&tx)?;
        }
        tx.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + schema.version),
            [],
        )?;
        tx.commit()?;
        schema.validate(conn)?;
    }
    Ok(())
}
