use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_versioned_db, Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
    DEFAULT_TIMESTAMP,
};
use crate::user::*;
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
    sync::{Arc, Mutex, MutexGuard},
    time::SystemTime,
};
use tracing::debug;

/// V 0
const USER_TABLE_V_0: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("email", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_user_email", "email")],
};
const AUTH_TOKEN_TABLE_V_0: Table = Table {
    name: "auth_token",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("value", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    unique_constraints: &[],
    indices: &[("idx_auth_token_value", "value")],
};
const USER_PASSWORD_CREDENTIALS_V_0: Table = Table {
    name: "user_password_credentials",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            is_unique = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_tried", &SqlType::Integer),
        sqlite_column!("last_used", &SqlType::Integer),
    ],
    unique_constraints: &[],
    indices: &[],
};

pub const USER_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        USER_TABLE_V_0,
        AUTH_TOKEN_TABLE_V_0,
        USER_PASSWORD_CREDENTIALS_V_0,
    ],
    migration: None,
}];

const NOW_SECONDS: &str = "cast(strftime('%s','now') as int)";

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned_db(db_path, USER_VERSIONED_SCHEMAS)?;
        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Looks for a `user.db` in `/data/db`, then in the working directory and
    /// each of its ancestors.
    pub fn infer_path() -> Option<PathBuf> {
        let db_data_dir = PathBuf::from("/data/db/user.db");
        if db_data_dir.exists() {
            return Some(db_data_dir);
        }

        let mut current_dir = std::env::current_dir().ok()?;
        loop {
            let candidate = current_dir.join("user.db");
            if candidate.is_file() {
                return Some(candidate);
            }
            if let Some(parent) = current_dir.parent() {
                current_dir = parent.to_path_buf();
            } else {
                break;
            }
        }

        None
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("User database connection poisoned"))
    }
}

fn system_time_from_column_result(value: i64) -> SystemTime {
    SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(value.max(0) as u64)
}

fn auth_token_from_row(row: &Row) -> rusqlite::Result<AuthToken> {
    Ok(AuthToken {
        user_id: row.get(0)?,
        value: AuthTokenValue(row.get(1)?),
        created: system_time_from_column_result(row.get(2)?),
        last_used: row
            .get::<usize, Option<i64>>(3)?
            .map(system_time_from_column_result),
    })
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, email: &str) -> Result<usize> {
        let conn = self.conn()?;
        conn.execute("INSERT INTO user (email) VALUES (?1)", params![email])
            .with_context(|| format!("Failed to create user {}", email))?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_user_email(&self, user_id: usize) -> Result<Option<String>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT email FROM user WHERE id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn get_user_id(&self, email: &str) -> Result<Option<usize>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT id FROM user WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn get_all_user_emails(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT email FROM user ORDER BY id")?;
        let emails = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(emails)
    }
}

impl UserAuthTokenStore for SqliteUserStore {
    fn get_user_auth_token(&self, value: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT user_id, value, created, last_used FROM auth_token WHERE value = ?1",
                params![value.0],
                auth_token_from_row,
            )
            .optional()?)
    }

    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let Some(token) = self.get_user_auth_token(token)? else {
            return Ok(None);
        };
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM auth_token WHERE value = ?1",
            params![token.value.0],
        )?;
        Ok((deleted > 0).then_some(token))
    }

    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "UPDATE auth_token SET last_used = {} WHERE value = ?1",
                NOW_SECONDS
            ),
            params![token.0],
        )?;
        Ok(())
    }

    fn add_user_auth_token(&self, token: AuthToken) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO auth_token (value, user_id) VALUES (?1, ?2)",
            params![token.value.0, token.user_id],
        )?;
        Ok(())
    }

    fn get_all_user_auth_tokens(&self, email: &str) -> Result<Vec<AuthToken>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, value, created, last_used FROM auth_token \
             WHERE user_id = (SELECT id FROM user WHERE email = ?1) ORDER BY created",
        )?;
        let tokens = stmt
            .query_map(params![email], auth_token_from_row)?
            .collect::<Result<Vec<AuthToken>, _>>()?;
        Ok(tokens)
    }
}

impl UserAuthCredentialsStore for SqliteUserStore {
    fn get_user_auth_credentials(&self, email: &str) -> Result<Option<UserAuthCredentials>> {
        let Some(user_id) = self.get_user_id(email)? else {
            return Ok(None);
        };
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT user_id, salt, hash, hasher, created, last_tried, last_used \
                 FROM user_password_credentials WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        row.get::<usize, usize>(0)?,
                        row.get::<usize, String>(1)?,
                        row.get::<usize, String>(2)?,
                        row.get::<usize, String>(3)?,
                        row.get::<usize, i64>(4)?,
                        row.get::<usize, Option<i64>>(5)?,
                        row.get::<usize, Option<i64>>(6)?,
                    ))
                },
            )
            .optional()?;

        let email_password = match row {
            Some((user_id, salt, hash, hasher, created, last_tried, last_used)) => {
                let hasher = PlayHasher::from_str(&hasher)
                    .with_context(|| format!("Invalid hasher stored for user {}", user_id))?;
                Some(EmailPasswordCredentials {
                    user_id,
                    salt,
                    hash,
                    hasher,
                    created: system_time_from_column_result(created),
                    last_tried: last_tried.map(system_time_from_column_result),
                    last_used: last_used.map(system_time_from_column_result),
                })
            }
            None => None,
        };

        Ok(Some(UserAuthCredentials {
            user_id,
            email_password,
        }))
    }

    fn update_user_auth_credentials(&self, credentials: UserAuthCredentials) -> Result<()> {
        let conn = self.conn()?;
        let user_id = credentials.user_id;
        match credentials.email_password.as_ref() {
            Some(password_credentials) => {
                let updated = conn.execute(
                    "UPDATE user_password_credentials SET salt = ?1, hash = ?2, hasher = ?3 \
                     WHERE user_id = ?4",
                    params![
                        password_credentials.salt,
                        password_credentials.hash,
                        password_credentials.hasher.to_string(),
                        user_id
                    ],
                )?;
                if updated == 0 {
                    conn.execute(
                        "INSERT INTO user_password_credentials (salt, hash, hasher, user_id) \
                         VALUES (?1, ?2, ?3, ?4)",
                        params![
                            password_credentials.salt,
                            password_credentials.hash,
                            password_credentials.hasher.to_string(),
                            user_id
                        ],
                    )?;
                }
            }
            None => {
                conn.execute(
                    "DELETE FROM user_password_credentials WHERE user_id = ?1",
                    params![user_id],
                )?;
            }
        };
        Ok(())
    }

    fn touch_password_credentials(&self, user_id: usize, succeeded: bool) -> Result<()> {
        let conn = self.conn()?;
        let sql = if succeeded {
            format!(
                "UPDATE user_password_credentials SET last_tried = {0}, last_used = {0} \
                 WHERE user_id = ?1",
                NOW_SECONDS
            )
        } else {
            format!(
                "UPDATE user_password_credentials SET last_tried = {} WHERE user_id = ?1",
                NOW_SECONDS
            )
        };
        let updated = conn.execute(&sql, params![user_id])?;
        debug!("touch_password_credentials({user_id}, {succeeded}) updated {updated} rows");
        Ok(())
    }
}
