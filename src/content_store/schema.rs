//! SQLite schema definitions for the content database.
//!
//! Users live in the user database, so `user_id` columns here are plain
//! integers without a foreign key.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};
use rusqlite::Connection;

// =============================================================================
// Version 0 - Videos, playlists, memberships and weekly schedules
// =============================================================================

const VIDEO_TABLE_V_0: Table = Table {
    name: "video",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("user_id", &SqlType::Integer, non_null = true),
        sqlite_column!("filename", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("original_filename", &SqlType::Text, non_null = true),
        sqlite_column!("file_size", &SqlType::Integer, non_null = true),
        sqlite_column!("mime_type", &SqlType::Text),
        sqlite_column!("duration", &SqlType::Real),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_video_user_id", "user_id")],
    unique_constraints: &[],
};

const PLAYLIST_TABLE_V_0: Table = Table {
    name: "playlist",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("user_id", &SqlType::Integer, non_null = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("description", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_playlist_user_id", "user_id")],
    unique_constraints: &[],
};

/// Ordered playlist entries. Positions are dense per playlist but not unique
/// at the SQL level, the renumbering pass keeps them consistent.
const PLAYLIST_VIDEO_TABLE_V_0: Table = Table {
    name: "playlist_video",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "playlist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "playlist",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "video_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "video",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Restrict,
            })
        ),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "added",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[
        ("idx_playlist_video_position", "playlist_id, position"),
        ("idx_playlist_video_video_id", "video_id"),
    ],
    unique_constraints: &[],
};

const SLOT_PLAYLIST_FK: ForeignKey = ForeignKey {
    foreign_table: "playlist",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const WEEKLY_SCHEDULE_TABLE_V_0: Table = Table {
    name: "weekly_schedule",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("user_id", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "loop_playlist",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "monday_playlist_id",
            &SqlType::Integer,
            foreign_key = Some(&SLOT_PLAYLIST_FK)
        ),
        sqlite_column!(
            "tuesday_playlist_id",
            &SqlType::Integer,
            foreign_key = Some(&SLOT_PLAYLIST_FK)
        ),
        sqlite_column!(
            "wednesday_playlist_id",
            &SqlType::Integer,
            foreign_key = Some(&SLOT_PLAYLIST_FK)
        ),
        sqlite_column!(
            "thursday_playlist_id",
            &SqlType::Integer,
            foreign_key = Some(&SLOT_PLAYLIST_FK)
        ),
        sqlite_column!(
            "friday_playlist_id",
            &SqlType::Integer,
            foreign_key = Some(&SLOT_PLAYLIST_FK)
        ),
        sqlite_column!(
            "saturday_playlist_id",
            &SqlType::Integer,
            foreign_key = Some(&SLOT_PLAYLIST_FK)
        ),
        sqlite_column!(
            "sunday_playlist_id",
            &SqlType::Integer,
            foreign_key = Some(&SLOT_PLAYLIST_FK)
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[&["user_id"]],
};

// =============================================================================
// Version 1 - Video thumbnails
// =============================================================================

const VIDEO_TABLE_V_1: Table = Table {
    name: "video",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("user_id", &SqlType::Integer, non_null = true),
        sqlite_column!("filename", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("original_filename", &SqlType::Text, non_null = true),
        sqlite_column!("file_size", &SqlType::Integer, non_null = true),
        sqlite_column!("mime_type", &SqlType::Text),
        sqlite_column!("duration", &SqlType::Real),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("thumbnail", &SqlType::Text),
    ],
    indices: &[("idx_video_user_id", "user_id")],
    unique_constraints: &[],
};

pub const CONTENT_VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 0,
        tables: &[
            VIDEO_TABLE_V_0,
            PLAYLIST_TABLE_V_0,
            PLAYLIST_VIDEO_TABLE_V_0,
            WEEKLY_SCHEDULE_TABLE_V_0,
        ],
        migration: None,
    },
    VersionedSchema {
        version: 1,
        tables: &[
            VIDEO_TABLE_V_1,
            PLAYLIST_TABLE_V_0,
            PLAYLIST_VIDEO_TABLE_V_0,
            WEEKLY_SCHEDULE_TABLE_V_0,
        ],
        migration: Some(|conn: &Connection| {
            conn.execute("ALTER TABLE video ADD COLUMN thumbnail TEXT", [])?;
            Ok(())
        }),
    },
];
