use super::schema::CONTENT_VERSIONED_SCHEMAS;
use super::*;
use crate::error::{lock, PlayError, PlayResult};
use crate::sqlite_persistence::{open_versioned_db, DEFAULT_TIMESTAMP};
use anyhow::Result;
use jiff::civil::Weekday;
use rusqlite::{
    params, params_from_iter, types::Value, Connection, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const VIDEO_COLUMNS: &str = "v.id, v.user_id, v.filename, v.original_filename, v.file_size, \
     v.mime_type, v.duration, v.thumbnail, v.created";

const PLAYLIST_COLUMNS: &str = "id, user_id, name, description, created, updated";

const SCHEDULE_COLUMNS: &str = "id, user_id, loop_playlist, monday_playlist_id, \
     tuesday_playlist_id, wednesday_playlist_id, thursday_playlist_id, friday_playlist_id, \
     saturday_playlist_id, sunday_playlist_id, created, updated";

#[derive(Clone)]
pub struct SqliteContentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteContentStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned_db(db_path.as_ref(), CONTENT_VERSIONED_SCHEMAS)?;
        info!("Opened content db {:?}", db_path.as_ref());
        Ok(SqliteContentStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` inside an IMMEDIATE transaction, so the write lock is held
    /// from the first read until commit.
    fn write<T>(&self, f: impl FnOnce(&Transaction) -> PlayResult<T>) -> PlayResult<T> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }
}

fn video_from_row(row: &Row, offset: usize) -> rusqlite::Result<Video> {
    Ok(Video {
        id: row.get(offset)?,
        user_id: row.get(offset + 1)?,
        filename: row.get(offset + 2)?,
        original_filename: row.get(offset + 3)?,
        file_size: row.get::<_, i64>(offset + 4)? as u64,
        mime_type: row.get(offset + 5)?,
        duration: row.get(offset + 6)?,
        thumbnail: row.get(offset + 7)?,
        created: row.get(offset + 8)?,
    })
}

fn playlist_from_row(row: &Row) -> rusqlite::Result<Playlist> {
    Ok(Playlist {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created: row.get(4)?,
        updated: row.get(5)?,
    })
}

fn schedule_from_row(row: &Row) -> rusqlite::Result<WeeklyScheduleConfig> {
    Ok(WeeklyScheduleConfig {
        id: row.get(0)?,
        user_id: row.get(1)?,
        loop_playlist: row.get::<_, i64>(2)? != 0,
        monday_playlist_id: row.get(3)?,
        tuesday_playlist_id: row.get(4)?,
        wednesday_playlist_id: row.get(5)?,
        thursday_playlist_id: row.get(6)?,
        friday_playlist_id: row.get(7)?,
        saturday_playlist_id: row.get(8)?,
        sunday_playlist_id: row.get(9)?,
        created: row.get(10)?,
        updated: row.get(11)?,
    })
}

fn slot_column(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Monday => "monday_playlist_id",
        Weekday::Tuesday => "tuesday_playlist_id",
        Weekday::Wednesday => "wednesday_playlist_id",
        Weekday::Thursday => "thursday_playlist_id",
        Weekday::Friday => "friday_playlist_id",
        Weekday::Saturday => "saturday_playlist_id",
        Weekday::Sunday => "sunday_playlist_id",
    }
}

/// Number of playlist memberships pointing at the video.
fn count_video_references(conn: &Connection, video_id: VideoId) -> PlayResult<usize> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM playlist_video WHERE video_id = ?1",
        params![video_id],
        |row| row.get(0),
    )?)
}

fn query_video(conn: &Connection, video_id: VideoId, owner: Option<UserId>) -> PlayResult<Option<Video>> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {} FROM video v WHERE v.id = ?1 AND (?2 IS NULL OR v.user_id = ?2)",
                VIDEO_COLUMNS
            ),
            params![video_id, owner],
            |row| video_from_row(row, 0),
        )
        .optional()?)
}

fn query_playlist(
    conn: &Connection,
    playlist_id: PlaylistId,
    owner: Option<UserId>,
) -> PlayResult<Option<Playlist>> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {} FROM playlist WHERE id = ?1 AND (?2 IS NULL OR user_id = ?2)",
                PLAYLIST_COLUMNS
            ),
            params![playlist_id, owner],
            playlist_from_row,
        )
        .optional()?)
}

fn query_schedule(conn: &Connection, user_id: UserId) -> PlayResult<Option<WeeklyScheduleConfig>> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {} FROM weekly_schedule WHERE user_id = ?1",
                SCHEDULE_COLUMNS
            ),
            params![user_id],
            schedule_from_row,
        )
        .optional()?)
}

fn touch_playlist(conn: &Connection, playlist_id: PlaylistId) -> PlayResult<()> {
    conn.execute(
        &format!(
            "UPDATE playlist SET updated = {} WHERE id = ?1",
            DEFAULT_TIMESTAMP
        ),
        params![playlist_id],
    )?;
    Ok(())
}

/// Membership ids of the playlist in their current order.
fn current_order(conn: &Connection, playlist_id: PlaylistId) -> PlayResult<Vec<MembershipId>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id FROM playlist_video WHERE playlist_id = ?1 ORDER BY position, added, id",
    )?;
    let ids = stmt
        .query_map(params![playlist_id], |row| row.get(0))?
        .collect::<Result<Vec<MembershipId>, _>>()?;
    Ok(ids)
}

/// Assigns positions 1..N following `ordered`.
fn write_positions(
    conn: &Connection,
    playlist_id: PlaylistId,
    ordered: &[MembershipId],
) -> PlayResult<()> {
    let mut stmt = conn.prepare_cached(
        "UPDATE playlist_video SET position = ?1 WHERE id = ?2 AND playlist_id = ?3",
    )?;
    for (index, membership_id) in ordered.iter().enumerate() {
        stmt.execute(params![index + 1, membership_id, playlist_id])?;
    }
    Ok(())
}

fn renumber(conn: &Connection, playlist_id: PlaylistId) -> PlayResult<()> {
    let ordered = current_order(conn, playlist_id)?;
    write_positions(conn, playlist_id, &ordered)
}

impl VideoStore for SqliteContentStore {
    fn insert_video(&self, video: &NewVideo) -> PlayResult<Video> {
        self.write(|tx| {
            tx.execute(
                "INSERT INTO video (user_id, filename, original_filename, file_size, mime_type, duration) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    video.user_id,
                    video.filename,
                    video.original_filename,
                    video.file_size as i64,
                    video.mime_type,
                    video.duration
                ],
            )?;
            let id = tx.last_insert_rowid();
            debug!("Inserted video {} for user {}", id, video.user_id);
            query_video(tx, id, None)?
                .ok_or_else(|| PlayError::Unavailable(format!("video {} vanished", id)))
        })
    }

    fn get_video(&self, video_id: VideoId, owner: Option<UserId>) -> PlayResult<Option<Video>> {
        let conn = lock(&self.conn)?;
        query_video(&conn, video_id, owner)
    }

    fn list_videos(&self, user_id: UserId) -> PlayResult<Vec<Video>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM video v WHERE v.user_id = ?1 ORDER BY v.created DESC, v.id DESC",
            VIDEO_COLUMNS
        ))?;
        let videos = stmt
            .query_map(params![user_id], |row| video_from_row(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(videos)
    }

    fn set_video_thumbnail(&self, video_id: VideoId, thumbnail: &str) -> PlayResult<bool> {
        let conn = lock(&self.conn)?;
        let updated = conn.execute(
            "UPDATE video SET thumbnail = ?1 WHERE id = ?2",
            params![thumbnail, video_id],
        )?;
        Ok(updated > 0)
    }

    fn delete_video(&self, video_id: VideoId, owner: UserId) -> PlayResult<Option<Video>> {
        self.write(|tx| {
            let Some(video) = query_video(tx, video_id, Some(owner))? else {
                return Ok(None);
            };
            let references = count_video_references(tx, video_id)?;
            if references > 0 {
                return Err(PlayError::Conflict(format!(
                    "video {} is used in {} playlist entries, remove it from all playlists first",
                    video_id, references
                )));
            }
            tx.execute("DELETE FROM video WHERE id = ?1", params![video_id])?;
            debug!("Deleted video {}", video_id);
            Ok(Some(video))
        })
    }
}

impl PlaylistStore for SqliteContentStore {
    fn create_playlist(
        &self,
        user_id: UserId,
        name: &str,
        description: Option<&str>,
    ) -> PlayResult<Playlist> {
        self.write(|tx| {
            tx.execute(
                "INSERT INTO playlist (user_id, name, description) VALUES (?1, ?2, ?3)",
                params![user_id, name, description],
            )?;
            let id = tx.last_insert_rowid();
            query_playlist(tx, id, None)?
                .ok_or_else(|| PlayError::Unavailable(format!("playlist {} vanished", id)))
        })
    }

    fn get_playlist(
        &self,
        playlist_id: PlaylistId,
        owner: Option<UserId>,
    ) -> PlayResult<Option<Playlist>> {
        let conn = lock(&self.conn)?;
        query_playlist(&conn, playlist_id, owner)
    }

    fn list_playlists(&self, user_id: UserId) -> PlayResult<Vec<PlaylistSummary>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.user_id, p.name, p.description, p.created, p.updated, COUNT(pv.id) \
             FROM playlist p LEFT JOIN playlist_video pv ON pv.playlist_id = p.id \
             WHERE p.user_id = ?1 \
             GROUP BY p.id ORDER BY p.updated DESC, p.id DESC",
        )?;
        let playlists = stmt
            .query_map(params![user_id], |row| {
                Ok(PlaylistSummary {
                    playlist: playlist_from_row(row)?,
                    video_count: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(playlists)
    }

    fn update_playlist(
        &self,
        playlist_id: PlaylistId,
        owner: UserId,
        update: &PlaylistUpdate,
    ) -> PlayResult<Option<Playlist>> {
        self.write(|tx| {
            if query_playlist(tx, playlist_id, Some(owner))?.is_none() {
                return Ok(None);
            }
            if let Some(name) = &update.name {
                tx.execute(
                    "UPDATE playlist SET name = ?1 WHERE id = ?2",
                    params![name, playlist_id],
                )?;
            }
            if let Some(description) = &update.description {
                tx.execute(
                    "UPDATE playlist SET description = ?1 WHERE id = ?2",
                    params![description, playlist_id],
                )?;
            }
            touch_playlist(tx, playlist_id)?;
            query_playlist(tx, playlist_id, None)
        })
    }

    fn delete_playlist(&self, playlist_id: PlaylistId, owner: UserId) -> PlayResult<bool> {
        self.write(|tx| {
            let deleted = tx.execute(
                "DELETE FROM playlist WHERE id = ?1 AND user_id = ?2",
                params![playlist_id, owner],
            )?;
            Ok(deleted > 0)
        })
    }
}

impl PlaylistMembershipStore for SqliteContentStore {
    fn append(&self, playlist_id: PlaylistId, video_id: VideoId) -> PlayResult<Membership> {
        self.write(|tx| {
            if query_playlist(tx, playlist_id, None)?.is_none() {
                return Err(PlayError::NotFound(format!("playlist {}", playlist_id)));
            }
            if query_video(tx, video_id, None)?.is_none() {
                return Err(PlayError::NotFound(format!("video {}", video_id)));
            }
            tx.execute(
                "INSERT INTO playlist_video (playlist_id, video_id, position) \
                 SELECT ?1, ?2, COALESCE(MAX(position), 0) + 1 \
                 FROM playlist_video WHERE playlist_id = ?1",
                params![playlist_id, video_id],
            )?;
            let id = tx.last_insert_rowid();
            touch_playlist(tx, playlist_id)?;
            let membership = tx.query_row(
                "SELECT id, playlist_id, video_id, position, added FROM playlist_video WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Membership {
                        id: row.get(0)?,
                        playlist_id: row.get(1)?,
                        video_id: row.get(2)?,
                        position: row.get(3)?,
                        added: row.get(4)?,
                    })
                },
            )?;
            debug!(
                "Appended video {} to playlist {} at position {}",
                video_id, playlist_id, membership.position
            );
            Ok(membership)
        })
    }

    fn remove_by_membership_id(
        &self,
        playlist_id: PlaylistId,
        membership_id: MembershipId,
    ) -> PlayResult<bool> {
        self.write(|tx| {
            let deleted = tx.execute(
                "DELETE FROM playlist_video WHERE id = ?1 AND playlist_id = ?2",
                params![membership_id, playlist_id],
            )?;
            if deleted == 0 {
                return Ok(false);
            }
            renumber(tx, playlist_id)?;
            touch_playlist(tx, playlist_id)?;
            Ok(true)
        })
    }

    fn remove_by_video_id(&self, playlist_id: PlaylistId, video_id: VideoId) -> PlayResult<bool> {
        self.write(|tx| {
            let first: Option<MembershipId> = tx
                .query_row(
                    "SELECT id FROM playlist_video WHERE playlist_id = ?1 AND video_id = ?2 \
                     ORDER BY position, id LIMIT 1",
                    params![playlist_id, video_id],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(membership_id) = first else {
                return Ok(false);
            };
            tx.execute(
                "DELETE FROM playlist_video WHERE id = ?1",
                params![membership_id],
            )?;
            renumber(tx, playlist_id)?;
            touch_playlist(tx, playlist_id)?;
            Ok(true)
        })
    }

    fn reorder(&self, playlist_id: PlaylistId, ordered: &[MembershipId]) -> PlayResult<()> {
        self.write(|tx| {
            if query_playlist(tx, playlist_id, None)?.is_none() {
                return Err(PlayError::NotFound(format!("playlist {}", playlist_id)));
            }
            let current = current_order(tx, playlist_id)?;
            let members: HashSet<MembershipId> = current.iter().copied().collect();

            let mut placed = HashSet::with_capacity(current.len());
            let mut new_order = Vec::with_capacity(current.len());
            for id in ordered {
                if members.contains(id) && placed.insert(*id) {
                    new_order.push(*id);
                }
            }
            for id in current {
                if placed.insert(id) {
                    new_order.push(id);
                }
            }

            write_positions(tx, playlist_id, &new_order)?;
            touch_playlist(tx, playlist_id)?;
            Ok(())
        })
    }

    fn list_ordered(
        &self,
        playlist_id: PlaylistId,
        owner: Option<UserId>,
    ) -> PlayResult<Vec<PlaylistEntry>> {
        let conn = lock(&self.conn)?;
        if query_playlist(&conn, playlist_id, owner)?.is_none() {
            return Err(PlayError::NotFound(format!("playlist {}", playlist_id)));
        }
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT pv.id, pv.playlist_id, pv.video_id, pv.position, pv.added, {} \
             FROM playlist_video pv \
             JOIN video v ON v.id = pv.video_id \
             JOIN playlist p ON p.id = pv.playlist_id \
             WHERE pv.playlist_id = ?1 AND (?2 IS NULL OR p.user_id = ?2) \
             ORDER BY pv.position, pv.id",
            VIDEO_COLUMNS
        ))?;
        let entries = stmt
            .query_map(params![playlist_id, owner], |row| {
                Ok(PlaylistEntry {
                    membership: Membership {
                        id: row.get(0)?,
                        playlist_id: row.get(1)?,
                        video_id: row.get(2)?,
                        position: row.get(3)?,
                        added: row.get(4)?,
                    },
                    video: video_from_row(row, 5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

impl ScheduleStore for SqliteContentStore {
    fn get_schedule(&self, user_id: UserId) -> PlayResult<Option<WeeklyScheduleConfig>> {
        let conn = lock(&self.conn)?;
        query_schedule(&conn, user_id)
    }

    fn insert_default_schedule(&self, user_id: UserId) -> PlayResult<WeeklyScheduleConfig> {
        self.write(|tx| {
            tx.execute(
                "INSERT INTO weekly_schedule (user_id) VALUES (?1)",
                params![user_id],
            )?;
            info!("Created weekly schedule for user {}", user_id);
            query_schedule(tx, user_id)?
                .ok_or_else(|| PlayError::Unavailable(format!("schedule of {} vanished", user_id)))
        })
    }

    fn apply_schedule_update(
        &self,
        user_id: UserId,
        update: &ScheduleUpdate,
    ) -> PlayResult<Option<WeeklyScheduleConfig>> {
        let mut assignments: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        if let Some(loop_playlist) = update.loop_playlist {
            values.push(Value::Integer(loop_playlist as i64));
            assignments.push(format!("loop_playlist = ?{}", values.len()));
        }
        for (weekday, change) in update.day_slots() {
            if let Some(slot) = change {
                values.push(slot.map(Value::Integer).unwrap_or(Value::Null));
                assignments.push(format!("{} = ?{}", slot_column(weekday), values.len()));
            }
        }
        assignments.push(format!("updated = {}", DEFAULT_TIMESTAMP));
        values.push(Value::Integer(user_id as i64));
        let sql = format!(
            "UPDATE weekly_schedule SET {} WHERE user_id = ?{}",
            assignments.join(", "),
            values.len()
        );

        self.write(|tx| {
            let updated = tx.execute(&sql, params_from_iter(values.iter()))?;
            if updated == 0 {
                return Ok(None);
            }
            query_schedule(tx, user_id)
        })
    }
}
