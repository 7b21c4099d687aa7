//! SQLite-backed warehouse.
//!
//! `SqliteWarehouse` persists star-schema rows and answers song lookups from
//! the songs and artists it already holds. One file's rows are written inside
//! one [`FileBatch`].

use super::models::*;
use super::schema::WAREHOUSE_VERSIONED_SCHEMAS;
use super::trait_def::{BatchScope, Sink, SongLookup};
use crate::sqlite_persistence::VersionedSchema;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;
use tracing::{debug, info, warn};

/// Row counts per warehouse table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarehouseCounts {
    pub songs: usize,
    pub artists: usize,
    pub users: usize,
    pub time_rows: usize,
    pub songplays: usize,
}

pub struct SqliteWarehouse {
    conn: Connection,
}

fn latest_schema() -> &'static VersionedSchema {
    &WAREHOUSE_VERSIONED_SCHEMAS[WAREHOUSE_VERSIONED_SCHEMAS.len() - 1]
}

fn create_or_validate_schema(conn: &Connection) -> Result<()> {
    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;

    let schema = latest_schema();
    if table_count == 0 {
        info!("Creating warehouse schema at version {}", schema.version);
        schema.create(conn)?;
        return Ok(());
    }

    schema
        .validate(conn)
        .context("Existing database does not match the warehouse schema")
}

impl SqliteWarehouse {
    /// Open (or create) the warehouse database at `db_path`.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(
            db_path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open warehouse database {:?}", db_path.as_ref()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        create_or_validate_schema(&conn)?;
        let warehouse = SqliteWarehouse { conn };
        let counts = warehouse.get_counts()?;
        info!(
            "Opened warehouse: {} songs, {} artists, {} users, {} time rows, {} songplays",
            counts.songs, counts.artists, counts.users, counts.time_rows, counts.songplays
        );
        Ok(warehouse)
    }

    /// Start the transaction holding one file's rows.
    pub fn begin_batch(&self) -> Result<FileBatch<'_>> {
        self.conn.execute("BEGIN IMMEDIATE", [])?;
        Ok(FileBatch {
            conn: &self.conn,
            finished: false,
        })
    }

    fn count(&self, table: &str) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
        Ok(count as usize)
    }

    pub fn get_counts(&self) -> Result<WarehouseCounts> {
        Ok(WarehouseCounts {
            songs: self.count("songs")?,
            artists: self.count("artists")?,
            users: self.count("users")?,
            time_rows: self.count("time")?,
            songplays: self.count("songplays")?,
        })
    }

    pub fn get_user(&self, user_id: &str) -> Result<Option<UserRow>> {
        match self.conn.query_row(
            "SELECT user_id, first_name, last_name, gender, level FROM users WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(UserRow {
                    user_id: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                    gender: row.get(3)?,
                    level: row.get(4)?,
                })
            },
        ) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All songplays in insertion order.
    pub fn get_songplays(&self) -> Result<Vec<SongplayFact>> {
        let mut stmt = self.conn.prepare(
            "SELECT start_time, user_id, level, song_id, artist_id, session_id, location, user_agent
             FROM songplays ORDER BY songplay_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    SongplayFact {
                        start_time: Default::default(),
                        user_id: row.get(1)?,
                        level: row.get(2)?,
                        song_id: row.get(3)?,
                        artist_id: row.get(4)?,
                        session_id: row.get(5)?,
                        location: row.get(6)?,
                        user_agent: row.get(7)?,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(start_time, mut songplay)| {
                songplay.start_time = NaiveDateTime::parse_from_str(&start_time, START_TIME_FORMAT)
                    .with_context(|| format!("Invalid stored start_time '{}'", start_time))?
                    .and_utc();
                Ok(songplay)
            })
            .collect()
    }
}

/// An open transaction covering one input file.
///
/// Dropping a batch without calling [`FileBatch::commit`] rolls it back.
pub struct FileBatch<'a> {
    conn: &'a Connection,
    finished: bool,
}

impl FileBatch<'_> {
    pub fn commit(mut self) -> Result<()> {
        self.conn.execute("COMMIT", [])?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for FileBatch<'_> {
    fn drop(&mut self) {
        if !self.finished {
            debug!("Rolling back uncommitted file batch");
            if let Err(e) = self.conn.execute("ROLLBACK", []) {
                warn!("Failed to roll back file batch: {}", e);
            }
        }
    }
}

impl BatchScope for SqliteWarehouse {
    fn with_batch<T, E, F>(&self, load: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<anyhow::Error>,
    {
        let batch = self.begin_batch()?;
        let loaded = load()?;
        batch.commit()?;
        Ok(loaded)
    }
}

impl SongLookup for SqliteWarehouse {
    fn find_song(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<SongMatch>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT s.song_id, s.artist_id
             FROM songs s
             JOIN artists a ON s.artist_id = a.artist_id
             WHERE s.title = ?1 AND a.name = ?2 AND s.duration = ?3
             LIMIT 2",
        )?;
        let mut matches = stmt
            .query_map(params![title, artist_name, duration], |row| {
                Ok(SongMatch {
                    song_id: row.get(0)?,
                    artist_id: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if matches.len() == 1 {
            Ok(matches.pop())
        } else {
            Ok(None)
        }
    }
}

impl Sink for SqliteWarehouse {
    fn insert_song(&self, song: &Song) -> Result<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO songs (song_id, title, artist_id, year, duration)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(song_id) DO NOTHING",
            )?
            .execute(params![
                &song.song_id,
                &song.title,
                &song.artist_id,
                song.year,
                song.duration
            ])
            .with_context(|| format!("Failed to insert song {}", song.song_id))?;
        Ok(())
    }

    fn insert_artist(&self, artist: &Artist) -> Result<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO artists (artist_id, name, location, latitude, longitude)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(artist_id) DO NOTHING",
            )?
            .execute(params![
                &artist.artist_id,
                &artist.name,
                &artist.location,
                artist.latitude,
                artist.longitude
            ])
            .with_context(|| format!("Failed to insert artist {}", artist.artist_id))?;
        Ok(())
    }

    fn insert_time(&self, time: &TimeRow) -> Result<()> {
        let start_time = format_start_time(&time.start_time);
        self.conn
            .prepare_cached(
                "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(start_time) DO NOTHING",
            )?
            .execute(params![
                &start_time,
                time.hour,
                time.day,
                time.week,
                time.month,
                time.year,
                time.weekday
            ])
            .with_context(|| format!("Failed to insert time row {}", start_time))?;
        Ok(())
    }

    fn insert_user(&self, user: &UserRow) -> Result<()> {
        // The latest subscription level wins on key conflict
        self.conn
            .prepare_cached(
                "INSERT INTO users (user_id, first_name, last_name, gender, level)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id) DO UPDATE SET level = excluded.level",
            )?
            .execute(params![
                &user.user_id,
                &user.first_name,
                &user.last_name,
                &user.gender,
                &user.level
            ])
            .with_context(|| format!("Failed to insert user {:?}", user.user_id))?;
        Ok(())
    }

    fn insert_songplay(&self, songplay: &SongplayFact) -> Result<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO songplays
                 (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?
            .execute(params![
                format_start_time(&songplay.start_time),
                &songplay.user_id,
                &songplay.level,
                &songplay.song_id,
                &songplay.artist_id,
                &songplay.session_id,
                &songplay.location,
                &songplay.user_agent
            ])
            .context("Failed to insert songplay")?;
        Ok(())
    }
}
