//! Per-file batches: one input file in, all of its rows out.
//!
//! A file is read completely before any row is produced, so a malformed file
//! never reaches the sink. Records that parse but cannot be turned into rows
//! are reported as [`RecordRejection`]s and do not stop the rest of the file.

use super::error::IngestError;
use crate::records::{read_records, Record};
use crate::transform::{
    build_time_rows, build_user_rows, extract_song_dimensions, filter_next_song,
    resolve_songplays, ActivityEvent, ExtractError, PlayEvent,
};
use crate::warehouse::{Artist, Sink, Song, SongLookup, SongplayFact, TimeRow, UserRow};
use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A record that was parsed but produced no rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordRejection {
    /// 1-based position of the record in its file.
    pub index: usize,
    pub reason: ExtractError,
}

impl fmt::Display for RecordRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record {}: {}", self.index, self.reason)
    }
}

/// Rows derived from one song-metadata file.
#[derive(Debug, Clone, PartialEq)]
pub struct SongFileRows {
    pub path: PathBuf,
    /// `None` when the file's record was rejected.
    pub dimensions: Option<(Song, Artist)>,
    pub rejections: Vec<RecordRejection>,
    /// Records after the first one, which are not used.
    pub ignored_records: usize,
}

/// Rows derived from one activity log file, each kind in playback order.
#[derive(Debug, Clone, PartialEq)]
pub struct LogFileRows {
    pub path: PathBuf,
    pub time_rows: Vec<TimeRow>,
    pub users: Vec<UserRow>,
    pub songplays: Vec<SongplayFact>,
    pub events_read: usize,
    pub rejections: Vec<RecordRejection>,
}

impl LogFileRows {
    pub fn resolved_songplays(&self) -> usize {
        self.songplays.iter().filter(|s| s.is_resolved()).count()
    }
}

/// Song files hold one record; any following record is ignored.
pub fn transform_song_file(path: &Path) -> Result<SongFileRows, IngestError> {
    let records = read_records(path)?;
    let Some(first) = records.first() else {
        return Err(IngestError::EmptySongFile(path.to_path_buf()));
    };

    let ignored_records = records.len() - 1;
    if ignored_records > 0 {
        warn!(
            "Song file {:?} has {} records, only the first one is used",
            path,
            records.len()
        );
    }

    let (dimensions, rejections) = match extract_song_dimensions(first) {
        Ok(dimensions) => (Some(dimensions), vec![]),
        Err(reason) => (None, vec![RecordRejection { index: 1, reason }]),
    };

    Ok(SongFileRows {
        path: path.to_path_buf(),
        dimensions,
        rejections,
        ignored_records,
    })
}

/// Turn one activity log file into time, user and songplay rows.
///
/// Records are filtered on their `page` before anything else is read from
/// them, so only `NextSong` events are typed, validated and turned into rows.
/// Songs are resolved through `lookup`, once per playback; a failing lookup
/// aborts the file.
pub fn transform_log_file(
    path: &Path,
    lookup: &dyn SongLookup,
) -> Result<LogFileRows, IngestError> {
    let records = read_records(path)?;
    let events_read = records.len();

    let playbacks = filter_next_song(records.iter().enumerate().map(|(i, r)| (i + 1, r)));

    let mut rejections = vec![];
    let mut plays = vec![];
    for (index, record) in playbacks {
        match playback(record) {
            Ok(play) => plays.push(play),
            Err(reason) => rejections.push(RecordRejection { index, reason }),
        }
    }

    let time_rows = build_time_rows(&plays);
    let users = build_user_rows(&plays);
    let songplays = resolve_songplays(&plays, lookup).map_err(|source| IngestError::Lookup {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(LogFileRows {
        path: path.to_path_buf(),
        time_rows,
        users,
        songplays,
        events_read,
        rejections,
    })
}

fn playback(record: &Record) -> Result<PlayEvent, ExtractError> {
    let event = ActivityEvent::from_record(record)?;
    if event.user_id.is_none() {
        return Err(ExtractError::MissingField("userId"));
    }
    PlayEvent::try_from(event)
}

pub fn load_song_rows(rows: &SongFileRows, sink: &dyn Sink) -> Result<()> {
    if let Some((song, artist)) = &rows.dimensions {
        sink.insert_song(song)
            .with_context(|| format!("Failed to insert song {}", song.song_id))?;
        sink.insert_artist(artist)
            .with_context(|| format!("Failed to insert artist {}", artist.artist_id))?;
    }
    Ok(())
}

pub fn load_log_rows(rows: &LogFileRows, sink: &dyn Sink) -> Result<()> {
    for time in &rows.time_rows {
        sink.insert_time(time)
            .with_context(|| format!("Failed to insert time row {}", time.start_time))?;
    }
    for user in &rows.users {
        sink.insert_user(user)
            .with_context(|| format!("Failed to insert user {:?}", user.user_id))?;
    }
    for songplay in &rows.songplays {
        sink.insert_songplay(songplay).with_context(|| {
            format!(
                "Failed to insert songplay of user {:?} at {}",
                songplay.user_id, songplay.start_time
            )
        })?;
    }
    Ok(())
}
