//! Test data directories laid out like the real dataset:
//! `song_data/A/B/C/TR*.json` and `log_data/YYYY/MM/YYYY-MM-DD-events.json`.

use super::constants::*;
use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestDataset {
    // Kept alive for the duration of the test
    _dir: TempDir,
    pub song_data: PathBuf,
    pub log_data: PathBuf,
    pub db_path: PathBuf,
}

pub fn song_record() -> String {
    format!(
        r#"{{"num_songs": 1, "artist_id": "{ARTIST_ID}", "artist_latitude": 49.80388, "artist_longitude": 15.47491, "artist_location": "Dubai UAE", "artist_name": "{ARTIST_NAME}", "song_id": "{SONG_ID}", "title": "{SONG_TITLE}", "duration": {SONG_DURATION}, "year": 0}}"#
    )
}

pub fn log_record(page: &str, ts: i64, level: &str, song: &str, artist: &str, length: f64) -> String {
    format!(
        r#"{{"artist":"{artist}","auth":"Logged In","firstName":"Lily","gender":"F","itemInSession":0,"lastName":"Koch","length":{length},"level":"{level}","location":"Chicago-Naperville-Elgin, IL-IN-WI","method":"PUT","page":"{page}","registration":1541048010796.0,"sessionId":{SESSION_ID},"song":"{song}","status":200,"ts":{ts},"userAgent":"Mozilla/5.0 (X11; Linux x86_64)","userId":"{USER_ID}"}}"#
    )
}

/// One session: a navigation action and three playbacks, the first of which
/// matches the fixture song.
pub fn session_records() -> Vec<String> {
    vec![
        log_record("Home", 1542837400000, "free", "", "", 0.0),
        log_record("NextSong", MATCHING_PLAY_TS, "free", SONG_TITLE, ARTIST_NAME, SONG_DURATION),
        log_record("NextSong", 1542837676796, "free", "You Gotta Be", "Des'ree", 246.30812),
        log_record("NextSong", 1542837923796, "paid", "Mercy", "Duffy", 219.66322),
    ]
}

impl TestDataset {
    pub fn empty() -> Result<Self> {
        let dir = TempDir::new()?;
        let song_data = dir.path().join("song_data");
        let log_data = dir.path().join("log_data");
        fs::create_dir_all(&song_data)?;
        fs::create_dir_all(&log_data)?;
        let db_path = dir.path().join("sparkify.db");
        Ok(Self {
            _dir: dir,
            song_data,
            log_data,
            db_path,
        })
    }

    /// One song file and one log file holding [`session_records`].
    pub fn single_session() -> Result<Self> {
        let dataset = Self::empty()?;
        dataset.add_song_file("A/A/A/TRAAAAW128F429D538.json", &song_record())?;
        dataset.add_log_file("2018-11-21-events.json", &session_records().join("\n"))?;
        Ok(dataset)
    }

    pub fn add_song_file(&self, relative: &str, content: &str) -> Result<PathBuf> {
        write_file(self.song_data.join(relative), content)
    }

    /// Log files are placed under `YYYY/MM/` like the real dataset.
    pub fn add_log_file(&self, name: &str, content: &str) -> Result<PathBuf> {
        write_file(self.log_data.join("2018/11").join(name), content)
    }
}

fn write_file(path: PathBuf, content: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, content)?;
    Ok(path)
}
