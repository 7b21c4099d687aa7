//! Typed star-schema rows.
//!
//! Dimension rows (song, artist, user, time) and the songplay fact row, with
//! fixed named fields. Every row kind maps onto exactly one warehouse table.

use chrono::{DateTime, Datelike, NaiveTime, Timelike, Utc, Weekday};

/// Format used to persist `start_time` values.
pub const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A song dimension row, taken verbatim from one song-metadata record.
#[derive(Clone, Debug, PartialEq)]
pub struct Song {
    pub song_id: String,
    pub title: Option<String>,
    pub artist_id: String,
    /// 0 when the release year is unknown.
    pub year: Option<i64>,
    /// Seconds.
    pub duration: Option<f64>,
}

/// An artist dimension row, co-derived with a [`Song`] from the same record.
#[derive(Clone, Debug, PartialEq)]
pub struct Artist {
    pub artist_id: String,
    pub name: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A time dimension row derived from one playback event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeRow {
    /// Event instant rounded up to the whole second.
    pub start_time: DateTime<Utc>,
    pub hour: u32,
    pub day: u32,
    /// ISO-8601 week number.
    pub week: u32,
    pub month: u32,
    pub year: i32,
    pub weekday: &'static str,
}

impl TimeRow {
    pub fn from_start_time(start_time: DateTime<Utc>) -> Self {
        TimeRow {
            start_time,
            hour: start_time.hour(),
            day: start_time.day(),
            week: start_time.iso_week().week(),
            month: start_time.month(),
            year: start_time.year(),
            weekday: weekday_name(start_time.weekday()),
        }
    }

    pub fn time_of_day(&self) -> NaiveTime {
        self.start_time.time()
    }
}

/// Full English weekday name, independent of the process locale.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// A user dimension row. Two rows for the same `user_id` with a different
/// `level` are distinct rows.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserRow {
    pub user_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
}

/// The songplay fact row.
#[derive(Clone, Debug, PartialEq)]
pub struct SongplayFact {
    pub start_time: DateTime<Utc>,
    pub user_id: Option<String>,
    pub level: Option<String>,
    /// `None` when the played song could not be resolved.
    pub song_id: Option<String>,
    /// `None` when the played song could not be resolved.
    pub artist_id: Option<String>,
    pub session_id: Option<String>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

impl SongplayFact {
    pub fn is_resolved(&self) -> bool {
        self.song_id.is_some() && self.artist_id.is_some()
    }
}

/// Result of a successful song lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongMatch {
    pub song_id: String,
    pub artist_id: String,
}

pub fn format_start_time(start_time: &DateTime<Utc>) -> String {
    start_time.format(START_TIME_FORMAT).to_string()
}
