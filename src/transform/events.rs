//! User activity events and the playback filter.

use super::fields::{optional_f64, optional_i64, optional_id, optional_string, ExtractError};
use super::time::ceil_to_second;
use crate::records::Record;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Action type marking a completed song playback.
pub const NEXT_SONG: &str = "NextSong";

/// One line of the activity log.
///
/// Every field is optional here: navigation and administrative actions
/// routinely lack song, user or session data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActivityEvent {
    pub action_type: Option<String>,
    /// Milliseconds since the epoch.
    pub ts: Option<i64>,
    pub user_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
    pub song_title: Option<String>,
    pub artist_name: Option<String>,
    /// Seconds.
    pub duration: Option<f64>,
    pub session_id: Option<String>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

impl ActivityEvent {
    pub fn from_record(record: &Record) -> Result<Self, ExtractError> {
        Ok(ActivityEvent {
            action_type: optional_string(record, "page")?,
            ts: optional_i64(record, "ts")?,
            user_id: optional_id(record, "userId")?,
            first_name: optional_string(record, "firstName")?,
            last_name: optional_string(record, "lastName")?,
            gender: optional_string(record, "gender")?,
            level: optional_string(record, "level")?,
            song_title: optional_string(record, "song")?,
            artist_name: optional_string(record, "artist")?,
            duration: optional_f64(record, "length")?,
            session_id: optional_id(record, "sessionId")?,
            location: optional_string(record, "location")?,
            user_agent: optional_string(record, "userAgent")?,
        })
    }
}

/// Anything carrying the action type of one log line.
pub trait PageAction {
    fn action_type(&self) -> Option<&str>;

    fn is_next_song(&self) -> bool {
        self.action_type() == Some(NEXT_SONG)
    }
}

impl PageAction for ActivityEvent {
    fn action_type(&self) -> Option<&str> {
        self.action_type.as_deref()
    }
}

/// A raw record. Only `page` is looked at, so other fields may hold anything.
impl PageAction for Record {
    fn action_type(&self) -> Option<&str> {
        self.get("page").and_then(Value::as_str)
    }
}

impl<T: PageAction + ?Sized> PageAction for &T {
    fn action_type(&self) -> Option<&str> {
        (**self).action_type()
    }
}

/// An item tagged with its position in the file.
impl<T: PageAction> PageAction for (usize, T) {
    fn action_type(&self) -> Option<&str> {
        self.1.action_type()
    }
}

/// Keep only completed playbacks, preserving order.
pub fn filter_next_song<T, I>(events: I) -> Vec<T>
where
    T: PageAction,
    I: IntoIterator<Item = T>,
{
    events.into_iter().filter(|e| e.is_next_song()).collect()
}

/// A playback event together with its start time, the event timestamp rounded
/// up to the whole second.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayEvent {
    pub start_time: DateTime<Utc>,
    pub event: ActivityEvent,
}

impl TryFrom<ActivityEvent> for PlayEvent {
    type Error = ExtractError;

    fn try_from(event: ActivityEvent) -> Result<Self, Self::Error> {
        let ts = event.ts.ok_or(ExtractError::MissingField("ts"))?;
        let start_time = ceil_to_second(ts).ok_or_else(|| ExtractError::InvalidField {
            field: "ts",
            expected: "a timestamp within the calendar range",
            found: ts.to_string(),
        })?;
        Ok(PlayEvent { start_time, event })
    }
}
