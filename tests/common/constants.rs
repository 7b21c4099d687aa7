//! Shared constants for end-to-end tests

// ============================================================================
// Song metadata
// ============================================================================

pub const SONG_ID: &str = "SOZCTXZ12AB0182364";
pub const SONG_TITLE: &str = "Setanta matins";
pub const SONG_DURATION: f64 = 269.58;

pub const ARTIST_ID: &str = "AR5KOSW1187FB35FF4";
pub const ARTIST_NAME: &str = "Elena";

// ============================================================================
// Activity log
// ============================================================================

/// User playing every song in the session fixture
pub const USER_ID: &str = "15";

pub const SESSION_ID: &str = "818";

/// Number of `NextSong` events in the session fixture
pub const PLAYBACKS_IN_SESSION: usize = 3;

/// Timestamp (ms) of the playback that matches the fixture song
pub const MATCHING_PLAY_TS: i64 = 1542837407796;
