//! Sink and lookup traits.
//!
//! The transformation code never talks to a database directly: it receives a
//! `SongLookup` to resolve played songs and hands produced rows to a `Sink`.

use super::models::{Artist, Song, SongMatch, SongplayFact, TimeRow, UserRow};
use anyhow::Result;

/// Exact-match song resolution against previously loaded songs and artists.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait SongLookup {
    /// Find the song whose title, artist name and duration are all exactly
    /// equal to the given values.
    ///
    /// Returns `Ok(None)` when no song, or more than one song, matches.
    /// An `Err` means the lookup itself failed.
    fn find_song(&self, title: &str, artist_name: &str, duration: f64)
        -> Result<Option<SongMatch>>;
}

/// Persistence of star-schema rows. Each call is independently fallible.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait Sink {
    fn insert_song(&self, song: &Song) -> Result<()>;

    fn insert_artist(&self, artist: &Artist) -> Result<()>;

    fn insert_time(&self, time: &TimeRow) -> Result<()>;

    fn insert_user(&self, user: &UserRow) -> Result<()>;

    fn insert_songplay(&self, songplay: &SongplayFact) -> Result<()>;
}

/// Atomic loading of one file's rows.
pub trait BatchScope {
    /// Run `load` so that either all of its writes are kept or none are.
    ///
    /// Writes are kept only when `load` returns `Ok`.
    fn with_batch<T, E, F>(&self, load: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<anyhow::Error>;
}
