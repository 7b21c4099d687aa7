//! Songplay facts.

use super::events::PlayEvent;
use crate::warehouse::{SongLookup, SongMatch, SongplayFact};
use thiserror::Error;
use tracing::debug;

/// The lookup itself failed, as opposed to finding no song.
#[derive(Debug, Error)]
#[error("Song lookup failed for '{title}' by '{artist_name}' ({duration}s): {source}")]
pub struct LookupFailure {
    pub title: String,
    pub artist_name: String,
    pub duration: f64,
    #[source]
    pub source: anyhow::Error,
}

/// Resolve the song played by `play` and build its fact row.
///
/// The lookup is an exact match on (title, artist name, duration). An event
/// missing any of the three can never match, so it is not looked up and the
/// fact carries no song or artist id.
pub fn resolve_songplay(
    play: &PlayEvent,
    lookup: &dyn SongLookup,
) -> Result<SongplayFact, LookupFailure> {
    let event = &play.event;
    let found = match (&event.song_title, &event.artist_name, event.duration) {
        (Some(title), Some(artist_name), Some(duration)) => lookup
            .find_song(title, artist_name, duration)
            .map_err(|source| LookupFailure {
                title: title.clone(),
                artist_name: artist_name.clone(),
                duration,
                source,
            })?,
        _ => None,
    };

    if found.is_none() {
        debug!(
            "No song found for {:?} by {:?} ({:?}s)",
            event.song_title, event.artist_name, event.duration
        );
    }
    let (song_id, artist_id) = match found {
        Some(SongMatch { song_id, artist_id }) => (Some(song_id), Some(artist_id)),
        None => (None, None),
    };

    Ok(SongplayFact {
        start_time: play.start_time,
        user_id: event.user_id.clone(),
        level: event.level.clone(),
        song_id,
        artist_id,
        session_id: event.session_id.clone(),
        location: event.location.clone(),
        user_agent: event.user_agent.clone(),
    })
}

/// One fact per playback event, resolved in event order. Stops at the first
/// failed lookup.
pub fn resolve_songplays(
    events: &[PlayEvent],
    lookup: &dyn SongLookup,
) -> Result<Vec<SongplayFact>, LookupFailure> {
    events
        .iter()
        .map(|play| resolve_songplay(play, lookup))
        .collect()
}
