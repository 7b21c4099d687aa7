//! Song and artist dimension rows from song-metadata records.

use super::fields::{optional_f64, optional_i64, optional_string, required_string, ExtractError};
use crate::records::Record;
use crate::warehouse::{Artist, Song};

/// Build the song row and the artist row carried by one song-metadata record.
///
/// Values are taken as they are: no trimming, no range checks, `year == 0`
/// stays 0.
pub fn extract_song_dimensions(record: &Record) -> Result<(Song, Artist), ExtractError> {
    let artist_id = required_string(record, "artist_id")?;

    let song = Song {
        song_id: required_string(record, "song_id")?,
        title: optional_string(record, "title")?,
        artist_id: artist_id.clone(),
        year: optional_i64(record, "year")?,
        duration: optional_f64(record, "duration")?,
    };

    let artist = Artist {
        artist_id,
        name: optional_string(record, "artist_name")?,
        location: optional_string(record, "artist_location")?,
        latitude: optional_f64(record, "artist_latitude")?,
        longitude: optional_f64(record, "artist_longitude")?,
    };

    Ok((song, artist))
}
