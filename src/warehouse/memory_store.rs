//! In-memory warehouse.
//!
//! Keeps rows in vectors with the same conflict policy as the SQLite store.
//! Used for dry runs, where nothing should be written to disk.

use super::models::*;
use super::trait_def::{BatchScope, Sink, SongLookup};
use anyhow::Result;
use std::cell::RefCell;

#[derive(Default)]
pub struct InMemoryWarehouse {
    songs: RefCell<Vec<Song>>,
    artists: RefCell<Vec<Artist>>,
    users: RefCell<Vec<UserRow>>,
    time_rows: RefCell<Vec<TimeRow>>,
    songplays: RefCell<Vec<SongplayFact>>,
}

impl InMemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn songs(&self) -> Vec<Song> {
        self.songs.borrow().clone()
    }

    pub fn artists(&self) -> Vec<Artist> {
        self.artists.borrow().clone()
    }

    pub fn users(&self) -> Vec<UserRow> {
        self.users.borrow().clone()
    }

    pub fn time_rows(&self) -> Vec<TimeRow> {
        self.time_rows.borrow().clone()
    }

    pub fn songplays(&self) -> Vec<SongplayFact> {
        self.songplays.borrow().clone()
    }
}

struct Snapshot {
    songs: usize,
    artists: usize,
    users: Vec<UserRow>,
    time_rows: usize,
    songplays: usize,
}

impl InMemoryWarehouse {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            songs: self.songs.borrow().len(),
            artists: self.artists.borrow().len(),
            users: self.users(),
            time_rows: self.time_rows.borrow().len(),
            songplays: self.songplays.borrow().len(),
        }
    }

    // Rows are only ever appended, except user levels which are updated in place.
    fn restore(&self, snapshot: Snapshot) {
        self.songs.borrow_mut().truncate(snapshot.songs);
        self.artists.borrow_mut().truncate(snapshot.artists);
        *self.users.borrow_mut() = snapshot.users;
        self.time_rows.borrow_mut().truncate(snapshot.time_rows);
        self.songplays.borrow_mut().truncate(snapshot.songplays);
    }
}

impl BatchScope for InMemoryWarehouse {
    fn with_batch<T, E, F>(&self, load: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<anyhow::Error>,
    {
        let snapshot = self.snapshot();
        let loaded = load();
        if loaded.is_err() {
            self.restore(snapshot);
        }
        loaded
    }
}

impl SongLookup for InMemoryWarehouse {
    fn find_song(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<SongMatch>> {
        let artists = self.artists.borrow();
        let mut matches = self.songs.borrow().iter().filter_map(|song| {
            let artist = artists.iter().find(|a| a.artist_id == song.artist_id)?;
            let is_match = song.title.as_deref() == Some(title)
                && artist.name.as_deref() == Some(artist_name)
                && song.duration == Some(duration);
            is_match.then(|| SongMatch {
                song_id: song.song_id.clone(),
                artist_id: song.artist_id.clone(),
            })
        })
        .take(2)
        .collect::<Vec<_>>();

        if matches.len() == 1 {
            Ok(matches.pop())
        } else {
            Ok(None)
        }
    }
}

impl Sink for InMemoryWarehouse {
    fn insert_song(&self, song: &Song) -> Result<()> {
        let mut songs = self.songs.borrow_mut();
        if !songs.iter().any(|s| s.song_id == song.song_id) {
            songs.push(song.clone());
        }
        Ok(())
    }

    fn insert_artist(&self, artist: &Artist) -> Result<()> {
        let mut artists = self.artists.borrow_mut();
        if !artists.iter().any(|a| a.artist_id == artist.artist_id) {
            artists.push(artist.clone());
        }
        Ok(())
    }

    fn insert_time(&self, time: &TimeRow) -> Result<()> {
        let mut time_rows = self.time_rows.borrow_mut();
        if !time_rows.iter().any(|t| t.start_time == time.start_time) {
            time_rows.push(time.clone());
        }
        Ok(())
    }

    fn insert_user(&self, user: &UserRow) -> Result<()> {
        let Some(user_id) = user.user_id.as_deref() else {
            anyhow::bail!("Cannot store a user without user_id");
        };
        let mut users = self.users.borrow_mut();
        match users
            .iter_mut()
            .find(|u| u.user_id.as_deref() == Some(user_id))
        {
            Some(existing) => existing.level = user.level.clone(),
            None => users.push(user.clone()),
        }
        Ok(())
    }

    fn insert_songplay(&self, songplay: &SongplayFact) -> Result<()> {
        if songplay.user_id.is_none() {
            anyhow::bail!("Cannot store a songplay without user_id");
        }
        self.songplays.borrow_mut().push(songplay.clone());
        Ok(())
    }
}
