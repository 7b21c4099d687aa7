//! Record -> star-schema row transformations.
//!
//! Song-metadata records yield one song row and one artist row each. Activity
//! records are filtered down to completed playbacks, which then feed the time
//! dimension, the user dimension and the songplay facts.

mod events;
mod fields;
mod song;
mod songplays;
mod time;
mod users;

pub use events::{filter_next_song, ActivityEvent, PageAction, PlayEvent, NEXT_SONG};
pub use fields::ExtractError;
pub use song::extract_song_dimensions;
pub use songplays::{resolve_songplay, resolve_songplays, LookupFailure};
pub use time::{build_time_rows, ceil_to_second};
pub use users::build_user_rows;
