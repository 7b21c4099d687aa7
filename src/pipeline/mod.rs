//! File-level ETL: discover input files, turn each one into rows, and load
//! those rows into a warehouse one file at a time.

mod batch;
mod error;
mod files;
mod ingest;

pub use batch::{
    load_log_rows, load_song_rows, transform_log_file, transform_song_file, LogFileRows,
    RecordRejection, SongFileRows,
};
pub use error::IngestError;
pub use files::discover_files;
pub use ingest::{
    ingest_all, ingest_log_files, ingest_song_files, FileKind, IngestOptions, IngestProgress,
    IngestReport, NoProgress, DEFAULT_EXTENSION,
};
