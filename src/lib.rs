//! Sparkify ETL Library
//!
//! Loads song metadata and user activity logs (JSON-lines files) into a SQLite
//! star schema: `songs`, `artists`, `users` and `time` dimensions plus the
//! `songplays` fact table.

pub mod config;
pub mod pipeline;
pub mod records;
pub mod sqlite_persistence;
pub mod transform;
pub mod warehouse;

// Re-export commonly used types for convenience
pub use pipeline::{ingest_all, IngestError, IngestOptions, IngestReport};
pub use warehouse::{InMemoryWarehouse, Sink, SongLookup, SqliteWarehouse};
