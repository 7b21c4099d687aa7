//! Directory ingestion.
//!
//! Song files are ingested before log files, since songplays are resolved
//! against the songs already in the warehouse. Each file is transformed, then
//! loaded inside its own batch; a failing file stops the run and leaves the
//! files before it committed.

use super::batch::{
    load_log_rows, load_song_rows, transform_log_file, transform_song_file, RecordRejection,
};
use super::error::IngestError;
use super::files::discover_files;
use crate::warehouse::{BatchScope, Sink, SongLookup};
use std::fmt;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_EXTENSION: &str = "json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Song,
    Log,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Song => write!(f, "song"),
            FileKind::Log => write!(f, "log"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    /// Extension of input files, without the leading dot.
    pub extension: String,
    /// Keep going when a file has rejected records. When false the run stops
    /// at the first such file, before its rows are loaded.
    pub continue_on_error: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            continue_on_error: true,
        }
    }
}

/// Observer of ingestion progress, e.g. a progress bar.
pub trait IngestProgress {
    fn files_found(&self, _kind: FileKind, _root: &Path, _total: usize) {}

    fn file_processed(&self, _kind: FileKind, _path: &Path, _done: usize, _total: usize) {}
}

pub struct NoProgress;

impl IngestProgress for NoProgress {}

/// Rows handed to the warehouse during a run.
///
/// Dimension rows are counted as emitted; the warehouse may ignore duplicates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub files: usize,
    pub songs: usize,
    pub artists: usize,
    pub time_rows: usize,
    pub users: usize,
    pub songplays: usize,
    pub resolved_songplays: usize,
    pub rejected_records: usize,
}

impl AddAssign for IngestReport {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.songs += other.songs;
        self.artists += other.artists;
        self.time_rows += other.time_rows;
        self.users += other.users;
        self.songplays += other.songplays;
        self.resolved_songplays += other.resolved_songplays;
        self.rejected_records += other.rejected_records;
    }
}

fn list_files(kind: FileKind, root: &Path, extension: &str) -> Result<Vec<PathBuf>, IngestError> {
    let files = discover_files(root, extension).map_err(|source| IngestError::Discovery {
        path: root.to_path_buf(),
        source,
    })?;
    info!("{} {} files found in {}", files.len(), kind, root.display());
    Ok(files)
}

fn check_rejections(
    path: &Path,
    rejections: &[RecordRejection],
    options: &IngestOptions,
) -> Result<(), IngestError> {
    for rejection in rejections {
        warn!("Rejected {} of {}", rejection, path.display());
    }
    match rejections.first() {
        Some(first) if !options.continue_on_error => Err(IngestError::Rejected {
            path: path.to_path_buf(),
            count: rejections.len(),
            first: first.clone(),
        }),
        _ => Ok(()),
    }
}

fn persist_error(path: &Path) -> impl FnOnce(anyhow::Error) -> IngestError + '_ {
    move |source| IngestError::Persist {
        path: path.to_path_buf(),
        source,
    }
}

/// Load every song file under `root`, one batch per file.
pub fn ingest_song_files<W>(
    warehouse: &W,
    root: &Path,
    options: &IngestOptions,
    progress: &dyn IngestProgress,
) -> Result<IngestReport, IngestError>
where
    W: Sink + BatchScope,
{
    let files = list_files(FileKind::Song, root, &options.extension)?;
    progress.files_found(FileKind::Song, root, files.len());

    let mut report = IngestReport::default();
    for (i, path) in files.iter().enumerate() {
        let rows = transform_song_file(path)?;
        check_rejections(path, &rows.rejections, options)?;
        warehouse
            .with_batch(|| load_song_rows(&rows, warehouse))
            .map_err(persist_error(path))?;

        let loaded = usize::from(rows.dimensions.is_some());
        report += IngestReport {
            files: 1,
            songs: loaded,
            artists: loaded,
            rejected_records: rows.rejections.len(),
            ..Default::default()
        };
        info!("{}/{} files processed.", i + 1, files.len());
        progress.file_processed(FileKind::Song, path, i + 1, files.len());
    }
    Ok(report)
}

/// Load every activity log file under `root`, one batch per file.
pub fn ingest_log_files<W>(
    warehouse: &W,
    root: &Path,
    options: &IngestOptions,
    progress: &dyn IngestProgress,
) -> Result<IngestReport, IngestError>
where
    W: Sink + SongLookup + BatchScope,
{
    let files = list_files(FileKind::Log, root, &options.extension)?;
    progress.files_found(FileKind::Log, root, files.len());

    let mut report = IngestReport::default();
    for (i, path) in files.iter().enumerate() {
        let rows = transform_log_file(path, warehouse)?;
        check_rejections(path, &rows.rejections, options)?;
        warehouse
            .with_batch(|| load_log_rows(&rows, warehouse))
            .map_err(persist_error(path))?;

        report += IngestReport {
            files: 1,
            time_rows: rows.time_rows.len(),
            users: rows.users.len(),
            songplays: rows.songplays.len(),
            resolved_songplays: rows.resolved_songplays(),
            rejected_records: rows.rejections.len(),
            ..Default::default()
        };
        info!("{}/{} files processed.", i + 1, files.len());
        progress.file_processed(FileKind::Log, path, i + 1, files.len());
    }
    Ok(report)
}

/// Ingest the song directory, then the log directory.
pub fn ingest_all<W>(
    warehouse: &W,
    song_root: &Path,
    log_root: &Path,
    options: &IngestOptions,
    progress: &dyn IngestProgress,
) -> Result<IngestReport, IngestError>
where
    W: Sink + SongLookup + BatchScope,
{
    let mut report = ingest_song_files(warehouse, song_root, options, progress)?;
    report += ingest_log_files(warehouse, log_root, options, progress)?;
    Ok(report)
}
