use super::batch::RecordRejection;
use crate::records::RecordError;
use crate::transform::LookupFailure;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to list input files under {path:?}: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error(transparent)]
    Records(#[from] RecordError),

    #[error("Song file {0:?} contains no records")]
    EmptySongFile(PathBuf),

    #[error("Song lookup failed while processing {path:?}: {source}")]
    Lookup {
        path: PathBuf,
        #[source]
        source: LookupFailure,
    },

    #[error("Failed to persist rows of {path:?}: {source:#}")]
    Persist {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("{count} record(s) rejected in {path:?}, first {first}")]
    Rejected {
        path: PathBuf,
        count: usize,
        first: RecordRejection,
    },
}
