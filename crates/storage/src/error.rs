use std::path::PathBuf;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    #[snafu(display("failed to create directory {path:?} on `{stage}`: {source}"))]
    CreateDirectory {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to read document {path:?} on `{stage}`: {source}"))]
    ReadDocument {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to encode document on `{stage}`: {source}"))]
    EncodeDocument {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("failed to write staging file {path:?} on `{stage}`: {source}"))]
    WriteStaging {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to move {from:?} over {to:?} on `{stage}`: {source}"))]
    ReplaceDocument {
        stage: &'static str,
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("profile store lock was poisoned on `{stage}`"))]
    LockPoisoned { stage: &'static str },
    /// The backing store refuses access altogether, e.g. profile storage that
    /// is disabled or over quota. Adapters over such backends return this from
    /// every call; callers degrade to in-memory state.
    #[snafu(display("storage is unavailable on `{stage}`: {details}"))]
    Unavailable {
        stage: &'static str,
        details: String,
    },
}

impl StorageError {
    pub fn unavailable(stage: &'static str, details: impl Into<String>) -> Self {
        UnavailableSnafu {
            stage,
            details: details.into(),
        }
        .build()
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
