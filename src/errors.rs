use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all operations in the `decomment` crate.
///
/// Per-file failures are reported as `FileAccess` so the batch pipeline can
/// record them and move on; everything else aborts the operation that raised it.
#[derive(Error, Debug)]
pub enum Error {
    /// The directory handed to the collector is missing or not a directory.
    #[error("Invalid root directory: {}", path.display())]
    InvalidRoot { path: PathBuf },

    /// Reading or writing a single source file failed.
    #[error("Cannot access {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        source: std::io::Error,
    },

    /// `start` was called on a pipeline that is still running a batch.
    #[error("A batch is already running")]
    AlreadyRunning,

    /// The batch worker thread panicked before handing back its result.
    #[error("Batch worker panicked")]
    WorkerPanicked,

    /// An error related to file system I/O outside of per-file processing.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An error that occurred while parsing a YAML configuration file.
    #[error("Config parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A general configuration-related error.
    #[error("Config error: {0}")]
    Config(String),

    /// An error related to CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An error related to JSON serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An error from the `walkdir` crate.
    #[error("Walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

/// A convenient type alias for `Result<T, decomment::errors::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wraps an I/O error that happened while handling `path`.
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FileAccess {
            path: path.into(),
            source,
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Config(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Config(s.to_string())
    }
}
