use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AverageError>;

#[derive(Debug, Error)]
pub enum AverageError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed event log: {0}")]
    Json(#[from] serde_json::Error),
    #[error("event {index} has an unparsable timestamp {timestamp:?}: {source}")]
    Timestamp {
        index: usize,
        timestamp: String,
        source: chrono::ParseError,
    },
    #[error("the event log contains no events")]
    NoEvents,
    #[error("window size must be a non-negative number of minutes, got {0}")]
    NegativeWindow(f64),
    #[error("failed to round timestamp to the minute: {0}")]
    Rounding(#[from] chrono::RoundingError),
}
