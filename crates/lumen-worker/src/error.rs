//! Worker error types.

use std::path::PathBuf;

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Frame source failed: {0}")]
    Source(String),

    #[error("Cannot decode frame {index} ({}): {reason}", .path.display())]
    Decode {
        index: usize,
        path: PathBuf,
        reason: String,
    },

    #[error("Frame sink failed: {0}")]
    Sink(String),

    #[error("Worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Media error: {0}")]
    Media(#[from] lumen_media::MediaError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn source_failed(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    pub fn decode_failed(index: usize, path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Decode {
            index,
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn sink_failed(msg: impl Into<String>) -> Self {
        Self::Sink(msg.into())
    }
}
