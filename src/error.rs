use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::boundaries::ChunkRange;

pub type Result<T> = std::result::Result<T, BrcError>;

/// Every fatal outcome of a run. Malformed lines never show up here, they
/// are skipped where they are tokenized.
#[derive(Error, Debug)]
pub enum BrcError {
    #[error("worker count must be positive, got {0}")]
    InvalidWorkerCount(usize),

    #[error("invalid delimiter {0:?}: expected a single ASCII punctuation character")]
    InvalidDelimiter(char),

    #[error("{name} must be positive, got {value}")]
    InvalidSize { name: &'static str, value: usize },

    #[error("failed to open {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to search for a line boundary at byte {offset}")]
    Boundary {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("worker for chunk {chunk} ({range}) failed")]
    Worker {
        chunk: usize,
        range: ChunkRange,
        #[source]
        source: io::Error,
    },

    #[error("worker for chunk {chunk} panicked: {message}")]
    WorkerPanicked { chunk: usize, message: String },

    #[error("worker for chunk {chunk} was cancelled")]
    Cancelled { chunk: usize },

    #[error("failed to build worker pool")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl BrcError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, BrcError::Cancelled { .. })
    }
}
