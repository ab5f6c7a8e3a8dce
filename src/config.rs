use std::thread;

use crate::dispatch::DispatchStrategy;
use crate::error::{BrcError, Result};
use crate::reader::ReadStrategy;

pub const DEFAULT_DELIMITER: u8 = b',';
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;
pub const DEFAULT_CHUNKS_PER_WORKER: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub delimiter: u8,
    pub workers: usize,
    pub buffer_size: usize,
    pub read_strategy: ReadStrategy,
    pub dispatch: DispatchStrategy,
    /// Only used by [`DispatchStrategy::Pool`].
    pub chunks_per_worker: usize,
    pub skip_header: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            workers: available_workers(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            read_strategy: ReadStrategy::default(),
            dispatch: DispatchStrategy::default(),
            chunks_per_worker: DEFAULT_CHUNKS_PER_WORKER,
            skip_header: false,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(BrcError::InvalidWorkerCount(self.workers));
        }
        if self.buffer_size == 0 {
            return Err(BrcError::InvalidSize { name: "buffer size", value: self.buffer_size });
        }
        if self.chunks_per_worker == 0 {
            return Err(BrcError::InvalidSize {
                name: "chunks per worker",
                value: self.chunks_per_worker,
            });
        }
        if !is_valid_delimiter(self.delimiter) {
            return Err(BrcError::InvalidDelimiter(self.delimiter as char));
        }
        Ok(())
    }

    /// Number of ranges the input is split into.
    pub fn chunk_count(&self) -> usize {
        self.dispatch.chunk_count(self.workers, self.chunks_per_worker)
    }
}

/// Parses a delimiter given as text, e.g. on the command line.
pub fn parse_delimiter(text: &str) -> Result<u8> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(delimiter), None) if delimiter.is_ascii() && is_valid_delimiter(delimiter as u8) => {
            Ok(delimiter as u8)
        }
        (Some(delimiter), _) => Err(BrcError::InvalidDelimiter(delimiter)),
        (None, _) => Err(BrcError::InvalidDelimiter('\0')),
    }
}

// Must not collide with anything that can appear in a number or be trimmed.
fn is_valid_delimiter(delimiter: u8) -> bool {
    delimiter.is_ascii_punctuation() && !matches!(delimiter, b'-' | b'.')
}

fn available_workers() -> usize {
    thread::available_parallelism().map(|cores| cores.get()).unwrap_or(1)
}
