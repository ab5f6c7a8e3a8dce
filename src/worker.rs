use std::any::Any;
use std::fs::File;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::aggregate::{Aggregations, ChunkScanner};
use crate::boundaries::ChunkRange;
use crate::error::{BrcError, Result};
use crate::reader::{Progress, RangeReader};

/// Shared flag telling in-flight workers to stop after their current read.
#[derive(Debug, Default)]
pub struct CancelToken(AtomicBool);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Turns one [`ChunkRange`] of the input into a partial [`Aggregations`].
/// Every call opens its own handle and owns its map until it returns it.
pub struct ChunkWorker<'a> {
    path: &'a Path,
    reader: &'a dyn RangeReader,
    delimiter: u8,
}

impl<'a> ChunkWorker<'a> {
    pub fn new(path: &'a Path, reader: &'a dyn RangeReader, delimiter: u8) -> Self {
        Self { path, reader, delimiter }
    }

    pub fn run(
        &self,
        chunk: usize,
        range: ChunkRange,
        cancel: &CancelToken,
    ) -> Result<Aggregations> {
        if cancel.is_cancelled() {
            return Err(BrcError::Cancelled { chunk });
        }
        debug!(chunk, start = range.start, end = range.end, "worker started");

        let file = File::open(self.path)
            .map_err(|source| BrcError::Worker { chunk, range, source })?;
        let mut scanner = ChunkScanner::new(self.delimiter);

        match self.reader.read_range(&file, range, &mut scanner, cancel) {
            Ok(Progress::Complete) => {
                let measurements = scanner.finish();
                debug!(
                    chunk,
                    bytes = range.len(),
                    stations = measurements.len(),
                    "worker finished"
                );
                Ok(measurements)
            }
            Ok(Progress::Cancelled) => {
                debug!(chunk, "worker cancelled");
                Err(BrcError::Cancelled { chunk })
            }
            Err(source) => Err(BrcError::Worker { chunk, range, source }),
        }
    }

    /// [`ChunkWorker::run`], with panics turned into errors. Any failure
    /// trips `cancel` so sibling workers stop early.
    pub fn run_guarded(
        &self,
        chunk: usize,
        range: ChunkRange,
        cancel: &CancelToken,
    ) -> Result<Aggregations> {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.run(chunk, range, cancel)))
            .unwrap_or_else(|payload| {
                Err(BrcError::WorkerPanicked { chunk, message: panic_message(&*payload) })
            });

        if let Err(err) = &result {
            if !err.is_cancellation() {
                warn!(chunk, error = %err, "worker failed, cancelling remaining chunks");
                cancel.cancel();
            }
        }
        result
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
