use std::fs::File;
use std::path::Path;

use tracing::{debug, info};

use crate::aggregate::{merge, Aggregations};
use crate::boundaries::resolve_file;
use crate::config::PipelineConfig;
use crate::dispatch::dispatch;
use crate::error::{BrcError, Result};
use crate::format::format_summary;
use crate::worker::ChunkWorker;

/// Resolves chunk boundaries, runs every chunk and merges the partial
/// aggregations. Either every chunk succeeds or the whole run fails.
pub fn run(path: &Path, config: &PipelineConfig) -> Result<Aggregations> {
    config.validate()?;

    let mut file = File::open(path)
        .map_err(|source| BrcError::Io { path: path.to_path_buf(), source })?;
    let ranges = resolve_file(&mut file, config.chunk_count(), config.skip_header)?;
    drop(file);
    info!(path = %path.display(), chunks = ranges.len(), "processing input");

    let reader = config.read_strategy.reader(config.buffer_size);
    let worker = ChunkWorker::new(path, reader.as_ref(), config.delimiter);
    let parts = dispatch(&worker, &ranges, config.dispatch, config.workers)?;

    let measurements = merge(parts);
    debug!(stations = measurements.len(), "merged partial aggregations");
    Ok(measurements)
}

/// [`run`] followed by formatting.
pub fn summarize(path: &Path, config: &PipelineConfig) -> Result<String> {
    Ok(format_summary(&run(path, config)?))
}
