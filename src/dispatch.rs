use std::thread;

use clap::ValueEnum;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::debug;

use crate::aggregate::Aggregations;
use crate::boundaries::ChunkRange;
use crate::error::{BrcError, Result};
use crate::worker::{CancelToken, ChunkWorker};

/// How chunk workers are scheduled onto threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DispatchStrategy {
    /// One thread per range, all started at once.
    #[default]
    FireAll,
    /// A fixed pool of `workers` threads draining a queue of smaller ranges.
    Pool,
}

impl DispatchStrategy {
    /// How many ranges the input should be split into for `workers` threads.
    pub fn chunk_count(self, workers: usize, chunks_per_worker: usize) -> usize {
        match self {
            DispatchStrategy::FireAll => workers,
            DispatchStrategy::Pool => workers.saturating_mul(chunks_per_worker),
        }
    }
}

/// Runs `worker` over every range and hands back each partial aggregation
/// exactly once, in no particular order. Fails as a whole as soon as any
/// range fails.
pub fn dispatch(
    worker: &ChunkWorker<'_>,
    ranges: &[ChunkRange],
    strategy: DispatchStrategy,
    workers: usize,
) -> Result<Vec<Aggregations>> {
    if workers == 0 {
        return Err(BrcError::InvalidWorkerCount(workers));
    }
    debug!(?strategy, chunks = ranges.len(), workers, "dispatching chunk workers");

    match strategy {
        DispatchStrategy::FireAll => fire_all(worker, ranges),
        DispatchStrategy::Pool => pool(worker, ranges, workers),
    }
}

fn fire_all(worker: &ChunkWorker<'_>, ranges: &[ChunkRange]) -> Result<Vec<Aggregations>> {
    let cancel = CancelToken::default();
    let (sender, receiver) = crossbeam_channel::unbounded();

    thread::scope(|scope| {
        for (chunk, &range) in ranges.iter().enumerate() {
            let sender = sender.clone();
            let cancel = &cancel;
            scope.spawn(move || {
                // The receiver outlives every worker inside this scope.
                let _ = sender.send(worker.run_guarded(chunk, range, cancel));
            });
        }
        drop(sender);

        collect(receiver.iter(), &cancel)
    })
}

fn pool(
    worker: &ChunkWorker<'_>,
    ranges: &[ChunkRange],
    workers: usize,
) -> Result<Vec<Aggregations>> {
    let cancel = CancelToken::default();
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|index| format!("chunk-worker-{index}"))
        .build()?;

    let results: Vec<Result<Aggregations>> = pool.install(|| {
        ranges
            .par_iter()
            .enumerate()
            .map(|(chunk, &range)| worker.run_guarded(chunk, range, &cancel))
            .collect()
    });

    collect(results, &cancel)
}

/// Gathers every worker result. The first real failure wins over the
/// cancellations it caused.
fn collect<I>(results: I, cancel: &CancelToken) -> Result<Vec<Aggregations>>
where
    I: IntoIterator<Item = Result<Aggregations>>,
{
    let mut parts = Vec::new();
    let mut failure: Option<BrcError> = None;

    for result in results {
        match result {
            Ok(part) => parts.push(part),
            Err(err) => {
                cancel.cancel();
                let replace = match &failure {
                    None => true,
                    Some(current) => current.is_cancellation() && !err.is_cancellation(),
                };
                if replace {
                    failure = Some(err);
                }
            }
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(parts),
    }
}
