use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use station_stats::config::{parse_delimiter, DEFAULT_BUFFER_SIZE, DEFAULT_CHUNKS_PER_WORKER};
use station_stats::{run, write_summary, DispatchStrategy, PipelineConfig, ReadStrategy};

#[derive(Debug, Parser)]
#[command(version, about = "Per-station min/mean/max over a delimited measurements file")]
struct Args {
    /// Input file with one `<station><delimiter><value>` record per line
    path: PathBuf,

    /// Single character between station and value
    #[arg(short, long, default_value = ",", value_parser = delimiter)]
    delimiter: u8,

    /// Number of concurrent workers [default: available cores]
    #[arg(short, long)]
    workers: Option<usize>,

    /// Bytes read per system call by each worker
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    #[arg(long, value_enum, default_value_t = ReadStrategy::Positioned)]
    read: ReadStrategy,

    #[arg(long, value_enum, default_value_t = DispatchStrategy::FireAll)]
    dispatch: DispatchStrategy,

    /// Ranges per worker when dispatching through the pool
    #[arg(long, default_value_t = DEFAULT_CHUNKS_PER_WORKER)]
    chunks_per_worker: usize,

    /// Leave out the first line of the input
    #[arg(long)]
    skip_header: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn config(&self) -> PipelineConfig {
        let defaults = PipelineConfig::default();
        PipelineConfig {
            delimiter: self.delimiter,
            workers: self.workers.unwrap_or(defaults.workers),
            buffer_size: self.buffer_size,
            read_strategy: self.read,
            dispatch: self.dispatch,
            chunks_per_worker: self.chunks_per_worker,
            skip_header: self.skip_header,
        }
    }
}

fn delimiter(text: &str) -> Result<u8, String> {
    parse_delimiter(text).map_err(|err| err.to_string())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .with_thread_ids(verbose >= 3)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    debug!(?args, "parsed arguments");

    let timer = Instant::now();
    let config = args.config();
    let measurements = run(&args.path, &config)
        .with_context(|| format!("failed to summarize {}", args.path.display()))?;

    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    write_summary(&mut lock, &measurements)?;
    lock.flush()?;

    info!(elapsed = ?timer.elapsed(), stations = measurements.len(), "done");
    Ok(())
}
