//! Per-station min/mean/max over a large `<station><delimiter><value>` file.
//!
//! The input is split into line-aligned byte ranges, each range is scanned
//! on its own thread into a private map, and the partial maps are merged and
//! rendered as `{station=min/mean/max, ...}`. Values are kept in tenths as
//! integers, so the result does not depend on how the file was split.

pub mod aggregate;
pub mod boundaries;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod measurement;
pub mod parse;
pub mod pipeline;
pub mod reader;
pub mod worker;

pub use aggregate::{merge, Aggregations, ChunkScanner};
pub use boundaries::{resolve, resolve_from, ChunkRange};
pub use config::PipelineConfig;
pub use dispatch::DispatchStrategy;
pub use error::{BrcError, Result};
pub use format::{format_summary, write_summary, Summary};
pub use measurement::StationStats;
pub use parse::{parse_scaled, tokenize_line};
pub use pipeline::{run, summarize};
pub use reader::ReadStrategy;
