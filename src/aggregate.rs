use ahash::RandomState;
use bstr::ByteSlice;
use hashbrown::HashMap;

use crate::measurement::StationStats;
use crate::parse::tokenize_line;

pub type Aggregations = HashMap<Box<[u8]>, StationStats, RandomState>;

const NEWLINE: u8 = 10;

/// Folds raw bytes into a private [`Aggregations`], one complete line at a
/// time. Bytes after the last newline of a buffer are carried into the next
/// call to [`ChunkScanner::feed`] and only parsed once completed, or by
/// [`ChunkScanner::finish`].
pub struct ChunkScanner {
    delimiter: u8,
    carry: Vec<u8>,
    measurements: Aggregations,
}

impl ChunkScanner {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter, carry: Vec::new(), measurements: Aggregations::default() }
    }

    pub fn feed(&mut self, buffer: &[u8]) {
        let mut rest = buffer;

        if !self.carry.is_empty() {
            match rest.find_byte(NEWLINE) {
                Some(newline) => {
                    self.carry.extend_from_slice(&rest[..newline]);
                    record(&mut self.measurements, &self.carry, self.delimiter);
                    self.carry.clear();
                    rest = &rest[(newline + 1)..];
                }
                None => {
                    self.carry.extend_from_slice(rest);
                    return;
                }
            }
        }

        let last_line_start = scan_lines(rest, &mut self.measurements, self.delimiter);
        self.carry.extend_from_slice(&rest[last_line_start..]);
    }

    /// Parses whatever is left in the carry as the final, unterminated line.
    pub fn finish(mut self) -> Aggregations {
        if !self.carry.is_empty() {
            record(&mut self.measurements, &self.carry, self.delimiter);
        }
        self.measurements
    }
}

/// Records every newline-terminated line in `buffer` and returns the offset
/// where the trailing partial line begins.
#[inline]
fn scan_lines(buffer: &[u8], measurements: &mut Aggregations, delimiter: u8) -> usize {
    let mut line_start = 0;

    while let Some(newline) = buffer[line_start..].find_byte(NEWLINE) {
        let line_end = line_start + newline;
        record(measurements, &buffer[line_start..line_end], delimiter);
        line_start = line_end + 1;
    }
    line_start
}

#[inline]
fn record(measurements: &mut Aggregations, line: &[u8], delimiter: u8) {
    if let Some((station, value)) = tokenize_line(line, delimiter) {
        measurements
            .entry_ref(station)
            .and_modify(|measurement| measurement.update(value))
            .or_insert_with(|| StationStats::new(value));
    }
}

/// Moves every station of `other` into `target`, combining overlaps.
pub fn merge_into(target: &mut Aggregations, other: Aggregations) {
    for (station, measurement) in other {
        target
            .entry(station)
            .and_modify(|existing| existing.merge(&measurement))
            .or_insert(measurement);
    }
}

/// Reduces partial aggregations into one. Order and grouping of `parts` do
/// not affect the result.
pub fn merge<I>(parts: I) -> Aggregations
where
    I: IntoIterator<Item = Aggregations>,
{
    parts
        .into_iter()
        .fold(Aggregations::default(), |mut merged, part| {
            merge_into(&mut merged, part);
            merged
        })
}
