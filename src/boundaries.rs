use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use bstr::ByteSlice;
use tracing::{debug, trace};

use crate::error::{BrcError, Result};

const NEWLINE: u8 = 10;
const LOOKAHEAD_WINDOW: usize = 64;

/// A line-aligned byte range `[start, end)` of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkRange {
    pub start: u64,
    pub end: u64,
}

impl ChunkRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl Display for ChunkRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "bytes {}..{}", self.start, self.end)
    }
}

/// Splits `[0, file_size)` into at most `workers` ranges that each end right
/// after a newline (or at `file_size`).
pub fn resolve<R: Read + Seek>(
    source: &mut R,
    file_size: u64,
    workers: usize,
) -> Result<Vec<ChunkRange>> {
    resolve_from(source, 0, file_size, workers)
}

/// Same as [`resolve`], restricted to `[start, end)`. `start` must already sit
/// at a line start.
pub fn resolve_from<R: Read + Seek>(
    source: &mut R,
    start: u64,
    end: u64,
    workers: usize,
) -> Result<Vec<ChunkRange>> {
    if workers == 0 {
        return Err(BrcError::InvalidWorkerCount(workers));
    }
    if start >= end {
        return Ok(Vec::new());
    }

    let ideal_size = (end - start).div_ceil(workers as u64);
    // Never more ranges than bytes, however many workers were asked for.
    let capacity = (end - start).min(workers as u64) as usize;
    let mut ranges: Vec<ChunkRange> = Vec::with_capacity(capacity);
    let mut previous_end = start;

    for i in 0..workers {
        let tentative = previous_end + ideal_size;
        if i == workers - 1 || tentative >= end {
            ranges.push(ChunkRange::new(previous_end, end));
            break;
        }

        let boundary = next_line_start(source, tentative, end)?;
        ranges.push(ChunkRange::new(previous_end, boundary));
        if boundary == end {
            break;
        }
        previous_end = boundary;
    }

    debug!(chunks = ranges.len(), ideal_size, "resolved chunk boundaries");
    Ok(ranges)
}

/// Resolves ranges for a whole file, optionally leaving out its first line.
pub fn resolve_file(
    file: &mut File,
    workers: usize,
    skip_header: bool,
) -> Result<Vec<ChunkRange>> {
    let file_size = file
        .metadata()
        .map_err(|source| BrcError::Boundary { offset: 0, source })?
        .len();

    let start = match skip_header && file_size > 0 {
        true => next_line_start(file, 0, file_size)?,
        false => 0,
    };
    resolve_from(file, start, file_size, workers)
}

/// Offset just past the first newline at or after `offset`, or `end` if the
/// rest of the range has none.
fn next_line_start<R: Read + Seek>(source: &mut R, offset: u64, end: u64) -> Result<u64> {
    let mut window = [0u8; LOOKAHEAD_WINDOW];
    let mut position = offset;

    source
        .seek(SeekFrom::Start(position))
        .map_err(|source| BrcError::Boundary { offset: position, source })?;

    while position < end {
        let wanted = LOOKAHEAD_WINDOW.min((end - position) as usize);
        let read_size = source
            .read(&mut window[..wanted])
            .map_err(|source| BrcError::Boundary { offset: position, source })?;
        if read_size == 0 {
            break;
        }

        if let Some(newline) = window[..read_size].find_byte(NEWLINE) {
            trace!(offset, boundary = position + newline as u64 + 1, "found line boundary");
            return Ok(position + newline as u64 + 1);
        }
        position += read_size as u64;
    }
    Ok(end)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn lines(count: usize) -> Vec<u8> {
        (0..count)
            .map(|i| format!("station{},{}.{}\n", i % 7, i % 40, i % 10))
            .collect::<String>()
            .into_bytes()
    }

    fn assert_partition(data: &[u8], ranges: &[ChunkRange]) {
        let mut expected_start = 0;
        for range in ranges {
            assert_eq!(range.start, expected_start);
            assert!(range.start < range.end, "empty range {range}");
            if range.end != data.len() as u64 {
                assert_eq!(data[range.end as usize - 1], NEWLINE);
            }
            expected_start = range.end;
        }
        assert_eq!(expected_start, data.len() as u64);

        let joined: Vec<u8> = ranges
            .iter()
            .flat_map(|range| data[(range.start as usize)..(range.end as usize)].iter().copied())
            .collect();
        assert_eq!(joined, data);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let data = lines(3);
        let result = resolve(&mut Cursor::new(&data), data.len() as u64, 0);
        assert!(matches!(result, Err(BrcError::InvalidWorkerCount(0))));
    }

    #[test]
    fn empty_input_has_no_ranges() {
        let ranges = resolve(&mut Cursor::new(Vec::<u8>::new()), 0, 4).unwrap();
        assert!(ranges.is_empty());
    }

    #[test]
    fn single_worker_takes_everything() {
        let data = lines(10);
        let ranges = resolve(&mut Cursor::new(&data), data.len() as u64, 1).unwrap();
        assert_eq!(ranges, vec![ChunkRange::new(0, data.len() as u64)]);
    }

    #[test]
    fn ranges_partition_input_on_line_boundaries() {
        let data = lines(500);
        for workers in [1, 2, 3, 7, 16, 64] {
            let ranges = resolve(&mut Cursor::new(&data), data.len() as u64, workers).unwrap();
            assert!(ranges.len() <= workers);
            assert_partition(&data, &ranges);
        }
    }

    #[test]
    fn more_workers_than_lines() {
        let data = lines(3);
        let ranges = resolve(&mut Cursor::new(&data), data.len() as u64, 100).unwrap();
        assert!(ranges.len() <= 3);
        assert_partition(&data, &ranges);
    }

    #[test]
    fn huge_worker_count_is_not_preallocated() {
        let data = b"a,1.0\nb,2.0\n".to_vec();
        let ranges = resolve(&mut Cursor::new(&data), data.len() as u64, usize::MAX).unwrap();
        assert_eq!(ranges, vec![ChunkRange::new(0, 6), ChunkRange::new(6, 12)]);
        assert_partition(&data, &ranges);
    }

    #[test]
    fn missing_trailing_newline_keeps_last_line() {
        let mut data = lines(20);
        data.extend_from_slice(b"last,1.0");
        let ranges = resolve(&mut Cursor::new(&data), data.len() as u64, 4).unwrap();
        assert_partition(&data, &ranges);
        assert_eq!(ranges.last().unwrap().end, data.len() as u64);
    }

    #[test]
    fn long_lines_need_several_lookahead_windows() {
        let key = "k".repeat(LOOKAHEAD_WINDOW * 3);
        let data: Vec<u8> = (0..6).flat_map(|i| format!("{key},{i}.0\n").into_bytes()).collect();
        let ranges = resolve(&mut Cursor::new(&data), data.len() as u64, 4).unwrap();
        assert_partition(&data, &ranges);
    }

    #[test]
    fn no_newline_at_all_yields_one_range() {
        let data = b"one very long line without any terminator at all,1.0".to_vec();
        let ranges = resolve(&mut Cursor::new(&data), data.len() as u64, 8).unwrap();
        assert_eq!(ranges, vec![ChunkRange::new(0, data.len() as u64)]);
    }

    #[test]
    fn resolve_from_skips_leading_bytes() {
        let mut data = b"station,measurement\n".to_vec();
        let header = data.len() as u64;
        data.extend(lines(50));
        let ranges = resolve_from(&mut Cursor::new(&data), header, data.len() as u64, 5).unwrap();
        assert_eq!(ranges.first().unwrap().start, header);

        let shifted: Vec<ChunkRange> = ranges
            .iter()
            .map(|range| ChunkRange::new(range.start - header, range.end - header))
            .collect();
        assert_partition(&data[(header as usize)..], &shifted);
    }
}
