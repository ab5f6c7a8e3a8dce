use std::fs::File;
use std::io::{self, BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom};

use clap::ValueEnum;
use memmap2::MmapOptions;

use crate::aggregate::ChunkScanner;
use crate::boundaries::ChunkRange;
use crate::worker::CancelToken;

/// How a worker pulls the bytes of its range off disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReadStrategy {
    /// Seek once, then fill one reusable buffer with bounded reads.
    #[default]
    Positioned,
    /// Stream through a `BufReader` limited to the range.
    Buffered,
    /// Memory-map the range and scan it in place, one buffer-sized slice at
    /// a time.
    Mapped,
}

impl ReadStrategy {
    pub fn reader(self, buffer_size: usize) -> Box<dyn RangeReader> {
        match self {
            ReadStrategy::Positioned => Box::new(PositionedReader { buffer_size }),
            ReadStrategy::Buffered => Box::new(BufferedReader { buffer_size }),
            ReadStrategy::Mapped => Box::new(MappedReader { buffer_size }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Complete,
    Cancelled,
}

pub trait RangeReader: Send + Sync {
    /// Feeds every byte of `range` to `scanner`, in order. Stops early with
    /// [`Progress::Cancelled`] once `cancel` is tripped.
    fn read_range(
        &self,
        file: &File,
        range: ChunkRange,
        scanner: &mut ChunkScanner,
        cancel: &CancelToken,
    ) -> io::Result<Progress>;
}

pub struct PositionedReader {
    buffer_size: usize,
}

impl RangeReader for PositionedReader {
    fn read_range(
        &self,
        file: &File,
        range: ChunkRange,
        scanner: &mut ChunkScanner,
        cancel: &CancelToken,
    ) -> io::Result<Progress> {
        let mut handle = file;
        handle.seek(SeekFrom::Start(range.start))?;

        let capacity = (self.buffer_size as u64).min(range.len()) as usize;
        let mut buffer = vec![0u8; capacity];
        let mut remaining = range.len();

        while remaining > 0 {
            if cancel.is_cancelled() {
                return Ok(Progress::Cancelled);
            }
            let wanted = (buffer.len() as u64).min(remaining) as usize;
            let read_size = match handle.read(&mut buffer[..wanted]) {
                Ok(0) => return Err(truncated(range, remaining)),
                Ok(read_size) => read_size,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            scanner.feed(&buffer[..read_size]);
            remaining -= read_size as u64;
        }
        Ok(Progress::Complete)
    }
}

pub struct BufferedReader {
    buffer_size: usize,
}

impl RangeReader for BufferedReader {
    fn read_range(
        &self,
        file: &File,
        range: ChunkRange,
        scanner: &mut ChunkScanner,
        cancel: &CancelToken,
    ) -> io::Result<Progress> {
        let mut handle = file;
        handle.seek(SeekFrom::Start(range.start))?;

        let mut reader = BufReader::with_capacity(self.buffer_size, handle.take(range.len()));
        let mut remaining = range.len();

        while remaining > 0 {
            if cancel.is_cancelled() {
                return Ok(Progress::Cancelled);
            }
            let buffer = reader.fill_buf()?;
            if buffer.is_empty() {
                return Err(truncated(range, remaining));
            }
            let read_size = buffer.len();
            scanner.feed(buffer);
            reader.consume(read_size);
            remaining -= read_size as u64;
        }
        Ok(Progress::Complete)
    }
}

pub struct MappedReader {
    buffer_size: usize,
}

impl RangeReader for MappedReader {
    fn read_range(
        &self,
        file: &File,
        range: ChunkRange,
        scanner: &mut ChunkScanner,
        cancel: &CancelToken,
    ) -> io::Result<Progress> {
        if cancel.is_cancelled() {
            return Ok(Progress::Cancelled);
        }
        if range.is_empty() {
            return Ok(Progress::Complete);
        }

        // SAFETY: the input is opened read-only and must not be modified
        // while the run is in progress.
        let mmap = unsafe {
            MmapOptions::new()
                .offset(range.start)
                .len(range.len() as usize)
                .map(file)?
        };
        Ok(feed_buffers(mmap.chunks(self.buffer_size), scanner, cancel))
    }
}

/// Feeds `buffers` one at a time, checking `cancel` before each.
fn feed_buffers<'a, I>(buffers: I, scanner: &mut ChunkScanner, cancel: &CancelToken) -> Progress
where
    I: IntoIterator<Item = &'a [u8]>,
{
    for buffer in buffers {
        if cancel.is_cancelled() {
            return Progress::Cancelled;
        }
        scanner.feed(buffer);
    }
    Progress::Complete
}

fn truncated(range: ChunkRange, remaining: u64) -> io::Error {
    io::Error::new(
        ErrorKind::UnexpectedEof,
        format!("input ended {remaining} bytes before the end of {range}"),
    )
}
