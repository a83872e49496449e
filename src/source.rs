//! Byte sources an [`Archive`](crate::Archive) can decode from.
//!
//! Two capabilities are supported:
//!
//! - [`Sequential`]: a forward-only sequence of byte chunks of any size, such
//!   as a network body or a pipe. Skipping means pulling and dropping chunks.
//! - [`Seekable`]: anything implementing [`Read`] and [`Seek`]. Skipping is a
//!   seek, so skipped bodies never pass through memory.
//!
//! [`ReadChunks`] turns a plain [`Read`] into a chunk sequence.

use std::{
    io::{self, Read, Seek, SeekFrom},
    iter::Fuse,
};

use bytes::{Bytes, BytesMut};

use crate::{header::BLOCK_SIZE, util::read_exactish};

mod sealed {
    pub trait Sealed {}
}

/// The two primitives the archive reader needs from a byte source.
///
/// This trait is sealed; use [`Sequential`] or [`Seekable`].
pub trait Source: sealed::Sealed {
    /// Fill `block` from the source.
    ///
    /// Returns the number of bytes read, which is less than [`BLOCK_SIZE`]
    /// only if the source ended.
    fn fill_block(&mut self, block: &mut [u8; BLOCK_SIZE]) -> io::Result<usize>;

    /// Advance past `len` bytes without surfacing them.
    ///
    /// Returns how many bytes were skipped, which is less than `len` only if
    /// the source ended.
    fn skip(&mut self, len: u64) -> io::Result<u64>;
}

/// A forward-only source over a sequence of byte chunks.
///
/// Chunks may be any size and need not line up with block boundaries. At most
/// one partly used chunk is held between calls.
#[derive(Debug)]
pub struct Sequential<I> {
    chunks: Fuse<I>,
    pending: Bytes,
}

impl<I> Sequential<I>
where
    I: Iterator<Item = io::Result<Bytes>>,
{
    /// Wrap a chunk iterator.
    pub fn new(chunks: I) -> Self {
        Self {
            chunks: chunks.fuse(),
            pending: Bytes::new(),
        }
    }

    /// Return the next piece of at most `max` bytes, or `None` once the
    /// chunk sequence is exhausted.
    pub(crate) fn pull(&mut self, max: u64) -> io::Result<Option<Bytes>> {
        debug_assert!(max > 0);
        while self.pending.is_empty() {
            match self.chunks.next() {
                Some(chunk) => self.pending = chunk?,
                None => return Ok(None),
            }
        }
        let len = usize::try_from(max)
            .map_or(self.pending.len(), |max| max.min(self.pending.len()));
        Ok(Some(self.pending.split_to(len)))
    }

    /// Unwrap the chunk iterator. Any partly used chunk is dropped.
    pub fn into_inner(self) -> Fuse<I> {
        self.chunks
    }
}

impl<I> sealed::Sealed for Sequential<I> {}

impl<I> Source for Sequential<I>
where
    I: Iterator<Item = io::Result<Bytes>>,
{
    fn fill_block(&mut self, block: &mut [u8; BLOCK_SIZE]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < BLOCK_SIZE {
            let Some(piece) = self.pull((BLOCK_SIZE - filled) as u64)? else {
                break;
            };
            block[filled..filled + piece.len()].copy_from_slice(&piece);
            filled += piece.len();
        }
        Ok(filled)
    }

    fn skip(&mut self, len: u64) -> io::Result<u64> {
        let mut remaining = len;
        while remaining > 0 {
            let Some(piece) = self.pull(remaining)? else {
                break;
            };
            remaining -= piece.len() as u64;
        }
        Ok(len - remaining)
    }
}

/// Adapts a [`Read`] into a sequence of chunks of a fixed size.
///
/// Every chunk except the last is exactly `chunk_size` bytes. After an error
/// or the end of input the iterator is finished.
#[derive(Debug)]
pub struct ReadChunks<R> {
    reader: R,
    chunk_size: usize,
    done: bool,
}

impl<R: Read> ReadChunks<R> {
    /// Read `reader` in chunks of `chunk_size` bytes (at least one).
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
            done: false,
        }
    }

    /// Unwrap the reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Iterator for ReadChunks<R> {
    type Item = io::Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut buf = BytesMut::zeroed(self.chunk_size);
        match read_exactish(&mut self.reader, &mut buf) {
            Ok(n) => {
                if n < self.chunk_size {
                    self.done = true;
                }
                if n == 0 {
                    return None;
                }
                buf.truncate(n);
                Some(Ok(buf.freeze()))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// A random-access source: reads go straight to the reader and skips are
/// seeks, bounded by the end of the stream.
#[derive(Debug)]
pub struct Seekable<R> {
    reader: R,
}

impl<R: Read + Seek> Seekable<R> {
    /// Wrap a seekable reader. Decoding starts at its current position.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub(crate) fn reader_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Unwrap the reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R> sealed::Sealed for Seekable<R> {}

impl<R: Read + Seek> Source for Seekable<R> {
    fn fill_block(&mut self, block: &mut [u8; BLOCK_SIZE]) -> io::Result<usize> {
        read_exactish(&mut self.reader, block)
    }

    /// Seeking past the end is not an error for most readers, so the target
    /// is clamped to the stream length and only the bytes that exist are
    /// reported as skipped.
    fn skip(&mut self, len: u64) -> io::Result<u64> {
        let start = self.reader.stream_position()?;
        let end = self.reader.seek(SeekFrom::End(0))?;
        let target = start.saturating_add(len).min(end.max(start));
        self.reader.seek(SeekFrom::Start(target))?;
        Ok(target - start)
    }
}
