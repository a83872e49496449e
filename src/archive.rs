//! The archive reader and its entry handle.

use std::io::{self, Read, Seek};

use bytes::Bytes;
use log::{debug, trace, warn};

use crate::{
    entry::{Body, Metadata},
    error::{ArchiveError, Result},
    header::{decode_block, BLOCK_SIZE},
    options::{Options, Truncation},
    source::{ReadChunks, Seekable, Sequential, Source},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Reading,
    Finished,
    Halted,
}

/// The entry whose body is being consumed.
#[derive(Debug)]
pub(crate) struct Current {
    pub(crate) metadata: Metadata,
    pub(crate) body: Body,
}

/// Turn a freshly read header block into the next entry.
///
/// `len` is how much of `block` the source filled and `pos` is the offset of
/// the block. Returns `None` at the end of the archive.
pub(crate) fn parse_header(
    block: &[u8; BLOCK_SIZE],
    len: usize,
    pos: u64,
) -> Result<Option<Current>> {
    match len {
        0 => {
            debug!("end of input at offset {pos}");
            return Ok(None);
        }
        BLOCK_SIZE => {}
        len => return Err(ArchiveError::TruncatedHeader { pos, len }),
    }

    let Some(metadata) =
        decode_block(block).map_err(|source| ArchiveError::Header { pos, source })?
    else {
        debug!("end-of-archive marker at offset {pos}");
        return Ok(None);
    };

    trace!(
        "header at offset {pos}: {:?} {:?} ({} bytes)",
        metadata.name,
        metadata.kind,
        metadata.size
    );
    Ok(Some(Current {
        body: Body::new(metadata.size),
        metadata,
    }))
}

/// Apply the truncation policy when the source ends `missing` bytes short of
/// the padded body.
pub(crate) fn truncated(
    options: &Options,
    state: &mut State,
    body: &mut Body,
    pos: u64,
    missing: u64,
) -> Result<()> {
    match options.truncation {
        Truncation::Error => {
            *state = State::Halted;
            Err(ArchiveError::TruncatedBody { pos, missing })
        }
        Truncation::EndOfStream => {
            warn!("source ended {missing} bytes short at offset {pos}, ending archive");
            body.finish();
            Ok(())
        }
    }
}

/// A streaming USTAR archive reader.
///
/// The reader pulls one header block at a time from its [`Source`] and hands
/// out one [`Entry`] at a time. Before the next header is read, whatever is
/// left of the previous entry's body and padding is discarded, so callers
/// may read a body fully, partly, or not at all.
///
/// # Example
///
/// ```no_run
/// use std::fs::File;
/// use std::io::Read;
/// use ustar_stream::{Archive, Options};
///
/// let file = File::open("archive.tar").unwrap();
/// let mut archive = Archive::seekable(file, Options::default());
///
/// while let Some(mut entry) = archive.next_entry().unwrap() {
///     println!("{} ({} bytes)", entry.metadata().name, entry.size());
///     if entry.metadata().name.ends_with(".txt") {
///         let mut text = String::new();
///         entry.read_to_string(&mut text).unwrap();
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Archive<S> {
    source: S,
    options: Options,
    block: [u8; BLOCK_SIZE],
    current: Option<Current>,
    pos: u64,
    state: State,
}

impl<I> Archive<Sequential<I>>
where
    I: Iterator<Item = io::Result<Bytes>>,
{
    /// Decode from a sequence of byte chunks.
    pub fn sequential(chunks: I, options: Options) -> Self {
        Self::new(Sequential::new(chunks), options)
    }
}

impl<R: Read> Archive<Sequential<ReadChunks<R>>> {
    /// Decode from a plain reader, read in chunks of
    /// [`Options::chunk_size`] bytes.
    pub fn from_reader(reader: R, options: Options) -> Self {
        let chunks = ReadChunks::new(reader, options.chunk_size);
        Self::sequential(chunks, options)
    }
}

impl<R: Read + Seek> Archive<Seekable<R>> {
    /// Decode from a seekable reader. Skipped bodies are seeked over.
    pub fn seekable(reader: R, options: Options) -> Self {
        Self::new(Seekable::new(reader), options)
    }
}

impl<S> Archive<S> {
    /// Decode from any source.
    pub fn new(source: S, options: Options) -> Self {
        Self {
            source,
            options,
            block: [0u8; BLOCK_SIZE],
            current: None,
            pos: 0,
            state: State::Reading,
        }
    }

    /// Number of archive bytes consumed so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Consume the reader and return the source.
    pub fn into_inner(self) -> S {
        self.source
    }

    fn entry(&mut self) -> Option<Entry<'_, S>> {
        let current = self.current.as_mut()?;
        Some(Entry {
            metadata: &current.metadata,
            body: &mut current.body,
            source: &mut self.source,
            options: &self.options,
            pos: &mut self.pos,
            state: &mut self.state,
        })
    }
}

impl<S: Source> Archive<S> {
    /// Get the next entry.
    ///
    /// Returns `Ok(None)` at the end of the archive: when the source is
    /// exhausted where a header was expected, or at an all-zero block.
    ///
    /// Any body bytes of the previous entry that were not read are discarded
    /// first.
    ///
    /// # Errors
    ///
    /// Header errors and truncated headers are fatal; every later call
    /// returns [`ArchiveError::Halted`]. I/O errors from the source are
    /// returned unchanged.
    pub fn next_entry(&mut self) -> Result<Option<Entry<'_, S>>> {
        match self.state {
            State::Reading => {}
            State::Finished => return Ok(None),
            State::Halted => return Err(ArchiveError::Halted),
        }

        match self.advance() {
            Ok(true) => Ok(self.entry()),
            Ok(false) => {
                self.state = State::Finished;
                Ok(None)
            }
            Err(err) => {
                self.state = State::Halted;
                Err(err)
            }
        }
    }

    /// Drain the current entry and read the next header.
    fn advance(&mut self) -> Result<bool> {
        if let Some(mut entry) = self.entry() {
            entry.discard()?;
        }
        self.current = None;

        let pos = self.pos;
        let len = self.source.fill_block(&mut self.block)?;
        self.pos += len as u64;

        self.current = parse_header(&self.block, len, pos)?;
        Ok(self.current.is_some())
    }
}

/// One archive member: its metadata plus access to its body.
///
/// The entry borrows the [`Archive`] it came from; drop it before asking for
/// the next one. How the body is read depends on the source:
///
/// - with a [`Sequential`] source, pull chunks with
///   [`next_chunk`](Entry::next_chunk) or [`chunks`](Entry::chunks);
/// - with a [`Seekable`] source, use the [`Read`] implementation.
///
/// Either way the body ends at the declared size; padding is never
/// surfaced. [`discard`](Entry::discard) skips the rest.
#[derive(Debug)]
pub struct Entry<'a, S> {
    metadata: &'a Metadata,
    body: &'a mut Body,
    source: &'a mut S,
    options: &'a Options,
    pos: &'a mut u64,
    state: &'a mut State,
}

impl<S> Entry<'_, S> {
    /// Decoded header of this entry.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        self.metadata
    }

    /// Declared body size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.body.size
    }

    /// Body size including block padding.
    #[must_use]
    pub fn padded_size(&self) -> u64 {
        self.body.padded
    }

    /// Bytes taken from the source for this entry so far, padding included.
    #[must_use]
    pub fn consumed(&self) -> u64 {
        self.body.consumed
    }

    /// Body bytes not yet read.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.body.remaining()
    }

    fn truncated(&mut self, missing: u64) -> Result<()> {
        truncated(self.options, self.state, self.body, *self.pos, missing)
    }
}

impl<S: Source> Entry<'_, S> {
    /// Skip whatever is left of the body and its padding.
    ///
    /// Afterwards the source sits on the next header block.
    pub fn discard(&mut self) -> Result<()> {
        if self.body.is_drained() {
            return Ok(());
        }
        let remaining = self.body.remaining_padded();

        debug!(
            "discarding {remaining} bytes of {:?} at offset {}",
            self.metadata.name, *self.pos
        );
        let skipped = self.source.skip(remaining)?;
        *self.pos += skipped;
        self.body.advance(skipped);

        if skipped < remaining {
            self.truncated(remaining - skipped)?;
        }
        Ok(())
    }
}

impl<'a, I> Entry<'a, Sequential<I>>
where
    I: Iterator<Item = io::Result<Bytes>>,
{
    /// Pull the next piece of the body.
    ///
    /// Pieces follow the source's chunking, cut at the declared size.
    /// Returns `Ok(None)` once the body is exhausted.
    pub fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        loop {
            let remaining = self.body.remaining_padded();
            if remaining == 0 {
                return Ok(None);
            }

            let Some(mut chunk) = self.source.pull(remaining)? else {
                self.truncated(remaining)?;
                return Ok(None);
            };
            *self.pos += chunk.len() as u64;
            let visible = self.body.advance(chunk.len() as u64);

            // visible never exceeds the chunk length
            chunk.truncate(visible as usize);
            if !chunk.is_empty() {
                trace!("{} body bytes of {:?}", chunk.len(), self.metadata.name);
                return Ok(Some(chunk));
            }
        }
    }

    /// Iterate over the remaining body pieces.
    pub fn chunks(&mut self) -> Chunks<'_, 'a, I> {
        Chunks { entry: self }
    }

    /// Append the rest of the body to `buf`, returning how many bytes were
    /// added.
    pub fn read_to_end(&mut self, buf: &mut Vec<u8>) -> Result<usize> {
        let start = buf.len();
        while let Some(chunk) = self.next_chunk()? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.len() - start)
    }
}

/// Iterator over the body pieces of a sequential entry.
///
/// Created by [`Entry::chunks`].
#[derive(Debug)]
pub struct Chunks<'e, 'a, I> {
    entry: &'e mut Entry<'a, Sequential<I>>,
}

impl<I> Iterator for Chunks<'_, '_, I>
where
    I: Iterator<Item = io::Result<Bytes>>,
{
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        self.entry.next_chunk().transpose()
    }
}

/// Reads stop at the declared size: a buffer larger than what is left gets
/// only the remaining body bytes, never padding or the next header.
impl<R: Read + Seek> Read for Entry<'_, Seekable<R>> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.body.remaining();
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let len = usize::try_from(remaining).map_or(buf.len(), |r| r.min(buf.len()));
        let n = self.source.reader_mut().read(&mut buf[..len])?;
        if n == 0 {
            self.truncated(self.body.remaining_padded())?;
            return Ok(0);
        }

        *self.pos += n as u64;
        self.body.advance(n as u64);
        Ok(n)
    }
}
