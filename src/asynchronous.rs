//! Async archive reader over a tokio [`AsyncRead`].
//!
//! Same contract as [`Archive`](crate::Archive) with a sequential source:
//! every read and skip is an `.await` point, and skips are done by reading
//! and dropping bytes since the reader cannot seek. Reads are issued
//! strictly one at a time.

use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{
    archive::{parse_header, truncated, Current, State},
    entry::{Body, Metadata},
    error::{ArchiveError, Result},
    header::BLOCK_SIZE,
    options::Options,
    util::read_exactish_async,
};

/// A streaming USTAR archive reader over an async byte stream.
///
/// # Example
///
/// ```no_run
/// use ustar_stream::{AsyncArchive, Options};
///
/// # async fn run(data: &[u8]) -> ustar_stream::Result<()> {
/// let mut archive = AsyncArchive::new(data, Options::default());
///
/// while let Some(mut entry) = archive.next_entry().await? {
///     let mut body = Vec::new();
///     entry.read_to_end(&mut body).await?;
///     println!("{}: {} bytes", entry.metadata().name, body.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AsyncArchive<R> {
    reader: R,
    options: Options,
    block: [u8; BLOCK_SIZE],
    current: Option<Current>,
    pos: u64,
    state: State,
}

impl<R> AsyncArchive<R> {
    pub fn new(reader: R, options: Options) -> Self {
        Self {
            reader,
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

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn entry(&mut self) -> Option<AsyncEntry<'_, R>> {
        let current = self.current.as_mut()?;
        Some(AsyncEntry {
            metadata: &current.metadata,
            body: &mut current.body,
            reader: &mut self.reader,
            options: &self.options,
            pos: &mut self.pos,
            state: &mut self.state,
        })
    }
}

impl<R: AsyncRead + Unpin> AsyncArchive<R> {
    /// Get the next entry, discarding what is left of the previous one.
    ///
    /// See [`Archive::next_entry`](crate::Archive::next_entry).
    pub async fn next_entry(&mut self) -> Result<Option<AsyncEntry<'_, R>>> {
        match self.state {
            State::Reading => {}
            State::Finished => return Ok(None),
            State::Halted => return Err(ArchiveError::Halted),
        }

        match self.advance().await {
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

    async fn advance(&mut self) -> Result<bool> {
        if let Some(mut entry) = self.entry() {
            entry.discard().await?;
        }
        self.current = None;

        let pos = self.pos;
        let len = read_exactish_async(&mut self.reader, &mut self.block).await?;
        self.pos += len as u64;

        self.current = parse_header(&self.block, len, pos)?;
        Ok(self.current.is_some())
    }
}

/// One member of an [`AsyncArchive`].
#[derive(Debug)]
pub struct AsyncEntry<'a, R> {
    metadata: &'a Metadata,
    body: &'a mut Body,
    reader: &'a mut R,
    options: &'a Options,
    pos: &'a mut u64,
    state: &'a mut State,
}

impl<R> AsyncEntry<'_, R> {
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        self.metadata
    }

    /// Declared body size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.body.size
    }

    /// Body bytes not yet read.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.body.remaining()
    }
}

impl<R: AsyncRead + Unpin> AsyncEntry<'_, R> {
    /// Read body bytes into `buf`.
    ///
    /// Never reads past the declared size, so this may return fewer bytes
    /// than asked for. Returns 0 once the body is exhausted.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let remaining = self.body.remaining();
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let len = usize::try_from(remaining).map_or(buf.len(), |r| r.min(buf.len()));
        let n = self.reader.read(&mut buf[..len]).await?;
        if n == 0 {
            let missing = self.body.remaining_padded();
            truncated(self.options, self.state, self.body, *self.pos, missing)?;
            return Ok(0);
        }

        *self.pos += n as u64;
        self.body.advance(n as u64);
        Ok(n)
    }

    /// Append the rest of the body to `buf`, returning how many bytes were
    /// added.
    pub async fn read_to_end(&mut self, buf: &mut Vec<u8>) -> Result<usize> {
        let start = buf.len();
        let mut chunk = [0u8; 8192];
        loop {
            let n = self.read(&mut chunk).await?;
            if n == 0 {
                return Ok(buf.len() - start);
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    }

    /// Read and drop whatever is left of the body and its padding.
    pub async fn discard(&mut self) -> Result<()> {
        if self.body.is_drained() {
            return Ok(());
        }
        let remaining = self.body.remaining_padded();

        debug!(
            "discarding {remaining} bytes of {:?} at offset {}",
            self.metadata.name, *self.pos
        );
        let mut limited = (&mut *self.reader).take(remaining);
        let skipped = tokio::io::copy(&mut limited, &mut tokio::io::sink()).await?;
        *self.pos += skipped;
        self.body.advance(skipped);

        if skipped < remaining {
            truncated(
                self.options,
                self.state,
                self.body,
                *self.pos,
                remaining - skipped,
            )?;
        }
        Ok(())
    }
}
