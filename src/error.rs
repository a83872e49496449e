//! Error types for archive decoding.

use std::io;

use thiserror::Error;

use crate::header::HeaderError;

/// Errors that can occur while decoding an archive.
///
/// Header errors are fatal: once one is returned the reader refuses further
/// work with [`ArchiveError::Halted`] instead of hunting for the next
/// plausible header.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// I/O error from the byte source, passed through unchanged.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A header block failed validation.
    #[error("bad header at offset {pos}: {source}")]
    Header {
        /// Offset of the header block in the archive.
        pos: u64,
        /// What was wrong with it.
        #[source]
        source: HeaderError,
    },

    /// The source ended partway through a header block.
    #[error("truncated header at offset {pos}: {len} of 512 bytes")]
    TruncatedHeader {
        /// Offset of the header block.
        pos: u64,
        /// Bytes read before the source ended.
        len: usize,
    },

    /// The source ended before an entry body and its padding were complete.
    ///
    /// Only returned under [`Truncation::Error`](crate::Truncation::Error).
    #[error("truncated archive at offset {pos}: {missing} bytes missing")]
    TruncatedBody {
        /// Offset at which the source ended.
        pos: u64,
        /// Body and padding bytes that never arrived.
        missing: u64,
    },

    /// The reader already failed and cannot continue.
    #[error("archive reader halted after an earlier error")]
    Halted,
}

impl ArchiveError {
    /// Whether this is a header checksum failure.
    #[must_use]
    pub fn is_checksum(&self) -> bool {
        matches!(
            self,
            ArchiveError::Header {
                source: HeaderError::ChecksumMismatch { .. },
                ..
            }
        )
    }

    /// Whether this is an unsupported-format failure.
    #[must_use]
    pub fn is_unsupported_format(&self) -> bool {
        matches!(
            self,
            ArchiveError::Header {
                source: HeaderError::UnsupportedFormat { .. },
                ..
            }
        )
    }
}

impl From<ArchiveError> for io::Error {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::Io(err) => err,
            err @ (ArchiveError::TruncatedHeader { .. } | ArchiveError::TruncatedBody { .. }) => {
                io::Error::new(io::ErrorKind::UnexpectedEof, err)
            }
            err => io::Error::new(io::ErrorKind::InvalidData, err),
        }
    }
}

/// Result type for archive decoding.
pub type Result<T> = std::result::Result<T, ArchiveError>;
