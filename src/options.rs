//! Reader configuration.

/// What to do when the source ends inside an entry body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Truncation {
    /// Treat it as the end of the body and then the end of the archive.
    #[default]
    EndOfStream,
    /// Fail with [`ArchiveError::TruncatedBody`](crate::ArchiveError::TruncatedBody).
    Error,
}

/// Configuration for an archive reader.
///
/// # Example
///
/// ```
/// use ustar_stream::{Options, Truncation};
///
/// let options = Options {
///     chunk_size: 4096,
///     ..Options::strict()
/// };
/// assert_eq!(options.truncation, Truncation::Error);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Policy for a source that ends before an entry's padded size.
    ///
    /// Default: [`Truncation::EndOfStream`].
    pub truncation: Truncation,

    /// Chunk length used when a plain reader is adapted into a chunk
    /// sequence by [`Archive::from_reader`](crate::Archive::from_reader).
    ///
    /// Default: 64 KiB.
    pub chunk_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            truncation: Truncation::default(),
            chunk_size: 64 * 1024,
        }
    }
}

impl Options {
    /// Create `Options` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that reject truncated archives.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            truncation: Truncation::Error,
            ..Self::default()
        }
    }
}
