//! Streaming decoder for USTAR tar archives.
//!
//! An [`Archive`] reads one 512-byte header block at a time and yields one
//! [`Entry`] at a time. Nothing is buffered beyond the current header block
//! and at most one partly consumed input chunk, so archives of any size can
//! be decoded in constant memory.
//!
//! Input comes from one of two kinds of [`Source`]:
//!
//! - [`Sequential`]: an iterator of [`bytes::Bytes`] chunks of arbitrary
//!   size. Bodies are read with [`Entry::next_chunk`] and skipped by pulling
//!   and dropping chunks.
//! - [`Seekable`]: any [`std::io::Read`] + [`std::io::Seek`]. Bodies are read
//!   through [`std::io::Read`] on the entry and skipped with a seek.
//!
//! [`AsyncArchive`] offers the sequential flavour over a tokio
//! [`AsyncRead`](tokio::io::AsyncRead).
//!
//! Only the USTAR header layout is understood. GNU and PAX extension records
//! are surfaced as entries with [`EntryKind::Unknown`] and their bodies are
//! passed through untouched.
//!
//! ```
//! use bytes::Bytes;
//! use ustar_stream::{Archive, Options};
//!
//! // an archive holding nothing but its end-of-archive marker
//! let chunks: Vec<std::io::Result<Bytes>> = vec![Ok(Bytes::from(vec![0u8; 1024]))];
//! let mut archive = Archive::sequential(chunks.into_iter(), Options::default());
//!
//! while let Some(mut entry) = archive.next_entry()? {
//!     println!("{}", entry.metadata().name);
//!     while let Some(chunk) = entry.next_chunk()? {
//!         println!("  {} bytes", chunk.len());
//!     }
//! }
//! assert_eq!(archive.position(), 512);
//! # Ok::<(), ustar_stream::ArchiveError>(())
//! ```

mod archive;
mod asynchronous;
mod entry;
mod error;
pub mod header;
mod options;
pub mod source;
mod util;


pub use archive::{Archive, Chunks, Entry};
pub use asynchronous::{AsyncArchive, AsyncEntry};
pub use entry::{padded_size, Metadata};
pub use error::{ArchiveError, Result};
pub use header::{EntryKind, HeaderError, BLOCK_SIZE};
pub use options::{Options, Truncation};
pub use source::{ReadChunks, Seekable, Sequential, Source};
