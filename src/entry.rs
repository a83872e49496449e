//! Decoded entry metadata and per-entry body accounting.

use crate::header::{EntryKind, BLOCK_SIZE};

/// Metadata of one archive member, decoded from its header block.
///
/// All text fields are decoded one byte per character; see
/// [`decode_text`](crate::header::decode_text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Member path, with the USTAR prefix already joined on.
    pub name: String,
    /// Permission and mode bits.
    pub mode: u32,
    /// Owner user ID.
    pub uid: u64,
    /// Owner group ID.
    pub gid: u64,
    /// Declared body size in bytes.
    pub size: u64,
    /// Modification time as a Unix timestamp.
    pub mtime: u64,
    /// Member kind.
    pub kind: EntryKind,
    /// Link target for hard and symbolic links, empty otherwise.
    pub link_name: String,
    /// Owner user name, possibly empty.
    pub owner: String,
    /// Owner group name, possibly empty.
    pub group: String,
    /// Device major number.
    pub major: u32,
    /// Device minor number.
    pub minor: u32,
}

impl Metadata {
    /// Body size rounded up to the block size.
    ///
    /// This is the number of bytes that follow the header in the archive.
    #[must_use]
    pub fn padded_size(&self) -> u64 {
        padded_size(self.size)
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    #[must_use]
    pub fn is_symlink(&self) -> bool {
        self.kind.is_symlink()
    }

    #[must_use]
    pub fn is_hard_link(&self) -> bool {
        self.kind.is_hard_link()
    }
}

/// Round `size` up to a whole number of blocks.
#[must_use]
pub fn padded_size(size: u64) -> u64 {
    // size fields hold at most 11 octal digits, far below overflow
    size.next_multiple_of(BLOCK_SIZE as u64)
}

/// Progress through the body of the current entry.
///
/// Counts bytes only; the position in the source belongs to the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Body {
    /// Declared size from the header.
    pub(crate) size: u64,
    /// `size` rounded up to the block size.
    pub(crate) padded: u64,
    /// Bytes taken from the source so far, padding included.
    pub(crate) consumed: u64,
}

impl Body {
    pub(crate) fn new(size: u64) -> Self {
        Self {
            size,
            padded: padded_size(size),
            consumed: 0,
        }
    }

    /// Body bytes not yet handed to the caller.
    pub(crate) fn remaining(&self) -> u64 {
        self.size.saturating_sub(self.consumed)
    }

    /// Body and padding bytes not yet taken from the source.
    pub(crate) fn remaining_padded(&self) -> u64 {
        self.padded - self.consumed
    }

    pub(crate) fn is_drained(&self) -> bool {
        self.consumed == self.padded
    }

    /// Record `len` bytes taken from the source and return how many of them
    /// are body bytes, the rest being padding.
    pub(crate) fn advance(&mut self, len: u64) -> u64 {
        debug_assert!(len <= self.remaining_padded());
        let visible = len.min(self.remaining());
        self.consumed += len;
        visible
    }

    /// Mark everything through the padding as consumed.
    pub(crate) fn finish(&mut self) {
        self.consumed = self.padded;
    }
}
