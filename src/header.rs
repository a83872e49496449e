//! Zerocopy view of the 512-byte USTAR header block.
//!
//! Every header is exactly one block of fixed-offset ASCII fields. Numeric
//! fields are octal text, string fields are NUL-terminated or padded.
//!
//! | Offset | Size | Field     | Encoding                                 |
//! |--------|------|-----------|------------------------------------------|
//! | 0      | 100  | name      | NUL-terminated text                      |
//! | 100    | 8    | mode      | octal                                    |
//! | 108    | 8    | uid       | octal                                    |
//! | 116    | 8    | gid       | octal                                    |
//! | 124    | 12   | size      | octal                                    |
//! | 136    | 12   | mtime     | octal (Unix epoch)                       |
//! | 148    | 8    | checksum  | octal, summed as spaces                  |
//! | 156    | 1    | typeflag  | entry kind (see [`EntryKind`])           |
//! | 157    | 100  | linkname  | NUL-terminated text                      |
//! | 257    | 8    | magic     | starts with "ustar"                      |
//! | 265    | 32   | uname     | NUL-terminated text                      |
//! | 297    | 32   | gname     | NUL-terminated text                      |
//! | 329    | 8    | devmajor  | octal                                    |
//! | 337    | 8    | devminor  | octal                                    |
//! | 345    | 155  | prefix    | joined to name with "/"                  |
//! | 500    | 12   | (pad)     | unused                                   |
//!
//! The same layout is kept twice: as the [`FIELDS`] table used for
//! diagnostics, and as the [`UstarHeader`] struct used for access. A
//! compile-time check keeps them in agreement.

use std::{fmt, mem::size_of, ops::Range};

use thiserror::Error;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::entry::Metadata;

/// Size of a tar block in bytes. Headers are one block, bodies are padded to a
/// multiple of it.
pub const BLOCK_SIZE: usize = 512;

/// Prefix the magic field must start with.
pub const USTAR_MAGIC: &[u8; 5] = b"ustar";

/// Checksum of a block whose bytes are all zero: the eight checksum bytes
/// count as ASCII spaces.
pub const EMPTY_BLOCK_CHECKSUM: u64 = 8 * b' ' as u64;

/// Errors found while decoding a single header block.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// The stored checksum does not match the sum of the block.
    #[error("checksum mismatch: header records {stored:?}, computed {computed:o}")]
    ChecksumMismatch {
        /// Text of the checksum field as stored.
        stored: String,
        /// Checksum computed over the block.
        computed: u64,
    },

    /// The magic field does not identify a USTAR header.
    #[error("unsupported archive format (magic {magic:?})")]
    UnsupportedFormat {
        /// The decoded magic field.
        magic: String,
    },

    /// A numeric field holds something other than octal digits.
    #[error("invalid octal in {field} field: {value:?}")]
    InvalidOctal {
        /// Name of the offending field.
        field: &'static str,
        /// Raw field bytes.
        value: Vec<u8>,
    },

    /// A numeric field decodes to a value too large for its type.
    #[error("{field} value {value} out of range")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The decoded value.
        value: u64,
    },
}

/// Name, offset and length of one header field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    /// Field name, used in error messages.
    pub name: &'static str,
    /// Byte offset within the block.
    pub offset: usize,
    /// Field width in bytes.
    pub len: usize,
}

impl Field {
    const fn new(name: &'static str, offset: usize, len: usize) -> Self {
        Self { name, offset, len }
    }

    /// Byte range of this field within a block.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Entry name, or its tail when a prefix is present.
pub const NAME: Field = Field::new("name", 0, 100);
/// Permission and mode bits.
pub const MODE: Field = Field::new("mode", 100, 8);
/// Owner user ID.
pub const UID: Field = Field::new("uid", 108, 8);
/// Owner group ID.
pub const GID: Field = Field::new("gid", 116, 8);
/// Declared body size.
pub const SIZE: Field = Field::new("size", 124, 12);
/// Modification time.
pub const MTIME: Field = Field::new("mtime", 136, 12);
/// Header checksum, counted as spaces when summing.
pub const CHECKSUM: Field = Field::new("checksum", 148, 8);
/// Entry kind byte.
pub const TYPEFLAG: Field = Field::new("typeflag", 156, 1);
/// Link target.
pub const LINKNAME: Field = Field::new("linkname", 157, 100);
/// Format magic and version.
pub const MAGIC: Field = Field::new("magic", 257, 8);
/// Owner user name.
pub const UNAME: Field = Field::new("uname", 265, 32);
/// Owner group name.
pub const GNAME: Field = Field::new("gname", 297, 32);
/// Device major number.
pub const DEVMAJOR: Field = Field::new("devmajor", 329, 8);
/// Device minor number.
pub const DEVMINOR: Field = Field::new("devminor", 337, 8);
/// Leading path components of long names.
pub const PREFIX: Field = Field::new("prefix", 345, 155);
/// Unused tail of the block.
pub const RESERVED: Field = Field::new("reserved", 500, 12);

/// Every field of a header block, in on-disk order.
pub const FIELDS: [Field; 16] = [
    NAME, MODE, UID, GID, SIZE, MTIME, CHECKSUM, TYPEFLAG, LINKNAME, MAGIC, UNAME, GNAME,
    DEVMAJOR, DEVMINOR, PREFIX, RESERVED,
];

const _: () = {
    let mut offset = 0;
    let mut i = 0;
    while i < FIELDS.len() {
        assert!(FIELDS[i].offset == offset, "header fields must be contiguous");
        offset += FIELDS[i].len;
        i += 1;
    }
    assert!(offset == BLOCK_SIZE, "header fields must fill exactly one block");
    assert!(size_of::<UstarHeader>() == BLOCK_SIZE);
};

/// A USTAR header block with named fields.
///
/// This is a zero-copy view over the raw block; nothing is decoded until one
/// of the accessors is called. Use [`decode_block`] to validate a block and
/// get its [`Metadata`].
#[derive(Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct UstarHeader {
    /// File path name (NUL-terminated if shorter than 100 bytes).
    pub name: [u8; 100],
    /// File mode in octal ASCII.
    pub mode: [u8; 8],
    /// Owner user ID in octal ASCII.
    pub uid: [u8; 8],
    /// Owner group ID in octal ASCII.
    pub gid: [u8; 8],
    /// Body size in octal ASCII.
    pub size: [u8; 12],
    /// Modification time as Unix timestamp in octal ASCII.
    pub mtime: [u8; 12],
    /// Header checksum in octal ASCII.
    pub checksum: [u8; 8],
    /// Entry type flag.
    pub typeflag: u8,
    /// Link target for hard and symbolic links.
    pub linkname: [u8; 100],
    /// Format magic, "ustar\0" followed by the version.
    pub magic: [u8; 8],
    /// Owner user name.
    pub uname: [u8; 32],
    /// Owner group name.
    pub gname: [u8; 32],
    /// Device major number in octal ASCII.
    pub devmajor: [u8; 8],
    /// Device minor number in octal ASCII.
    pub devminor: [u8; 8],
    /// Path prefix for names longer than 100 bytes.
    pub prefix: [u8; 155],
    /// Unused tail of the block.
    pub pad: [u8; 12],
}

impl UstarHeader {
    /// View a block as a header.
    #[must_use]
    pub fn from_block(block: &[u8; BLOCK_SIZE]) -> &UstarHeader {
        zerocopy::transmute_ref!(block)
    }

    /// The underlying block bytes.
    #[must_use]
    pub fn as_block(&self) -> &[u8; BLOCK_SIZE] {
        zerocopy::transmute_ref!(self)
    }

    /// Entry kind from the type flag.
    #[must_use]
    pub fn kind(&self) -> EntryKind {
        EntryKind::from_byte(self.typeflag)
    }

    /// Declared body size in bytes.
    pub fn entry_size(&self) -> Result<u64, HeaderError> {
        octal(SIZE, &self.size)
    }

    /// Checksum computed over this block.
    #[must_use]
    pub fn compute_checksum(&self) -> u64 {
        compute_checksum(self.as_block())
    }

    /// Check the stored checksum against the computed one.
    pub fn verify_checksum(&self) -> Result<(), HeaderError> {
        let computed = self.compute_checksum();
        match parse_octal(&self.checksum) {
            Some(stored) if stored == computed => Ok(()),
            _ => Err(HeaderError::ChecksumMismatch {
                stored: decode_text(truncate_null(&self.checksum)).trim().to_owned(),
                computed,
            }),
        }
    }

    /// Whether the magic field starts with "ustar".
    #[must_use]
    pub fn is_ustar(&self) -> bool {
        self.magic.starts_with(USTAR_MAGIC)
    }

    /// Full entry name, with the prefix joined on when present.
    #[must_use]
    pub fn path(&self) -> String {
        let name = decode_text(truncate_null(&self.name));
        let prefix = truncate_null(&self.prefix);
        if prefix.is_empty() {
            name
        } else {
            format!("{}/{name}", decode_text(prefix))
        }
    }

    /// Decode every field into owned [`Metadata`].
    ///
    /// This does not check the checksum or the magic; see [`decode_block`].
    pub fn metadata(&self) -> Result<Metadata, HeaderError> {
        Ok(Metadata {
            name: self.path(),
            mode: octal(MODE, &self.mode)?,
            uid: octal(UID, &self.uid)?,
            gid: octal(GID, &self.gid)?,
            size: self.entry_size()?,
            mtime: octal(MTIME, &self.mtime)?,
            kind: self.kind(),
            link_name: decode_text(truncate_null(&self.linkname)),
            owner: decode_text(truncate_null(&self.uname)),
            group: decode_text(truncate_null(&self.gname)),
            major: octal(DEVMAJOR, &self.devmajor)?,
            minor: octal(DEVMINOR, &self.devminor)?,
        })
    }
}

impl fmt::Debug for UstarHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UstarHeader")
            .field("name", &self.path())
            .field("kind", &self.kind())
            .field("size", &self.entry_size().ok())
            .field("magic", &decode_text(truncate_null(&self.magic)))
            .finish_non_exhaustive()
    }
}

/// Validate one header block and decode it.
///
/// Returns `Ok(None)` for the end-of-archive marker: a block whose checksum
/// equals [`EMPTY_BLOCK_CHECKSUM`], which is what an all-zero block sums to.
///
/// # Errors
///
/// [`HeaderError::ChecksumMismatch`] when the stored checksum is wrong,
/// [`HeaderError::UnsupportedFormat`] when the magic is not "ustar", and the
/// numeric errors when a field cannot be decoded.
pub fn decode_block(block: &[u8; BLOCK_SIZE]) -> Result<Option<Metadata>, HeaderError> {
    let header = UstarHeader::from_block(block);
    if header.compute_checksum() == EMPTY_BLOCK_CHECKSUM {
        return Ok(None);
    }
    header.verify_checksum()?;
    if !header.is_ustar() {
        return Err(HeaderError::UnsupportedFormat {
            magic: decode_text(truncate_null(&header.magic)),
        });
    }
    header.metadata().map(Some)
}

/// Kind of archive member, from the type flag byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file (`'0'`, or NUL in pre-POSIX archives).
    File,
    /// Hard link to an earlier member (`'1'`).
    Link,
    /// Symbolic link (`'2'`).
    Symlink,
    /// Character device (`'3'`).
    CharDevice,
    /// Block device (`'4'`).
    BlockDevice,
    /// Directory (`'5'`).
    Directory,
    /// Named pipe (`'6'`).
    Fifo,
    /// Contiguous file (`'7'`).
    ContiguousFile,
    /// Any other type flag, kept as the raw byte.
    Unknown(u8),
}

impl EntryKind {
    /// Map a type flag byte to a kind.
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'0' | b'\0' => EntryKind::File,
            b'1' => EntryKind::Link,
            b'2' => EntryKind::Symlink,
            b'3' => EntryKind::CharDevice,
            b'4' => EntryKind::BlockDevice,
            b'5' => EntryKind::Directory,
            b'6' => EntryKind::Fifo,
            b'7' => EntryKind::ContiguousFile,
            other => EntryKind::Unknown(other),
        }
    }

    /// The type flag byte for this kind. `File` encodes as `'0'`.
    #[must_use]
    pub fn to_byte(self) -> u8 {
        match self {
            EntryKind::File => b'0',
            EntryKind::Link => b'1',
            EntryKind::Symlink => b'2',
            EntryKind::CharDevice => b'3',
            EntryKind::BlockDevice => b'4',
            EntryKind::Directory => b'5',
            EntryKind::Fifo => b'6',
            EntryKind::ContiguousFile => b'7',
            EntryKind::Unknown(b) => b,
        }
    }

    /// Regular or contiguous file.
    #[must_use]
    pub fn is_file(self) -> bool {
        matches!(self, EntryKind::File | EntryKind::ContiguousFile)
    }

    #[must_use]
    pub fn is_dir(self) -> bool {
        self == EntryKind::Directory
    }

    #[must_use]
    pub fn is_symlink(self) -> bool {
        self == EntryKind::Symlink
    }

    #[must_use]
    pub fn is_hard_link(self) -> bool {
        self == EntryKind::Link
    }

    /// Character or block device.
    #[must_use]
    pub fn is_device(self) -> bool {
        matches!(self, EntryKind::CharDevice | EntryKind::BlockDevice)
    }

    /// Type flag outside the USTAR table.
    #[must_use]
    pub fn is_unknown(self) -> bool {
        matches!(self, EntryKind::Unknown(_))
    }
}

impl From<u8> for EntryKind {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

impl From<EntryKind> for u8 {
    fn from(kind: EntryKind) -> Self {
        kind.to_byte()
    }
}

/// Sum of all block bytes with the checksum field counted as spaces.
#[must_use]
pub fn compute_checksum(block: &[u8; BLOCK_SIZE]) -> u64 {
    let checksum = CHECKSUM.range();
    block[..checksum.start]
        .iter()
        .chain(&block[checksum.end..])
        .fold(EMPTY_BLOCK_CHECKSUM, |sum, &b| sum + u64::from(b))
}

/// Parse an octal ASCII field.
///
/// Leading spaces are skipped and the digits end at the first space or NUL,
/// so `"0000644\0"` and `"   644 "` both give `0o644`. A field with no
/// digits is zero. Returns `None` for any other byte or on overflow.
#[must_use]
pub fn parse_octal(bytes: &[u8]) -> Option<u64> {
    let start = bytes.iter().position(|&b| b != b' ').unwrap_or(bytes.len());
    let end = bytes[start..]
        .iter()
        .position(|&b| b == b' ' || b == b'\0')
        .map_or(bytes.len(), |i| start + i);

    bytes[start..end].iter().try_fold(0u64, |value, &b| {
        if !(b'0'..=b'7').contains(&b) {
            return None;
        }
        value.checked_mul(8)?.checked_add(u64::from(b - b'0'))
    })
}

/// Truncate a field at its first NUL byte.
///
/// ```
/// use ustar_stream::header::truncate_null;
///
/// assert_eq!(truncate_null(b"hello\0world"), b"hello");
/// assert_eq!(truncate_null(b"no null here"), b"no null here");
/// ```
#[must_use]
pub fn truncate_null(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(pos) => &bytes[..pos],
        None => bytes,
    }
}

/// Decode header text one byte per character.
///
/// Header fields are meant to be ASCII; anything else is passed through as
/// the Latin-1 character with the same value instead of failing.
#[must_use]
pub fn decode_text(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

fn octal<T: TryFrom<u64>>(field: Field, bytes: &[u8]) -> Result<T, HeaderError> {
    let value = parse_octal(bytes).ok_or_else(|| HeaderError::InvalidOctal {
        field: field.name,
        value: bytes.to_vec(),
    })?;
    T::try_from(value).map_err(|_| HeaderError::OutOfRange {
        field: field.name,
        value,
    })
}

#[cfg(test)]
mod tests {
    use std::mem::offset_of;

    use similar_asserts::assert_eq;

    use super::*;
    use crate::test::HeaderBuilder;

    #[test]
    fn test_field_table_matches_struct() {
        let offsets = [
            offset_of!(UstarHeader, name),
            offset_of!(UstarHeader, mode),
            offset_of!(UstarHeader, uid),
            offset_of!(UstarHeader, gid),
            offset_of!(UstarHeader, size),
            offset_of!(UstarHeader, mtime),
            offset_of!(UstarHeader, checksum),
            offset_of!(UstarHeader, typeflag),
            offset_of!(UstarHeader, linkname),
            offset_of!(UstarHeader, magic),
            offset_of!(UstarHeader, uname),
            offset_of!(UstarHeader, gname),
            offset_of!(UstarHeader, devmajor),
            offset_of!(UstarHeader, devminor),
            offset_of!(UstarHeader, prefix),
            offset_of!(UstarHeader, pad),
        ];
        for (field, offset) in FIELDS.iter().zip(offsets) {
            assert_eq!(field.offset, offset, "{}", field.name);
        }
        assert_eq!(FIELDS.iter().map(|f| f.len).sum::<usize>(), BLOCK_SIZE);
    }

    #[test]
    fn test_parse_octal() {
        assert_eq!(parse_octal(b"0000644\0"), Some(420));
        assert_eq!(parse_octal(b"0000755\0"), Some(0o755));
        assert_eq!(parse_octal(b"     123 "), Some(0o123));
        assert_eq!(parse_octal(b"00000000017\0"), Some(15));
        assert_eq!(parse_octal(b"\0\0\0\0\0\0\0\0"), Some(0));
        assert_eq!(parse_octal(b""), Some(0));
        assert_eq!(parse_octal(b"   "), Some(0));
    }

    #[test]
    fn test_parse_octal_invalid() {
        assert_eq!(parse_octal(b"abc"), None);
        assert_eq!(parse_octal(b"0000648\0"), None);
        assert_eq!(parse_octal(b"7777777777777777777777777"), None);
    }

    #[test]
    fn test_decode_text_passes_non_ascii() {
        assert_eq!(decode_text(b"plain"), "plain");
        assert_eq!(decode_text(&[b'a', 0xe9, b'b']), "a\u{e9}b");
        assert_eq!(decode_text(&[0xff]).chars().count(), 1);
    }

    #[test]
    fn test_zero_block_checksum() {
        assert_eq!(EMPTY_BLOCK_CHECKSUM, 256);
        assert_eq!(compute_checksum(&[0u8; BLOCK_SIZE]), 256);

        // the checksum field itself never contributes
        let mut block = [0u8; BLOCK_SIZE];
        block[CHECKSUM.range()].copy_from_slice(b"7777777\0");
        assert_eq!(compute_checksum(&block), 256);
    }

    #[test]
    fn test_kind_table() {
        let table = [
            (b'0', EntryKind::File),
            (b'1', EntryKind::Link),
            (b'2', EntryKind::Symlink),
            (b'3', EntryKind::CharDevice),
            (b'4', EntryKind::BlockDevice),
            (b'5', EntryKind::Directory),
            (b'6', EntryKind::Fifo),
            (b'7', EntryKind::ContiguousFile),
        ];
        for (byte, kind) in table {
            assert_eq!(EntryKind::from_byte(byte), kind);
            assert_eq!(u8::from(kind), byte);
        }
        assert_eq!(EntryKind::from_byte(b'\0'), EntryKind::File);
    }

    #[test]
    fn test_unknown_kind_is_preserved() {
        for byte in [b'8', b'9', b'x', b'L'] {
            let kind = EntryKind::from(byte);
            assert_eq!(kind, EntryKind::Unknown(byte));
            assert!(kind.is_unknown());
            assert!(!kind.is_file());
            assert_eq!(kind.to_byte(), byte);
        }
    }

    #[test]
    fn test_decode_roundtrip() {
        let block = HeaderBuilder::file("bin/tool", 1234)
            .prefix("usr/local")
            .mode(0o755)
            .ids(1000, 100)
            .mtime(1_600_000_000)
            .owner("alice", "staff")
            .build();

        let meta = decode_block(&block).unwrap().expect("not an end marker");
        assert_eq!(meta.name, "usr/local/bin/tool");
        assert_eq!(meta.mode, 0o755);
        assert_eq!(meta.uid, 1000);
        assert_eq!(meta.gid, 100);
        assert_eq!(meta.size, 1234);
        assert_eq!(meta.mtime, 1_600_000_000);
        assert_eq!(meta.kind, EntryKind::File);
        assert_eq!(meta.owner, "alice");
        assert_eq!(meta.group, "staff");
        assert_eq!(meta.major, 0);
        assert_eq!(meta.minor, 0);
    }

    #[test]
    fn test_decode_device() {
        let block = HeaderBuilder::new("dev/sda", EntryKind::BlockDevice)
            .device(8, 1)
            .build();
        let meta = decode_block(&block).unwrap().unwrap();
        assert!(meta.kind.is_device());
        assert_eq!((meta.major, meta.minor), (8, 1));
    }

    #[test]
    fn test_decode_name_without_prefix() {
        let block = HeaderBuilder::file("file.txt", 0).build();
        let meta = decode_block(&block).unwrap().unwrap();
        assert_eq!(meta.name, "file.txt");
    }

    #[test]
    fn test_decode_zero_block() {
        assert!(decode_block(&[0u8; BLOCK_SIZE]).unwrap().is_none());
    }

    #[test]
    fn test_single_byte_flip_breaks_checksum() {
        let block = HeaderBuilder::file("some/file", 42)
            .owner("root", "root")
            .build();
        for i in (0..BLOCK_SIZE).filter(|i| !CHECKSUM.range().contains(i)) {
            let mut corrupt = block;
            corrupt[i] ^= 0x01;
            let err = decode_block(&corrupt).unwrap_err();
            assert!(
                matches!(err, HeaderError::ChecksumMismatch { .. }),
                "offset {i}: {err}"
            );
        }
    }

    #[test]
    fn test_garbage_checksum_field() {
        let mut block = HeaderBuilder::file("a", 0).build();
        block[CHECKSUM.range()].copy_from_slice(b"hello!\0 ");
        let err = decode_block(&block).unwrap_err();
        match err {
            HeaderError::ChecksumMismatch { stored, .. } => assert_eq!(stored, "hello!"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_unsupported_magic() {
        let block = HeaderBuilder::file("old.txt", 0).magic(b"ustaX\0").build();
        match decode_block(&block).unwrap_err() {
            HeaderError::UnsupportedFormat { magic } => assert_eq!(magic, "ustaX"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_gnu_magic_accepted() {
        let block = HeaderBuilder::file("gnu.txt", 3).magic(b"ustar  \0").build();
        assert_eq!(decode_block(&block).unwrap().unwrap().name, "gnu.txt");
    }

    #[test]
    fn test_invalid_octal_field() {
        let block = HeaderBuilder::file("bad", 0).raw(UID, b"12x4567\0").build();
        match decode_block(&block).unwrap_err() {
            HeaderError::InvalidOctal { field, .. } => assert_eq!(field, "uid"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_debug_impl() {
        let block = HeaderBuilder::file("dbg", 7).build();
        let text = format!("{:?}", UstarHeader::from_block(&block));
        assert!(text.contains("dbg"));
    }

    /// Decoding checks over generated field values.
    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        fn text_strategy(first: &str, rest: &str, max: usize) -> impl Strategy<Value = String> {
            proptest::string::string_regex(&format!("{first}{rest}{{0,{max}}}"))
                .expect("valid regex")
        }

        /// Mostly USTAR kinds, sometimes an arbitrary type flag.
        fn kind_strategy() -> impl Strategy<Value = EntryKind> {
            prop_oneof![
                3 => (b'0'..=b'7').prop_map(EntryKind::from_byte),
                1 => any::<u8>().prop_map(EntryKind::from_byte),
            ]
        }

        /// The prefix field, plus metadata whose `name` is the name field alone.
        fn fields_strategy() -> impl Strategy<Value = (String, Metadata)> {
            (
                (
                    text_strategy("", "[a-zA-Z0-9_./-]", 155),
                    text_strategy("[a-zA-Z0-9_]", "[a-zA-Z0-9_./-]", 99),
                ),
                (0u32..0o7777777, 0u64..0o7777777, 0u64..0o7777777),
                (0u64..=0o77777777777, 0u64..=0o77777777777, kind_strategy()),
                (
                    text_strategy("", "[a-z_-]", 32),
                    text_strategy("", "[a-z_-]", 32),
                    text_strategy("", "[a-zA-Z0-9_./-]", 100),
                ),
                (0u32..0o7777777, 0u32..0o7777777),
            )
                .prop_map(
                    |((prefix, name), (mode, uid, gid), (size, mtime, kind), names, dev)| {
                        let (owner, group, link_name) = names;
                        let metadata = Metadata {
                            name,
                            mode,
                            uid,
                            gid,
                            size,
                            mtime,
                            kind,
                            link_name,
                            owner,
                            group,
                            major: dev.0,
                            minor: dev.1,
                        };
                        (prefix, metadata)
                    },
                )
        }

        fn path_strategy() -> impl Strategy<Value = String> {
            proptest::string::string_regex(
                "[a-zA-Z0-9_][a-zA-Z0-9_.+-]*(/[a-zA-Z0-9_][a-zA-Z0-9_.+-]*)*",
            )
            .expect("valid regex")
            .prop_filter("fits the name field", |s| s.len() < 100)
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(256))]

            #[test]
            fn test_fields_roundtrip((prefix, metadata) in fields_strategy()) {
                let block = HeaderBuilder::new(&metadata.name, metadata.kind)
                    .prefix(&prefix)
                    .mode(metadata.mode)
                    .ids(metadata.uid, metadata.gid)
                    .size(metadata.size)
                    .mtime(metadata.mtime)
                    .owner(&metadata.owner, &metadata.group)
                    .link(&metadata.link_name)
                    .device(metadata.major, metadata.minor)
                    .build();

                let mut expected = metadata;
                if !prefix.is_empty() {
                    expected.name = format!("{prefix}/{}", expected.name);
                }

                let decoded = decode_block(&block).unwrap().expect("not an end marker");
                prop_assert_eq!(decoded.padded_size(), crate::padded_size(expected.size));
                prop_assert_eq!(decoded, expected);
            }

            #[test]
            fn test_tar_crate_header_decodes(
                path in path_strategy(),
                mode in 0u32..0o7777,
                uid in 0u64..0o7777777,
                gid in 0u64..0o7777777,
                mtime in 0u64..0o77777777777,
                size in 0u64..1 << 32,
                owner in text_strategy("[a-zA-Z_]", "[a-zA-Z0-9_]", 30),
                group in text_strategy("[a-zA-Z_]", "[a-zA-Z0-9_]", 30),
            ) {
                let mut header = tar::Header::new_ustar();
                header.set_path(&path).unwrap();
                header.set_mode(mode);
                header.set_uid(uid);
                header.set_gid(gid);
                header.set_mtime(mtime);
                header.set_size(size);
                header.set_entry_type(tar::EntryType::Regular);
                header.set_username(&owner).unwrap();
                header.set_groupname(&group).unwrap();
                header.set_cksum();

                let decoded = decode_block(header.as_bytes())
                    .unwrap()
                    .expect("not an end marker");
                prop_assert_eq!(decoded.name, path);
                prop_assert_eq!(decoded.mode, mode);
                prop_assert_eq!(decoded.uid, uid);
                prop_assert_eq!(decoded.gid, gid);
                prop_assert_eq!(decoded.mtime, mtime);
                prop_assert_eq!(decoded.size, size);
                prop_assert_eq!(decoded.kind, EntryKind::File);
                prop_assert_eq!(decoded.owner, owner);
                prop_assert_eq!(decoded.group, group);
            }
        }
    }
}
