use std::io::{ErrorKind, Read, Result};

use tokio::io::{AsyncRead, AsyncReadExt};

/// Fill `buf` from `reader`, retrying on EINTR, and return how much was filled.
///
/// End of input is not an error here. A return of 0 is a clean end and
/// anything short of `buf.len()` means the reader ran dry partway; which of
/// those is acceptable is for the caller to decide.
pub(crate) fn read_exactish(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;

    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(filled)
}

/// [`read_exactish`] for tokio readers.
pub(crate) async fn read_exactish_async(
    reader: &mut (impl AsyncRead + Unpin),
    buf: &mut [u8],
) -> Result<usize> {
    let mut filled = 0;

    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(filled)
}
