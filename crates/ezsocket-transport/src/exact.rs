//! Exact-length stream I/O.
//!
//! A single `read`/`write` call on a socket may move fewer bytes than asked
//! for. Everything above this module relies on these helpers instead, so a
//! frame is either transferred completely or the call fails.

use std::io::{ErrorKind, Read, Write};

use crate::error::{Result, TransportError};

/// Write all of `buf` to `writer`, then flush.
///
/// Short writes are continued and `Interrupted` is retried. A write that
/// accepts zero bytes means the peer has gone away.
pub fn write_exact<W: Write + ?Sized>(writer: &mut W, buf: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < buf.len() {
        match writer.write(&buf[offset..]) {
            Ok(0) => {
                return Err(TransportError::Closed {
                    expected: buf.len(),
                    transferred: offset,
                })
            }
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::Io(err)),
        }
    }

    loop {
        match writer.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::Io(err)),
        }
    }
}

/// Read exactly `len` bytes from `reader`.
pub fn read_exact<R: Read + ?Sized>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    read_exact_into(reader, &mut buf)?;
    Ok(buf)
}

/// Fill `buf` completely from `reader`.
///
/// EOF before the buffer is full is reported as [`TransportError::Closed`].
/// `WouldBlock`/`TimedOut` (read timeouts) are surfaced, not retried.
pub fn read_exact_into<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(TransportError::Closed {
                    expected: buf.len(),
                    transferred: filled,
                })
            }
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::Io(err)),
        }
    }
    Ok(())
}
