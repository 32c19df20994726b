//! EINTR-tolerant full-count reads and writes.
//!
//! `std::fs::File` retries `read`/`write` internally on `ErrorKind::Interrupted`,
//! but it does not loop to completion: a short read or write is returned to
//! the caller as-is. Pipe framing needs the exact byte count every time, so
//! both loops below keep going until either the whole buffer has moved or a
//! non-interrupt error occurs.

use std::io::{self, Read, Write};

use tfs_types::TfsError;

/// Reads exactly `buf.len()` bytes, retrying on `Interrupted` and on short
/// reads. An end-of-file before `buf` is full is reported as
/// `UnexpectedEof`.
pub fn read_exact_retrying<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), TfsError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(TfsError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "peer closed the pipe mid-message",
                )))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(TfsError::Io(e)),
        }
    }
    Ok(())
}

/// Writes exactly `buf`, retrying on `Interrupted` and on short writes.
pub fn write_all_retrying<W: Write>(writer: &mut W, buf: &[u8]) -> Result<(), TfsError> {
    let mut sent = 0;
    while sent < buf.len() {
        match writer.write(&buf[sent..]) {
            Ok(0) => {
                return Err(TfsError::Io(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "peer stopped reading mid-message",
                )))
            }
            Ok(n) => sent += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(TfsError::Io(e)),
        }
    }
    Ok(())
}
