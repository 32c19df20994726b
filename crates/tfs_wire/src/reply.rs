//! Reply framing: a status integer, optionally followed by a data payload.

use std::io::Write;

use tfs_types::TfsError;

use crate::ints::write_i32;

/// Writes a bare `i32` status reply (MOUNT, UNMOUNT, OPEN, CLOSE, WRITE,
/// SHUTDOWN_AFTER_ALL_CLOSED all take this shape).
pub fn write_status<W: Write>(writer: &mut W, status: i32) -> Result<(), TfsError> {
    write_i32(writer, status)
}

/// Writes a READ reply: the byte count, followed by that many bytes of
/// file data when the count is positive.
pub fn write_read_reply<W: Write>(writer: &mut W, data: &[u8]) -> Result<(), TfsError> {
    write_i32(writer, data.len() as i32)?;
    if !data.is_empty() {
        tfs_ipc::write_all_retrying(writer, data)?;
    }
    Ok(())
}
