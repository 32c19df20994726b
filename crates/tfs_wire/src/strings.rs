//! Fixed-width, NUL-padded string fields.

use std::io::Read;

use tfs_types::{TfsError, PIPE_STRING_LENGTH};

/// Reads a `PIPE_STRING_LENGTH`-byte field and trims it at the first NUL.
pub fn read_fixed_string<R: Read>(reader: &mut R) -> Result<String, TfsError> {
    let mut raw = [0u8; PIPE_STRING_LENGTH];
    tfs_ipc::read_exact_retrying(reader, &mut raw)?;
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8(raw[..end].to_vec())
        .map_err(|_| TfsError::InvalidArgument("name field is not valid UTF-8"))
}

/// Encodes `s` into a `PIPE_STRING_LENGTH`-byte NUL-padded field.
pub fn encode_fixed_string(s: &str) -> Result<[u8; PIPE_STRING_LENGTH], TfsError> {
    if s.len() >= PIPE_STRING_LENGTH {
        return Err(TfsError::InvalidArgument("name exceeds PIPE_STRING_LENGTH"));
    }
    let mut buf = [0u8; PIPE_STRING_LENGTH];
    buf[..s.len()].copy_from_slice(s.as_bytes());
    Ok(buf)
}
