//! Fixed-width host-endian integer fields.

use std::io::{Read, Write};

use tfs_types::TfsError;

pub fn read_i32<R: Read>(reader: &mut R) -> Result<i32, TfsError> {
    let mut buf = [0u8; 4];
    tfs_ipc::read_exact_retrying(reader, &mut buf)?;
    Ok(i32::from_ne_bytes(buf))
}

pub fn read_u64<R: Read>(reader: &mut R) -> Result<u64, TfsError> {
    let mut buf = [0u8; 8];
    tfs_ipc::read_exact_retrying(reader, &mut buf)?;
    Ok(u64::from_ne_bytes(buf))
}

pub fn write_i32<W: Write>(writer: &mut W, value: i32) -> Result<(), TfsError> {
    tfs_ipc::write_all_retrying(writer, &value.to_ne_bytes())
}
