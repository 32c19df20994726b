//! The (single, flat) root directory.
//!
//! A directory's entries live in the first direct block of its inode. Each
//! entry is `(inumber: i32, name: [u8; MAX_FILE_NAME])`, with `inumber ==
//! -1` marking an empty slot. Only the root directory is ever operated on
//! by this module; TecnicoFS has no subdirectories.

use tfs_types::{InodeNo, InodeType, TfsError, MAX_DIR_ENTRIES, MAX_FILE_NAME};

use crate::block::BlockPool;
use crate::delay::insert_delay;
use crate::inode::InodeTable;

const ENTRY_SIZE: usize = size_of::<i32>() + MAX_FILE_NAME;

/// Places `(child, name)` into the first empty slot of `parent`'s
/// directory block. Fails if `parent` is not a directory, `name` is
/// empty, or the directory is full.
///
/// Duplicate-name detection is deliberately not this function's job: the
/// facade serializes lookup-then-create with its open mutex, which makes
/// duplicate inserts for the same name impossible in practice (see
/// DESIGN.md, Open Question (a)).
pub fn add(
    inodes: &InodeTable,
    blocks: &BlockPool,
    parent: InodeNo,
    child: InodeNo,
    name: &str,
) -> Result<(), TfsError> {
    if name.is_empty() {
        return Err(TfsError::InvalidArgument("empty file name"));
    }

    insert_delay();
    let mut parent_inode = inodes.write(parent)?;
    if parent_inode.ty != InodeType::Directory {
        return Err(TfsError::InvalidArgument("parent is not a directory"));
    }

    let dir_block = InodeTable::block_at(&parent_inode, 0, blocks)?
        .ok_or(TfsError::InvalidArgument("directory has no entry block"))?;

    for slot in 0..MAX_DIR_ENTRIES {
        let (inum, _) = read_entry(blocks, dir_block, slot)?;
        if inum.is_none() {
            write_entry(blocks, dir_block, slot, Some(child), name)?;
            // Touching the parent inode under its write lock for the
            // duration of the whole scan-and-insert, even though only the
            // data block changed, keeps this call atomic with concurrent
            // lookups of the same directory.
            drop(parent_inode);
            return Ok(());
        }
    }
    drop(parent_inode);
    Err(TfsError::ResourceExhausted("directory is full"))
}

/// Looks up `name` in `parent`'s directory, returning its inumber.
pub fn find(
    inodes: &InodeTable,
    blocks: &BlockPool,
    parent: InodeNo,
    name: &str,
) -> Result<Option<InodeNo>, TfsError> {
    insert_delay();
    let parent_inode = inodes.read(parent)?;
    if parent_inode.ty != InodeType::Directory {
        return Err(TfsError::InvalidArgument("parent is not a directory"));
    }

    let dir_block = InodeTable::block_at(&parent_inode, 0, blocks)?
        .ok_or(TfsError::InvalidArgument("directory has no entry block"))?;

    for slot in 0..MAX_DIR_ENTRIES {
        let (inum, entry_name) = read_entry(blocks, dir_block, slot)?;
        let Some(inum) = inum else { continue };
        if entry_name == name {
            return Ok(Some(inum));
        }
    }
    Ok(None)
}

fn read_entry(
    blocks: &BlockPool,
    dir_block: tfs_types::BlockNo,
    slot: usize,
) -> Result<(Option<InodeNo>, String), TfsError> {
    let mut buf = [0u8; ENTRY_SIZE];
    blocks.read_at(dir_block, slot * ENTRY_SIZE, &mut buf)?;
    let inum = i32::from_le_bytes(buf[0..4].try_into().unwrap());
    let name_bytes = &buf[4..];
    let nul = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());
    let name = String::from_utf8_lossy(&name_bytes[..nul]).into_owned();
    Ok((
        if inum < 0 {
            None
        } else {
            Some(InodeNo::new(inum as u32))
        },
        name,
    ))
}

fn write_entry(
    blocks: &BlockPool,
    dir_block: tfs_types::BlockNo,
    slot: usize,
    inum: Option<InodeNo>,
    name: &str,
) -> Result<(), TfsError> {
    let mut buf = [0u8; ENTRY_SIZE];
    let raw = inum.map_or(-1, |i| i.value() as i32);
    buf[0..4].copy_from_slice(&raw.to_le_bytes());
    let name_bytes = name.as_bytes();
    let truncated_len = name_bytes.len().min(MAX_FILE_NAME - 1);
    buf[4..4 + truncated_len].copy_from_slice(&name_bytes[..truncated_len]);
    // Remaining bytes in `buf` (including the terminator) are already zero.
    blocks.write_at(dir_block, slot * ENTRY_SIZE, &buf)
}
