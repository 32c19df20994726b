//! The inode table.
//!
//! A fixed array of inodes with an allocation bitmap and one
//! reader/writer lock per inode. The indirect block, when present, stores
//! its pointers as `i32` little-endian values (`-1` meaning absent),
//! because it is just a regular data block reinterpreted.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tfs_types::{
    BlockNo, InodeNo, InodeType, TfsError, BLOCK_SIZE, INDIRECT_REFS_PER_BLOCK,
    INODE_BLOCK_COUNT, INODE_DIRECT_BLOCK_SIZE, INODE_TABLE_SIZE, MAX_DIR_ENTRIES, MAX_FILE_NAME,
};

use crate::block::BlockPool;
use crate::delay::insert_delay;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Slot {
    Free,
    Taken,
}

/// In-memory representation of an inode.
#[derive(Clone)]
pub struct Inode {
    pub ty: InodeType,
    pub size: u32,
    direct: [Option<BlockNo>; INODE_DIRECT_BLOCK_SIZE],
    indirect: Option<BlockNo>,
}

impl Inode {
    fn empty(ty: InodeType) -> Self {
        Self {
            ty,
            size: 0,
            direct: [None; INODE_DIRECT_BLOCK_SIZE],
            indirect: None,
        }
    }
}

pub struct InodeTable {
    alloc_bitmap: RwLock<Vec<Slot>>,
    inodes: Vec<RwLock<Inode>>,
}

impl InodeTable {
    pub fn new() -> Self {
        let inodes = (0..INODE_TABLE_SIZE)
            .map(|_| RwLock::new(Inode::empty(InodeType::File)))
            .collect();
        Self {
            alloc_bitmap: RwLock::new(vec![Slot::Free; INODE_TABLE_SIZE]),
            inodes,
        }
    }

    /// Allocates a free inode slot and initializes it as `ty`.
    ///
    /// For a directory, also allocates the single data block that will
    /// hold its entries, zeroed so that every directory entry reads as
    /// empty. Any failure during directory initialization frees the slot
    /// back up before returning `None`.
    pub fn create(&self, ty: InodeType, blocks: &BlockPool) -> Option<InodeNo> {
        let inum = self.alloc_slot()?;

        let mut inode = self.inodes[inum.as_index()].write().unwrap();
        insert_delay();
        *inode = Inode::empty(ty);

        if ty == InodeType::Directory {
            let Some(dir_block) = blocks.alloc() else {
                drop(inode);
                self.free_slot(inum);
                return None;
            };
            if blocks.init_with(dir_block, zero_directory_entries).is_err() {
                drop(inode);
                self.free_slot(inum);
                return None;
            }
            inode.size = BLOCK_SIZE as u32;
            inode.direct[0] = Some(dir_block);
        }

        drop(inode);
        Some(inum)
    }

    /// Releases all data blocks of `inumber` (direct, indirect body, and
    /// the indirect block itself) and frees the slot.
    pub fn delete(&self, inumber: InodeNo, blocks: &BlockPool) -> Result<(), TfsError> {
        insert_delay();
        insert_delay();

        let mut bitmap = self.alloc_bitmap.write().unwrap();
        let idx = valid_inum(inumber)?;
        if bitmap[idx] == Slot::Free {
            return Err(TfsError::InvalidArgument("inode already free"));
        }

        let mut inode = self.inodes[idx].write().unwrap();
        Self::release_all_blocks(&mut inode, blocks)?;
        bitmap[idx] = Slot::Free;
        Ok(())
    }

    /// Releases all data blocks of `inumber`, keeping the slot allocated
    /// with size reset to zero.
    pub fn truncate(&self, inumber: InodeNo, blocks: &BlockPool) -> Result<(), TfsError> {
        insert_delay();
        insert_delay();

        let bitmap = self.alloc_bitmap.read().unwrap();
        let idx = valid_inum(inumber)?;
        if bitmap[idx] == Slot::Free {
            return Err(TfsError::InvalidArgument("inode is free"));
        }
        drop(bitmap);

        let mut inode = self.inodes[idx].write().unwrap();
        Self::release_all_blocks(&mut inode, blocks)
    }

    fn release_all_blocks(inode: &mut Inode, blocks: &BlockPool) -> Result<(), TfsError> {
        for slot in &mut inode.direct {
            if let Some(b) = slot.take() {
                blocks.free(b)?;
            }
        }
        if let Some(b) = inode.indirect.take() {
            blocks.free(b)?;
        }
        inode.size = 0;
        Ok(())
    }

    /// Read access to an inode, serialized with writers by the per-inode lock.
    pub fn read(&self, inumber: InodeNo) -> Result<RwLockReadGuard<'_, Inode>, TfsError> {
        let idx = valid_inum(inumber)?;
        Ok(self.inodes[idx].read().unwrap())
    }

    /// Write access to an inode.
    pub fn write(&self, inumber: InodeNo) -> Result<RwLockWriteGuard<'_, Inode>, TfsError> {
        let idx = valid_inum(inumber)?;
        Ok(self.inodes[idx].write().unwrap())
    }

    /// Returns the data block at logical block index `index` within `inode`.
    pub fn block_at(
        inode: &Inode,
        index: usize,
        blocks: &BlockPool,
    ) -> Result<Option<BlockNo>, TfsError> {
        if index >= INODE_BLOCK_COUNT {
            return Err(TfsError::InvalidArgument("block index out of range"));
        }
        if index < INODE_DIRECT_BLOCK_SIZE {
            return Ok(inode.direct[index]);
        }
        let Some(indirect) = inode.indirect else {
            return Ok(None);
        };
        Ok(read_indirect_slot(blocks, indirect, index - INODE_DIRECT_BLOCK_SIZE)?)
    }

    /// Installs `block_idx` at logical block index `index` within `inode`,
    /// lazily allocating the indirect block on first indirect write.
    pub fn set_block_at(
        inode: &mut Inode,
        index: usize,
        block_idx: BlockNo,
        blocks: &BlockPool,
    ) -> Result<(), TfsError> {
        if index >= INODE_BLOCK_COUNT {
            return Err(TfsError::InvalidArgument("block index out of range"));
        }
        if index < INODE_DIRECT_BLOCK_SIZE {
            inode.direct[index] = Some(block_idx);
            return Ok(());
        }
        if inode.indirect.is_none() {
            let new_indirect = blocks
                .alloc()
                .ok_or(TfsError::ResourceExhausted("block pool full"))?;
            blocks.init_with(new_indirect, zero_indirect_entries)?;
            inode.indirect = Some(new_indirect);
        }
        let indirect = inode.indirect.unwrap();
        write_indirect_slot(blocks, indirect, index - INODE_DIRECT_BLOCK_SIZE, block_idx)
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InodeTable {
    fn alloc_slot(&self) -> Option<InodeNo> {
        let mut i = 0;
        loop {
            if i >= INODE_TABLE_SIZE {
                return None;
            }
            {
                let bitmap = self.alloc_bitmap.read().unwrap();
                if bitmap[i] != Slot::Free {
                    i += 1;
                    continue;
                }
            }
            let mut bitmap = self.alloc_bitmap.write().unwrap();
            if bitmap[i] == Slot::Free {
                bitmap[i] = Slot::Taken;
                return Some(InodeNo::new(i as u32));
            }
            drop(bitmap);
        }
    }

    fn free_slot(&self, inumber: InodeNo) {
        let mut bitmap = self.alloc_bitmap.write().unwrap();
        bitmap[inumber.as_index()] = Slot::Free;
    }
}

fn valid_inum(inumber: InodeNo) -> Result<usize, TfsError> {
    let idx = inumber.as_index();
    if idx >= INODE_TABLE_SIZE {
        return Err(TfsError::InvalidArgument("inumber out of range"));
    }
    Ok(idx)
}

/// Marks every directory-entry slot in a freshly allocated block as empty.
///
/// A directory entry's inumber field uses `-1` for "empty", not `0` (which
/// is a real inumber: the root directory's own). A zeroed block must not
/// be mistaken for one full of entries pointing at the root.
fn zero_directory_entries(block: &mut [u8; BLOCK_SIZE]) {
    const ENTRY_SIZE: usize = size_of::<i32>() + MAX_FILE_NAME;
    for slot in 0..MAX_DIR_ENTRIES {
        block[slot * ENTRY_SIZE..slot * ENTRY_SIZE + 4].copy_from_slice(&(-1i32).to_le_bytes());
    }
}

/// Marks every pointer slot in a freshly allocated indirect block as
/// absent. Same rationale as [`zero_directory_entries`]: block `0` is a
/// real block number, so "unset" has to be encoded as `-1`, not as zero
/// bytes.
fn zero_indirect_entries(block: &mut [u8; BLOCK_SIZE]) {
    for slot in 0..INDIRECT_REFS_PER_BLOCK {
        let entry = slot * size_of::<i32>();
        block[entry..entry + 4].copy_from_slice(&(-1i32).to_le_bytes());
    }
}

const INDIRECT_ENTRY_SIZE: usize = size_of::<i32>();

fn read_indirect_slot(
    blocks: &BlockPool,
    indirect: BlockNo,
    slot: usize,
) -> Result<Option<BlockNo>, TfsError> {
    debug_assert!(slot < INDIRECT_REFS_PER_BLOCK);
    let mut buf = [0u8; INDIRECT_ENTRY_SIZE];
    blocks.read_at(indirect, slot * INDIRECT_ENTRY_SIZE, &mut buf)?;
    let raw = i32::from_le_bytes(buf);
    Ok(if raw < 0 {
        None
    } else {
        Some(BlockNo::new(raw as u32))
    })
}

fn write_indirect_slot(
    blocks: &BlockPool,
    indirect: BlockNo,
    slot: usize,
    block_idx: BlockNo,
) -> Result<(), TfsError> {
    debug_assert!(slot < INDIRECT_REFS_PER_BLOCK);
    let raw = block_idx.value() as i32;
    blocks.write_at(indirect, slot * INDIRECT_ENTRY_SIZE, &raw.to_le_bytes())
}
