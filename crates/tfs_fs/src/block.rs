//! The data block pool.
//!
//! A fixed array of [`DATA_BLOCKS`] equally sized blocks, plus a parallel
//! allocation bitmap. Blocks carry raw bytes; interpretation (file payload,
//! indirect pointer array, directory entries) is up to the caller.

use std::sync::RwLock;

use tfs_types::{BlockNo, TfsError, BLOCK_SIZE, DATA_BLOCKS};

use crate::delay::insert_delay;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Slot {
    Free,
    Taken,
}

pub struct BlockPool {
    bitmap: RwLock<Vec<Slot>>,
    data: RwLock<Vec<[u8; BLOCK_SIZE]>>,
}

impl BlockPool {
    pub fn new() -> Self {
        Self {
            bitmap: RwLock::new(vec![Slot::Free; DATA_BLOCKS]),
            data: RwLock::new(vec![[0u8; BLOCK_SIZE]; DATA_BLOCKS]),
        }
    }

    /// Allocates the first free block, linear first-fit.
    ///
    /// Uses the upgrade protocol: scan under a read lock, and only take the
    /// write lock to commit a candidate, rechecking it first in case
    /// another allocator won the race in between.
    pub fn alloc(&self) -> Option<BlockNo> {
        let mut i = 0;
        loop {
            if i >= DATA_BLOCKS {
                return None;
            }

            {
                let bitmap = self.bitmap.read().unwrap();
                if i % (BLOCK_SIZE) == 0 {
                    insert_delay();
                }
                if bitmap[i] != Slot::Free {
                    i += 1;
                    continue;
                }
            }

            let mut bitmap = self.bitmap.write().unwrap();
            if bitmap[i] == Slot::Free {
                bitmap[i] = Slot::Taken;
                return Some(BlockNo::new(i as u32));
            }
            // Lost the race: someone else took it between the read and the
            // write lock. Retry this same index under a fresh read lock.
            drop(bitmap);
        }
    }

    /// Marks a previously allocated block free again.
    pub fn free(&self, block: BlockNo) -> Result<(), TfsError> {
        let idx = block.as_index();
        if idx >= DATA_BLOCKS {
            return Err(TfsError::InvalidArgument("block index out of range"));
        }
        insert_delay();
        let mut bitmap = self.bitmap.write().unwrap();
        bitmap[idx] = Slot::Free;
        Ok(())
    }

    /// Copies `src` into block `block`, starting at `offset` within it.
    pub fn write_at(&self, block: BlockNo, offset: usize, src: &[u8]) -> Result<(), TfsError> {
        let idx = block.as_index();
        if idx >= DATA_BLOCKS {
            return Err(TfsError::InvalidArgument("block index out of range"));
        }
        insert_delay();
        let mut data = self.data.write().unwrap();
        data[idx][offset..offset + src.len()].copy_from_slice(src);
        Ok(())
    }

    /// Copies out of block `block`, starting at `offset` within it, into `dst`.
    pub fn read_at(&self, block: BlockNo, offset: usize, dst: &mut [u8]) -> Result<(), TfsError> {
        let idx = block.as_index();
        if idx >= DATA_BLOCKS {
            return Err(TfsError::InvalidArgument("block index out of range"));
        }
        insert_delay();
        let data = self.data.read().unwrap();
        dst.copy_from_slice(&data[idx][offset..offset + dst.len()]);
        Ok(())
    }

    /// Reinterprets a block as `MAX_DIR_ENTRIES` empty directory entries or
    /// as an all-absent indirect block, by zeroing it and then running `f`
    /// over the freshly zeroed bytes.
    pub fn init_with<F: FnOnce(&mut [u8; BLOCK_SIZE])>(
        &self,
        block: BlockNo,
        f: F,
    ) -> Result<(), TfsError> {
        let idx = block.as_index();
        if idx >= DATA_BLOCKS {
            return Err(TfsError::InvalidArgument("block index out of range"));
        }
        let mut data = self.data.write().unwrap();
        data[idx] = [0u8; BLOCK_SIZE];
        f(&mut data[idx]);
        Ok(())
    }
}

impl Default for BlockPool {
    fn default() -> Self {
        Self::new()
    }
}
