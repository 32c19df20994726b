//! The filesystem facade: `tfs_init`/`tfs_open`/`tfs_close`/`tfs_read`/
//! `tfs_write`/`tfs_truncate`/`tfs_destroy_after_all_closed`, plus
//! `tfs_lookup`.
//!
//! This is the only module client-facing code (the session server) should
//! call into; everything below it (block pool, inode table, directory,
//! open-file table) is an implementation detail reachable only through
//! here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tfs_types::{
    Handle, InodeNo, InodeType, OpenFlags, TfsError, BLOCK_SIZE, MAX_FILE_SIZE,
};

use crate::block::BlockPool;
use crate::directory;
use crate::inode::InodeTable;
use crate::open_file::OpenFileTable;
use crate::path;

/// Owns all process-wide mutable filesystem state. There is exactly one
/// instance of this per running server, created by `Fs::init` and torn
/// down by `Fs::destroy_after_all_closed`.
pub struct Fs {
    blocks: BlockPool,
    inodes: InodeTable,
    open_files: OpenFileTable,
    /// Serializes name-bind (lookup + optional create) across concurrent
    /// `open(O_CREAT)` calls, so two callers racing to create the same
    /// name can never both succeed. Held across lookup and create, but
    /// released before truncate and before allocating the handle.
    open_mutex: Mutex<()>,
    shutting_down: AtomicBool,
}

impl Fs {
    /// Creates the root directory inode and returns a ready-to-use `Fs`.
    pub fn init() -> Result<Self, TfsError> {
        let fs = Self {
            blocks: BlockPool::new(),
            inodes: InodeTable::new(),
            open_files: OpenFileTable::new(),
            open_mutex: Mutex::new(()),
            shutting_down: AtomicBool::new(false),
        };

        let root = fs
            .inodes
            .create(InodeType::Directory, &fs.blocks)
            .ok_or(TfsError::ResourceExhausted("inode table full at init"))?;
        if root != InodeNo::ROOT {
            return Err(TfsError::InvalidArgument("root inode did not land at slot 0"));
        }
        Ok(fs)
    }

    /// Resolves `name` to an inumber without opening it.
    pub fn lookup(&self, name: &str) -> Result<InodeNo, TfsError> {
        let stripped = path::strip_root(name)?;
        directory::find(&self.inodes, &self.blocks, InodeNo::ROOT, stripped)?
            .ok_or(TfsError::NotFound)
    }

    /// Opens (optionally creating or truncating) `name`, returning a fresh
    /// handle.
    pub fn open(&self, name: &str, flags: OpenFlags) -> Result<Handle, TfsError> {
        if self.shutting_down.load(Ordering::Acquire) {
            return Err(TfsError::ShuttingDown);
        }
        let stripped = path::strip_root(name)?;

        let guard = self.open_mutex.lock().unwrap();
        let found = directory::find(&self.inodes, &self.blocks, InodeNo::ROOT, stripped)?;

        let inumber = match found {
            Some(inum) => inum,
            None => {
                if !flags.contains(OpenFlags::CREAT) {
                    return Err(TfsError::NotFound);
                }
                let inum = self
                    .inodes
                    .create(InodeType::File, &self.blocks)
                    .ok_or(TfsError::ResourceExhausted("inode table full"))?;
                if let Err(e) = directory::add(&self.inodes, &self.blocks, InodeNo::ROOT, inum, stripped)
                {
                    // Roll back: the directory slot was never bound, so the
                    // inode must not outlive this call.
                    let _ = self.inodes.delete(inum, &self.blocks);
                    return Err(e);
                }
                inum
            }
        };
        drop(guard);

        let offset = if found.is_some() {
            if flags.contains(OpenFlags::TRUNC) {
                self.inodes.truncate(inumber, &self.blocks)?;
            }
            if flags.contains(OpenFlags::APPEND) {
                self.inodes.read(inumber)?.size as u64
            } else {
                0
            }
        } else {
            0
        };

        self.open_files
            .add(inumber, offset)
            .ok_or(TfsError::ResourceExhausted("open-file table full"))
    }

    /// Closes `handle`. Does not free the underlying inode's data.
    pub fn close(&self, handle: Handle) -> Result<(), TfsError> {
        self.open_files.remove(handle)
    }

    /// Writes `data` at the handle's current offset, advancing it and
    /// growing the file as needed. Returns the number of bytes actually
    /// written.
    pub fn write(&self, handle: Handle, data: &[u8]) -> Result<usize, TfsError> {
        let mut entry = self.open_files.lock(handle)?;
        let mut inode = self.inodes.write(entry.inumber)?;

        let mut offset = entry.offset.min(inode.size as u64) as usize;
        let max_write = MAX_FILE_SIZE.saturating_sub(offset);
        let to_write = data.len().min(max_write);

        let mut written = 0usize;
        while written < to_write {
            let current_block_i = offset / BLOCK_SIZE;
            let in_block_offset = offset % BLOCK_SIZE;
            let chunk_len = (BLOCK_SIZE - in_block_offset).min(to_write - written);

            if inode.size as usize <= current_block_i * BLOCK_SIZE {
                let new_block = self
                    .blocks
                    .alloc()
                    .ok_or(TfsError::ResourceExhausted("block pool full"))?;
                InodeTable::set_block_at(&mut inode, current_block_i, new_block, &self.blocks)?;
            }
            let block = InodeTable::block_at(&inode, current_block_i, &self.blocks)?
                .ok_or(TfsError::Io(std::io::Error::other("missing data block after allocation")))?;

            self.blocks
                .write_at(block, in_block_offset, &data[written..written + chunk_len])?;

            offset += chunk_len;
            written += chunk_len;
            if offset as u32 > inode.size {
                inode.size = offset as u32;
            }
        }

        entry.offset = offset as u64;
        Ok(written)
    }

    /// Reads up to `len` bytes from the handle's current offset, advancing
    /// it. Returns the number of bytes actually read (`0` at EOF).
    pub fn read(&self, handle: Handle, len: usize) -> Result<Vec<u8>, TfsError> {
        let mut entry = self.open_files.lock(handle)?;
        let inode = self.inodes.read(entry.inumber)?;

        let offset = entry.offset.min(inode.size as u64) as usize;
        let to_read = (inode.size as usize - offset).min(len);

        let mut out = vec![0u8; to_read];
        let mut read = 0usize;
        let mut cursor = offset;
        while read < to_read {
            let current_block_i = cursor / BLOCK_SIZE;
            let in_block_offset = cursor % BLOCK_SIZE;
            let chunk_len = (BLOCK_SIZE - in_block_offset).min(to_read - read);

            let block = InodeTable::block_at(&inode, current_block_i, &self.blocks)?
                .ok_or(TfsError::Io(std::io::Error::other("hole in a non-empty file")))?;
            self.blocks
                .read_at(block, in_block_offset, &mut out[read..read + chunk_len])?;

            cursor += chunk_len;
            read += chunk_len;
        }

        entry.offset = cursor as u64;
        Ok(out)
    }

    /// Frees all of `inumber`'s data blocks and resets its size to zero.
    pub fn truncate(&self, inumber: InodeNo) -> Result<(), TfsError> {
        self.inodes.truncate(inumber, &self.blocks)
    }

    /// Refuses further `open` calls, waits for every open handle to close,
    /// then tears down the filesystem state. Idempotent only in the sense
    /// that the flag is one-way; calling this twice concurrently is the
    /// caller's responsibility to avoid (the session server only ever
    /// calls it from one worker, since only one session can hold the
    /// opcode).
    pub fn destroy_after_all_closed(&self) -> Result<(), TfsError> {
        self.shutting_down.store(true, Ordering::Release);
        log::info!(
            "refusing new opens, waiting for {} open handle(s) to close",
            self.open_files.open_count()
        );
        self.open_files.wait_until_empty();
        log::info!("all handles closed, filesystem state can be torn down");
        Ok(())
    }
}
