//! The open-file table.
//!
//! A fixed array of `(inumber, offset)` handles. A separate mutex guards
//! the free/taken bitmap (so `add`/`remove`/"is anything still open" can be
//! answered without touching any entry's contents), while each entry has
//! its own mutex serializing the reads and writes that share that handle.

use std::sync::{Condvar, Mutex, MutexGuard};

use tfs_types::{Handle, InodeNo, TfsError, MAX_OPEN_FILES};

pub struct OpenFileEntry {
    pub inumber: InodeNo,
    pub offset: u64,
}

pub struct OpenFileTable {
    taken: Mutex<Vec<bool>>,
    drained: Condvar,
    entries: Vec<Mutex<OpenFileEntry>>,
}

impl OpenFileTable {
    pub fn new() -> Self {
        let entries = (0..MAX_OPEN_FILES)
            .map(|_| {
                Mutex::new(OpenFileEntry {
                    inumber: InodeNo::new(0),
                    offset: 0,
                })
            })
            .collect();
        Self {
            taken: Mutex::new(vec![false; MAX_OPEN_FILES]),
            drained: Condvar::new(),
            entries,
        }
    }

    /// Claims a free slot and initializes it, returning its handle.
    pub fn add(&self, inumber: InodeNo, offset: u64) -> Option<Handle> {
        let mut taken = self.taken.lock().unwrap();
        let idx = taken.iter().position(|&t| !t)?;
        taken[idx] = true;
        let mut entry = self.entries[idx].lock().unwrap();
        entry.inumber = inumber;
        entry.offset = offset;
        drop(entry);
        Some(Handle::new(idx as u32))
    }

    /// Frees `handle`. Does not consult or modify the inode it pointed at.
    pub fn remove(&self, handle: Handle) -> Result<(), TfsError> {
        let idx = handle.as_index();
        let mut taken = self.taken.lock().unwrap();
        if idx >= MAX_OPEN_FILES || !taken[idx] {
            return Err(TfsError::InvalidArgument("invalid or already-closed handle"));
        }
        taken[idx] = false;
        if taken.iter().all(|&t| !t) {
            self.drained.notify_all();
        }
        Ok(())
    }

    /// Locks `handle`'s entry for the duration of a read or write.
    pub fn lock(&self, handle: Handle) -> Result<MutexGuard<'_, OpenFileEntry>, TfsError> {
        let idx = handle.as_index();
        if idx >= MAX_OPEN_FILES {
            return Err(TfsError::InvalidArgument("handle out of range"));
        }
        {
            let taken = self.taken.lock().unwrap();
            if !taken[idx] {
                return Err(TfsError::InvalidArgument("handle is not open"));
            }
        }
        Ok(self.entries[idx].lock().unwrap())
    }

    /// `true` once every slot has been freed; used by
    /// `shutdown_after_all_closed` to wait the table dry.
    pub fn is_empty(&self) -> bool {
        self.taken.lock().unwrap().iter().all(|&t| !t)
    }

    pub fn open_count(&self) -> usize {
        self.taken.lock().unwrap().iter().filter(|&&t| t).count()
    }

    /// Blocks the calling thread until every slot has been freed.
    pub fn wait_until_empty(&self) {
        let taken = self.taken.lock().unwrap();
        let _guard = self
            .drained
            .wait_while(taken, |taken| taken.iter().any(|&t| t))
            .unwrap();
    }
}

impl Default for OpenFileTable {
    fn default() -> Self {
        Self::new()
    }
}
