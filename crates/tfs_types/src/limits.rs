//! Compile-time configuration. Every constant here is an invariant of the
//! on-wire and in-memory layout, not a tunable default.

/// Inode number of the (always-live) root directory.
pub const ROOT_DIR_INUM: usize = 0;

/// Size in bytes of a single data block.
pub const BLOCK_SIZE: usize = 1024;

/// Number of data blocks in the block pool.
pub const DATA_BLOCKS: usize = 1024;

/// Number of slots in the inode table.
pub const INODE_TABLE_SIZE: usize = 50;

/// Number of slots in the open-file table.
pub const MAX_OPEN_FILES: usize = 20;

/// Number of direct block pointers held inline in an inode.
pub const INODE_DIRECT_BLOCK_SIZE: usize = 10;

/// Number of block pointers an indirect block can hold.
pub const INDIRECT_REFS_PER_BLOCK: usize = BLOCK_SIZE / size_of::<i32>();

/// Maximum number of blocks a single inode can reference (direct + indirect).
pub const INODE_BLOCK_COUNT: usize = INODE_DIRECT_BLOCK_SIZE + INDIRECT_REFS_PER_BLOCK;

/// Maximum size, in bytes, of a file.
pub const MAX_FILE_SIZE: usize = INODE_BLOCK_COUNT * BLOCK_SIZE;

/// Maximum length (including the NUL terminator) of a file name.
pub const MAX_FILE_NAME: usize = 40;

/// Number of directory entry slots in the (single, flat) root directory.
pub const MAX_DIR_ENTRIES: usize = BLOCK_SIZE / DIR_ENTRY_SIZE;

/// On-the-wire size of one directory entry (`inumber: i32` + fixed name).
const DIR_ENTRY_SIZE: usize = size_of::<i32>() + MAX_FILE_NAME;

/// Length, in bytes, of fixed-width string fields on the wire (client pipe
/// paths, file names).
pub const PIPE_STRING_LENGTH: usize = 40;

/// Maximum number of concurrently mounted sessions (and therefore worker
/// threads).
pub const SIMULTANEOUS_CONNECTIONS: usize = 50;

/// Upper bound on a single atomic pipe write, matching `PIPE_BUF`.
pub const PIPE_BUFFER_MAX_LEN: usize = libc::PIPE_BUF;

/// Number of busy-loop iterations used to emulate a storage access latency.
/// Not a correctness knob: the implementation must not let the optimizer
/// remove this delay (see `tfs_fs::delay::insert_delay`).
pub const DELAY: usize = 5000;
