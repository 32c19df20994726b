//! Named-pipe lifecycle: creation, unlinking, and the blocking opens the
//! session protocol relies on.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use nix::sys::stat::Mode;
use nix::unistd;

use tfs_types::TfsError;

/// Creates a FIFO at `path`, removing a stale one left over from a previous
/// run first. `ENOENT` on the removal is not an error.
pub fn create(path: &Path) -> Result<(), TfsError> {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(TfsError::Io(e)),
    }
    unistd::mkfifo(path, Mode::from_bits_truncate(0o777)).map_err(|errno| {
        TfsError::Io(io::Error::from_raw_os_error(errno as i32))
    })?;
    log::debug!("created FIFO at {}", path.display());
    Ok(())
}

/// Removes the FIFO at `path`, ignoring a missing file.
pub fn unlink(path: &Path) -> Result<(), TfsError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::debug!("removed FIFO at {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(TfsError::Io(e)),
    }
}

/// Opens the ingress FIFO for reading, blocking until a writer dials in.
pub fn open_read(path: &Path) -> Result<File, TfsError> {
    File::open(path).map_err(TfsError::Io)
}

/// Opens a client's egress FIFO for writing, blocking until the client has
/// opened its read end.
pub fn open_write(path: &Path) -> Result<File, TfsError> {
    OpenOptions::new()
        .write(true)
        .custom_flags(0)
        .open(path)
        .map_err(TfsError::Io)
}
