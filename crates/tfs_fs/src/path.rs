//! Pathname validation.
//!
//! TecnicoFS has a single, flat root directory: a path is valid iff it is
//! non-empty, longer than one character, and begins with `/`. The leading
//! slash is stripped before the name reaches the directory module.

use tfs_types::TfsError;

pub fn valid_pathname(name: &str) -> bool {
    name.len() > 1 && name.starts_with('/')
}

/// Strips the leading `/`, failing fast on an invalid path.
pub fn strip_root(name: &str) -> Result<&str, TfsError> {
    if !valid_pathname(name) {
        return Err(TfsError::InvalidArgument("invalid path name"));
    }
    Ok(&name[1..])
}
