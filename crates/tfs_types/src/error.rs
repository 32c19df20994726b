use std::io;

/// Error taxonomy shared by the FS engine, the wire codec and the server.
///
/// FS-engine operations never panic or abort the process on these; they are
/// surfaced as ordinary `Result::Err` values and mapped, by the caller, onto
/// the reply's status integer (see `tfs_wire`).
#[derive(Debug, thiserror::Error)]
pub enum TfsError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(&'static str),

    #[error("not found")]
    NotFound,

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("shutting down")]
    ShuttingDown,
}

impl TfsError {
    /// The sentinel status value the wire protocol uses to report this
    /// error to a client (always `-1`; the taxonomy only matters for logs).
    #[must_use]
    pub const fn wire_status(&self) -> i32 {
        -1
    }
}
