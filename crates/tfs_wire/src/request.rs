//! Request framing: one opcode byte followed by opcode-specific fields.

use std::io::Read;

use tfs_types::{Handle, OpenFlags, Opcode, SessionId, TfsError, PIPE_BUFFER_MAX_LEN};

use crate::ints::{read_i32, read_u64};
use crate::strings::read_fixed_string;

#[derive(Debug)]
pub enum Request {
    Mount { client_pipe_path: String },
    Unmount { session_id: SessionId },
    Open { session_id: SessionId, name: String, flags: OpenFlags },
    Close { session_id: SessionId, handle: Handle },
    Write { session_id: SessionId, handle: Handle, data: Vec<u8> },
    Read { session_id: SessionId, handle: Handle, len: usize },
    ShutdownAfterAllClosed { session_id: SessionId },
}

/// Reads the leading opcode byte. `Ok(None)` signals a clean end of the
/// ingress stream (the last writer has gone away).
pub fn read_opcode<R: Read>(reader: &mut R) -> Result<Option<Opcode>, TfsError> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => {
                return Opcode::from_repr(byte[0])
                    .map(Some)
                    .ok_or(TfsError::InvalidArgument("unrecognized opcode byte"))
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(TfsError::Io(e)),
        }
    }
}

/// Reads the session id every non-MOUNT request carries immediately after
/// its opcode.
pub fn read_session_id<R: Read>(reader: &mut R) -> Result<SessionId, TfsError> {
    Ok(SessionId::new(read_i32(reader)? as u32))
}

/// Reads the remainder of the request body for `opcode`, given that the
/// opcode byte (and, for anything but MOUNT, the session id) has already
/// been consumed by the dispatcher.
pub fn read_body<R: Read>(
    reader: &mut R,
    opcode: Opcode,
    session_id: Option<SessionId>,
) -> Result<Request, TfsError> {
    Ok(match opcode {
        Opcode::Mount => Request::Mount {
            client_pipe_path: read_fixed_string(reader)?,
        },
        Opcode::Unmount => Request::Unmount {
            session_id: session_id.expect("unmount always carries a session id"),
        },
        Opcode::Open => {
            let name = read_fixed_string(reader)?;
            let flags = OpenFlags::from_bits_truncate(read_i32(reader)?);
            Request::Open {
                session_id: session_id.expect("open always carries a session id"),
                name,
                flags,
            }
        }
        Opcode::Close => Request::Close {
            session_id: session_id.expect("close always carries a session id"),
            handle: Handle::new(read_i32(reader)? as u32),
        },
        Opcode::Write => {
            let handle = Handle::new(read_i32(reader)? as u32);
            let len = read_u64(reader)? as usize;
            if len > PIPE_BUFFER_MAX_LEN {
                return Err(TfsError::ResourceExhausted(
                    "write payload exceeds PIPE_BUFFER_MAX_LEN",
                ));
            }
            let mut data = vec![0u8; len];
            tfs_ipc::read_exact_retrying(reader, &mut data)?;
            Request::Write {
                session_id: session_id.expect("write always carries a session id"),
                handle,
                data,
            }
        }
        Opcode::Read => {
            let handle = Handle::new(read_i32(reader)? as u32);
            let len = read_u64(reader)? as usize;
            Request::Read {
                session_id: session_id.expect("read always carries a session id"),
                handle,
                len,
            }
        }
        Opcode::ShutdownAfterAllClosed => Request::ShutdownAfterAllClosed {
            session_id: session_id.expect("shutdown always carries a session id"),
        },
    })
}
