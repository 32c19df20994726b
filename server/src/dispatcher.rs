//! The main thread's read loop: parses the ingress stream and either
//! handles MOUNT synchronously or hands the request off to the owning
//! session's worker.

use std::fs::File;
use std::path::Path;

use tfs_types::{Opcode, TfsError};
use tfs_wire::Request;

use crate::pool::WorkerPool;

/// Runs until a fatal I/O error on the ingress pipe. `SHUTDOWN_AFTER_ALL_CLOSED`
/// terminates the whole process from the worker thread that handles it, so
/// this loop never returns on the happy path.
pub fn run(ingress_path: &Path, pool: &WorkerPool) -> Result<(), TfsError> {
    loop {
        let mut ingress = tfs_ipc::open_read(ingress_path)?;
        log::debug!("ingress pipe opened");

        loop {
            let opcode = match tfs_wire::read_opcode(&mut ingress)? {
                Some(op) => op,
                None => break,
            };

            if opcode == Opcode::Mount {
                handle_mount(&mut ingress, pool)?;
                continue;
            }

            let session_id = tfs_wire::read_session_id(&mut ingress)?;
            if !pool.is_mounted(session_id) {
                log::warn!("request for unmounted session {session_id}, ignoring");
                continue;
            }
            let request = tfs_wire::read_body(&mut ingress, opcode, Some(session_id))?;
            pool.dispatch(session_id, request)?;
        }

        log::debug!("all writers disconnected, reopening ingress pipe");
    }
}

/// MOUNT is a handshake, not a posted request: the dispatcher itself picks
/// a free worker, opens the client's egress pipe, and replies with the new
/// session id (or `-1` if no worker is free or the pipe can't be opened).
fn handle_mount(ingress: &mut File, pool: &WorkerPool) -> Result<(), TfsError> {
    let Request::Mount { client_pipe_path } = tfs_wire::read_body(ingress, Opcode::Mount, None)?
    else {
        unreachable!("read_body(Opcode::Mount, ..) always yields Request::Mount")
    };

    let session_id = pool.acquire();
    let egress = tfs_ipc::open_write(Path::new(&client_pipe_path));

    let (status, mut egress) = match (session_id, egress) {
        (Some(id), Ok(file)) => (id.value() as i32, Some(file)),
        (Some(id), Err(e)) => {
            log::warn!("mount refused: could not open client pipe {client_pipe_path}: {e}");
            pool.release(id);
            (-1, None)
        }
        (None, Ok(file)) => {
            log::warn!("mount refused: no free session slots");
            (-1, Some(file))
        }
        (None, Err(_)) => (-1, None),
    };

    if let Some(file) = egress.as_mut() {
        if let Err(e) = tfs_wire::write_status(file, status) {
            log::warn!("failed to reply to mount request: {e}");
            if status >= 0 {
                pool.release(session_id.expect("status>=0 implies a session was acquired"));
            }
            return Ok(());
        }
    }

    if status >= 0 {
        let id = session_id.expect("status>=0 implies a session was acquired");
        *pool.worker(id).unwrap().egress.lock().unwrap() = egress;
        log::info!("session {id} mounted");
    }

    Ok(())
}
