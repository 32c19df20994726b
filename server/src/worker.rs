//! Per-session worker loop: dispatches a posted request to the matching
//! FS-engine call and writes the reply to the session's egress pipe.

use std::path::Path;
use std::sync::Arc;

use tfs_fs::Fs;
use tfs_wire::Request;

use crate::pool::{Worker, WorkerPool};

/// Runs forever on a dedicated thread, one per pool slot.
pub fn run(worker: Arc<Worker>, fs: Arc<Fs>, pool: Arc<WorkerPool>, ingress_path: Arc<Path>) {
    loop {
        let request = worker.wait_for_request();
        handle(&worker, &fs, &pool, &ingress_path, request);
    }
}

fn handle(worker: &Worker, fs: &Fs, pool: &WorkerPool, ingress_path: &Path, request: Request) {
    match request {
        Request::Mount { .. } => {
            debug_assert!(false, "MOUNT is handled synchronously by the dispatcher");
        }
        Request::Unmount { session_id } => {
            reply_status(worker, pool, 0);
            *worker.egress.lock().unwrap() = None;
            pool.release(session_id);
            log::info!("session {session_id} unmounted");
        }
        Request::Open { name, flags, .. } => match fs.open(&name, flags) {
            Ok(handle) => reply_status(worker, pool, handle.value() as i32),
            Err(e) => {
                log::warn!("open {name:?} failed: {e}");
                reply_status(worker, pool, -1);
            }
        },
        Request::Close { handle, .. } => match fs.close(handle) {
            Ok(()) => reply_status(worker, pool, 0),
            Err(e) => {
                log::warn!("close {handle} failed: {e}");
                reply_status(worker, pool, -1);
            }
        },
        Request::Write { handle, data, .. } => match fs.write(handle, &data) {
            Ok(n) => reply_status(worker, pool, n as i32),
            Err(e) => {
                log::warn!("write to {handle} failed: {e}");
                reply_status(worker, pool, -1);
            }
        },
        Request::Read { handle, len, .. } => match fs.read(handle, len) {
            Ok(data) => reply_read(worker, pool, &data),
            Err(e) => {
                log::warn!("read from {handle} failed: {e}");
                reply_status(worker, pool, -1);
            }
        },
        Request::ShutdownAfterAllClosed { session_id } => {
            log::info!("session {session_id} requested shutdown; draining open handles");
            match fs.destroy_after_all_closed() {
                Ok(()) => {
                    reply_status(worker, pool, 0);
                    let _ = tfs_ipc::unlink(ingress_path);
                    log::info!("shutdown complete, exiting");
                    std::process::exit(0);
                }
                Err(e) => {
                    log::error!("shutdown failed: {e}");
                    reply_status(worker, pool, -1);
                }
            }
        }
    }
}

/// Writes a status reply; a broken pipe discards the session and returns
/// its slot to the pool, the same cleanup the `Unmount` arm performs.
fn reply_status(worker: &Worker, pool: &WorkerPool, status: i32) {
    let mut egress = worker.egress.lock().unwrap();
    if let Some(file) = egress.as_mut() {
        if let Err(e) = tfs_wire::write_status(file, status) {
            log::warn!("session {} dropped: {e}", worker.session_id);
            *egress = None;
            pool.release(worker.session_id);
        }
    }
}

fn reply_read(worker: &Worker, pool: &WorkerPool, data: &[u8]) {
    let mut egress = worker.egress.lock().unwrap();
    if let Some(file) = egress.as_mut() {
        if let Err(e) = tfs_wire::write_read_reply(file, data) {
            log::warn!("session {} dropped: {e}", worker.session_id);
            *egress = None;
            pool.release(worker.session_id);
        }
    }
}
