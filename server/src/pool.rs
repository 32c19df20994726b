//! The fixed pool of session workers: one long-lived thread per slot,
//! parked on a condition variable until the dispatcher hands it a request.

use std::fs::File;
use std::sync::{Arc, Condvar, Mutex};

use tfs_types::{SessionId, TfsError, SIMULTANEOUS_CONNECTIONS};
use tfs_wire::Request;

struct Mailbox {
    to_execute: bool,
    request: Option<Request>,
}

/// One worker's private state: its mailbox, the client's egress pipe while
/// a session is mounted on it, and the condvar the dispatcher signals.
pub struct Worker {
    pub session_id: SessionId,
    mailbox: Mutex<Mailbox>,
    cond: Condvar,
    pub egress: Mutex<Option<File>>,
}

impl Worker {
    fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            mailbox: Mutex::new(Mailbox { to_execute: false, request: None }),
            cond: Condvar::new(),
            egress: Mutex::new(None),
        }
    }

    /// Blocks until the dispatcher posts a request, then takes it.
    pub fn wait_for_request(&self) -> Request {
        let mut mailbox = self.mailbox.lock().unwrap();
        mailbox = self
            .cond
            .wait_while(mailbox, |m| !m.to_execute)
            .unwrap();
        mailbox.to_execute = false;
        mailbox
            .request
            .take()
            .expect("to_execute implies a posted request")
    }

    fn post(&self, request: Request) {
        let mut mailbox = self.mailbox.lock().unwrap();
        mailbox.request = Some(request);
        mailbox.to_execute = true;
        self.cond.notify_one();
    }
}

/// Owns the fixed-size worker table and the free/taken bitmap that
/// `MOUNT`/`UNMOUNT` flip.
pub struct WorkerPool {
    workers: Vec<Arc<Worker>>,
    taken: Mutex<Vec<bool>>,
}

impl WorkerPool {
    pub fn new() -> Self {
        let workers = (0..SIMULTANEOUS_CONNECTIONS)
            .map(|i| Arc::new(Worker::new(SessionId::new(i as u32))))
            .collect();
        Self {
            workers,
            taken: Mutex::new(vec![false; SIMULTANEOUS_CONNECTIONS]),
        }
    }

    pub fn worker(&self, session_id: SessionId) -> Option<&Arc<Worker>> {
        self.workers.get(session_id.as_index())
    }

    pub fn all_workers(&self) -> &[Arc<Worker>] {
        &self.workers
    }

    /// Claims the first free slot.
    pub fn acquire(&self) -> Option<SessionId> {
        let mut taken = self.taken.lock().unwrap();
        let idx = taken.iter().position(|&t| !t)?;
        taken[idx] = true;
        Some(SessionId::new(idx as u32))
    }

    /// Returns a slot to the free pool.
    pub fn release(&self, session_id: SessionId) {
        let mut taken = self.taken.lock().unwrap();
        if let Some(slot) = taken.get_mut(session_id.as_index()) {
            *slot = false;
        }
    }

    /// `true` iff `session_id` is in range and currently mounted.
    pub fn is_mounted(&self, session_id: SessionId) -> bool {
        self.taken
            .lock()
            .unwrap()
            .get(session_id.as_index())
            .copied()
            .unwrap_or(false)
    }

    /// Hands `request` to the owning session's worker.
    pub fn dispatch(&self, session_id: SessionId, request: Request) -> Result<(), TfsError> {
        let worker = self
            .worker(session_id)
            .ok_or(TfsError::InvalidArgument("session id out of range"))?;
        worker.post(request);
        Ok(())
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}
