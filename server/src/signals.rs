//! Signal handling: `SIGPIPE` is ignored so a dead client never kills the
//! server, and `SIGINT` triggers an orderly shutdown (unlink the ingress
//! FIFO, exit).

use std::path::PathBuf;
use std::sync::OnceLock;

use nix::sys::signal::{self, SigHandler, Signal};

static INGRESS_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Installs both handlers. Must be called once at startup, before the
/// ingress FIFO is created, so `SIGINT` always has a path to clean up.
pub fn install(ingress_path: PathBuf) {
    let _ = INGRESS_PATH.set(ingress_path);
    // SAFETY: both handlers only touch async-signal-safe state (an
    // already-initialized `OnceLock` and libc's `unlink`/`_exit`).
    unsafe {
        signal::signal(Signal::SIGPIPE, SigHandler::SigIgn).expect("failed to ignore SIGPIPE");
        signal::signal(Signal::SIGINT, SigHandler::Handler(on_sigint))
            .expect("failed to install SIGINT handler");
    }
}

extern "C" fn on_sigint(_: i32) {
    if let Some(path) = INGRESS_PATH.get() {
        if let Some(c_path) = path.to_str().and_then(|s| std::ffi::CString::new(s).ok()) {
            unsafe {
                libc::unlink(c_path.as_ptr());
            }
        }
    }
    unsafe {
        libc::_exit(0);
    }
}
