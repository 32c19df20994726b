//! A minimal test-only client speaking the wire protocol directly against
//! a spawned `tfs_server` process. TecnicoFS has no client library in
//! scope, so integration tests dial the FIFOs themselves.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::time::Duration;

pub const PIPE_STRING_LENGTH: usize = 40;

pub struct Server {
    child: Child,
    pub ingress_path: PathBuf,
}

impl Server {
    pub fn start(dir: &Path) -> Self {
        let ingress_path = dir.join("server.pipe");
        let child = Command::new(env!("CARGO_BIN_EXE_tfs_server"))
            .arg(&ingress_path)
            .spawn()
            .expect("failed to spawn tfs_server");
        // The server creates the FIFO itself; wait for it to appear so the
        // first mount doesn't race startup.
        for _ in 0..200 {
            if ingress_path.exists() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        Self { child, ingress_path }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub struct Client {
    ingress: File,
    reply: Option<File>,
    pub session_id: i32,
    client_pipe_path: PathBuf,
}

fn fixed_name(s: &str) -> [u8; PIPE_STRING_LENGTH] {
    let mut buf = [0u8; PIPE_STRING_LENGTH];
    buf[..s.len()].copy_from_slice(s.as_bytes());
    buf
}

impl Client {
    /// Mounts a fresh session against `server`, returning `None` if the
    /// server refused (session id `-1`).
    pub fn mount(server: &Server, dir: &Path, tag: &str) -> Option<Self> {
        let client_pipe_path = dir.join(format!("client-{tag}.pipe"));
        nix::unistd::mkfifo(&client_pipe_path, nix::sys::stat::Mode::from_bits_truncate(0o777))
            .expect("failed to create client pipe");

        let mut ingress = OpenOptions::new()
            .write(true)
            .open(&server.ingress_path)
            .expect("failed to open server ingress pipe");

        let mut request = vec![1u8]; // Opcode::Mount
        request.extend_from_slice(&fixed_name(client_pipe_path.to_str().unwrap()));
        ingress.write_all(&request).unwrap();

        let mut reply = File::open(&client_pipe_path).expect("failed to open client pipe");
        let session_id = read_i32(&mut reply);

        if session_id < 0 {
            None
        } else {
            Some(Self { ingress, reply: Some(reply), session_id, client_pipe_path })
        }
    }

    pub fn open(&mut self, name: &str, flags: i32) -> i32 {
        let mut request = vec![3u8]; // Opcode::Open
        request.extend_from_slice(&self.session_id.to_ne_bytes());
        request.extend_from_slice(&fixed_name(name));
        request.extend_from_slice(&flags.to_ne_bytes());
        self.ingress.write_all(&request).unwrap();
        read_i32(self.reply.as_mut().expect("reply pipe already dropped"))
    }

    pub fn close(&mut self, handle: i32) -> i32 {
        let mut request = vec![4u8]; // Opcode::Close
        request.extend_from_slice(&self.session_id.to_ne_bytes());
        request.extend_from_slice(&handle.to_ne_bytes());
        self.ingress.write_all(&request).unwrap();
        read_i32(self.reply.as_mut().expect("reply pipe already dropped"))
    }

    pub fn write(&mut self, handle: i32, data: &[u8]) -> i32 {
        let mut request = vec![5u8]; // Opcode::Write
        request.extend_from_slice(&self.session_id.to_ne_bytes());
        request.extend_from_slice(&handle.to_ne_bytes());
        request.extend_from_slice(&(data.len() as u64).to_ne_bytes());
        request.extend_from_slice(data);
        self.ingress.write_all(&request).unwrap();
        read_i32(self.reply.as_mut().expect("reply pipe already dropped"))
    }

    pub fn read(&mut self, handle: i32, len: usize) -> Vec<u8> {
        let mut request = vec![6u8]; // Opcode::Read
        request.extend_from_slice(&self.session_id.to_ne_bytes());
        request.extend_from_slice(&handle.to_ne_bytes());
        request.extend_from_slice(&(len as u64).to_ne_bytes());
        self.ingress.write_all(&request).unwrap();
        let reply = self.reply.as_mut().expect("reply pipe already dropped");
        let n = read_i32(reply);
        if n <= 0 {
            return Vec::new();
        }
        let mut buf = vec![0u8; n as usize];
        reply.read_exact(&mut buf).unwrap();
        buf
    }

    pub fn unmount(mut self) -> i32 {
        let mut request = vec![2u8]; // Opcode::Unmount
        request.extend_from_slice(&self.session_id.to_ne_bytes());
        self.ingress.write_all(&request).unwrap();
        let result = read_i32(self.reply.as_mut().expect("reply pipe already dropped"));
        let _ = std::fs::remove_file(&self.client_pipe_path);
        result
    }

    pub fn shutdown_after_all_closed(&mut self) -> i32 {
        let mut request = vec![7u8]; // Opcode::ShutdownAfterAllClosed
        request.extend_from_slice(&self.session_id.to_ne_bytes());
        self.ingress.write_all(&request).unwrap();
        read_i32(self.reply.as_mut().expect("reply pipe already dropped"))
    }

    /// Closes this client's read end of its reply pipe without unmounting,
    /// simulating a client that vanished mid-session. A request sent
    /// afterward still reaches the server, but any reply write for this
    /// session now hits a closed pipe.
    pub fn drop_reply_pipe(&mut self) {
        self.reply = None;
    }

    /// Sends an OPEN request without waiting for (or expecting) a reply, for
    /// use after `drop_reply_pipe` once no one is listening anymore.
    pub fn send_open_ignoring_reply(&mut self, name: &str, flags: i32) {
        let mut request = vec![3u8]; // Opcode::Open
        request.extend_from_slice(&self.session_id.to_ne_bytes());
        request.extend_from_slice(&fixed_name(name));
        request.extend_from_slice(&flags.to_ne_bytes());
        self.ingress.write_all(&request).unwrap();
    }
}

fn read_i32(reader: &mut File) -> i32 {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).unwrap();
    i32::from_ne_bytes(buf)
}

pub const O_CREAT: i32 = 0b001;
pub const O_TRUNC: i32 = 0b010;
pub const O_APPEND: i32 = 0b100;
