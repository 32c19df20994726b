//! Named-pipe transport primitives shared by the wire codec and the
//! session server: FIFO lifecycle management and EINTR-tolerant I/O.

mod fifo;
mod retry;

pub use fifo::{create, open_read, open_write, unlink};
pub use retry::{read_exact_retrying, write_all_retrying};
