use std::path::PathBuf;

use clap::Parser;

/// The TecnicoFS server: a single-process, multi-threaded, in-memory
/// filesystem spoken to over a named pipe.
#[derive(Debug, Parser)]
#[command(name = "tfs_server", version, about)]
pub struct Cli {
    /// Pathname of the server's ingress FIFO, created (and removed on
    /// shutdown) at this path.
    pub pipename: PathBuf,

    /// Raise logging verbosity (info -> debug -> trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
