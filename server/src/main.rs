mod cli;
mod dispatcher;
mod pool;
mod signals;
mod worker;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tfs_fs::Fs;

use crate::cli::Cli;
use crate::pool::WorkerPool;

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .init();

    signals::install(cli.pipename.clone());

    let fs = match Fs::init() {
        Ok(fs) => Arc::new(fs),
        Err(e) => {
            log::error!("failed to initialize filesystem: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = tfs_ipc::create(&cli.pipename) {
        log::error!("failed to create ingress pipe {}: {e}", cli.pipename.display());
        return ExitCode::FAILURE;
    }
    log::info!("starting TecnicoFS server with pipe {}", cli.pipename.display());

    let pool = Arc::new(WorkerPool::new());
    let ingress_path: Arc<std::path::Path> = Arc::from(cli.pipename.as_path());

    for w in pool.all_workers() {
        let w = Arc::clone(w);
        let fs = Arc::clone(&fs);
        let pool = Arc::clone(&pool);
        let ingress_path = Arc::clone(&ingress_path);
        std::thread::spawn(move || worker::run(w, fs, pool, ingress_path));
    }

    match dispatcher::run(&cli.pipename, &pool) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("fatal I/O error on ingress pipe: {e}");
            let _ = tfs_ipc::unlink(&cli.pipename);
            ExitCode::FAILURE
        }
    }
}
