// src/bin/cli.rs
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::{error, info, warn};

use bdg_predict::cli::{ConsoleProgress, PredictArgs, print_summary, wait_for_enter};
use bdg_predict::monitor::ThreadSleeper;
use bdg_predict::session::AnySession;
use bdg_predict::{log, pipeline, report};

/// Raise `cancel` on Ctrl-C. The listener lives on its own thread with a
/// single-threaded runtime; the monitor loop never touches async code.
fn watch_ctrl_c(cancel: Arc<AtomicBool>) {
    thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(e) => {
                warn!("Ctrl-C handler unavailable: {e}");
                return;
            }
        };
        rt.block_on(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Monitoring stopped by user");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    });
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = PredictArgs::parse();
    let cfg = args.config().wrap_err("loading configuration")?;

    cfg.paths.ensure_dirs().map_err(|e| eyre!("creating data directories: {e}"))?;
    let _guard = log::init(&cfg.paths.logs_dir, None).map_err(|e| eyre!("starting logging: {e}"))?;
    info!("Starting BDG prediction system v{}", env!("CARGO_PKG_VERSION"));

    let cancel = Arc::new(AtomicBool::new(false));
    watch_ctrl_c(cancel.clone());

    let session = match AnySession::from_options(&cfg.session) {
        Ok(s) => s,
        Err(e) => {
            report::capture_fatal::<AnySession>(None, &cfg.paths, "Session setup failed", &e);
            std::process::exit(1);
        }
    };

    let no_wait = args.no_wait;
    let confirm = move || no_wait || wait_for_enter("Login confirmed. Press ENTER to start monitoring...");

    let mut progress = ConsoleProgress;
    match pipeline::run(session, &cfg, ThreadSleeper::default(), cancel, &mut progress, confirm) {
        Ok(run) => {
            println!(
                "Initial records: {}, model accuracy {:.2}%",
                run.initial_records,
                run.training.accuracy * 100.0
            );
            print_summary(&run.monitor);
            info!("System shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("System error: {e}");
            eprintln!("System error: {e}");
            std::process::exit(1);
        }
    }
}
