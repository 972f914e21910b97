// src/report.rs
// Best-effort diagnostics: page captures and logs/error_log.txt.

use std::error::Error;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{error, warn};

use crate::config::Paths;
use crate::data::{format_ts, now};
use crate::session::Session;

pub const FATAL_CAPTURE: &str = "system_error.html";
pub const SCRAPE_CAPTURE: &str = "scrape_error.html";

/// `err` followed by every `source()` in its chain, one per line.
pub fn error_chain(err: &dyn Error) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(e) = cur {
        out.push_str("\n  caused by: ");
        out.push_str(&e.to_string());
        cur = e.source();
    }
    out
}

/// Append one entry to the error log.
pub fn log_error(error_log: &Path, context: &str, err: &dyn Error) {
    let entry = format!("[{}] {context}: {}\n", format_ts(&now()), error_chain(err));
    let res = crate::file::ensure_directory(error_log.parent().unwrap_or(Path::new(".")))
        .map_err(|e| e.to_string())
        .and_then(|_| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(error_log)
                .and_then(|mut f| f.write_all(entry.as_bytes()))
                .map_err(|e| e.to_string())
        });
    if let Err(e) = res {
        warn!(path = %error_log.display(), "could not write error log: {e}");
    }
}

/// Save the session's current page under `logs/<name>`. Returns where it went.
pub fn capture_page<S: Session>(session: &mut S, paths: &Paths, name: &str) -> Option<PathBuf> {
    let path = paths.logs_dir.join(name);
    if let Err(e) = crate::file::ensure_directory(&paths.logs_dir) {
        warn!("could not create logs dir: {e}");
        return None;
    }
    match session.capture(&path) {
        Ok(()) => Some(path),
        Err(e) => {
            warn!(path = %path.display(), "page capture failed: {e}");
            None
        }
    }
}

/// Setup fault: capture the page (when a session exists) and log the error.
pub fn capture_fatal<S: Session>(session: Option<&mut S>, paths: &Paths, context: &str, err: &dyn Error) {
    error!("{context}: {}", error_chain(err));
    if let Some(s) = session {
        if let Some(p) = capture_page(s, paths, FATAL_CAPTURE) {
            error!("page captured to {}", p.display());
        }
    }
    log_error(&paths.error_log(), context, err);
}
