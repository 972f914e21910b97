// src/log.rs
use std::error::Error;
use std::fmt;
use std::path::Path;
use std::time::Instant;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt as tfmt};

use crate::config::consts::LOG_FILE_PREFIX;

pub fn fmt_elapsed(ms: u128) -> String {
    let total_ms = ms as u64;
    let h = total_ms / 3_600_000;
    let m = (total_ms % 3_600_000) / 60_000;
    let s = (total_ms % 60_000) / 1_000;
    let ms = total_ms % 1_000;
    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}

/// Uptime stamp for log lines.
#[derive(Clone, Copy, Debug)]
pub struct Elapsed {
    start: Instant,
}

impl Elapsed {
    pub fn now() -> Self {
        Self { start: Instant::now() }
    }
}

impl FormatTime for Elapsed {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "[{}]", fmt_elapsed(self.start.elapsed().as_millis()))
    }
}

/// Install the global subscriber. `filter` overrides `RUST_LOG` (default `info`).
/// Keep the returned guard alive until exit or the file log loses its tail.
pub fn init(logs_dir: &Path, filter: Option<&str>) -> Result<WorkerGuard, Box<dyn Error>> {
    let filter = match filter {
        Some(f) => EnvFilter::try_new(f)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    crate::file::ensure_directory(logs_dir)?;

    let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let timer = Elapsed::now();

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tfmt::layer()
                .with_writer(std::io::stderr)
                .with_timer(timer)
                .with_target(false),
        )
        .with(tfmt::layer().with_writer(writer).with_ansi(false).with_timer(timer))
        .try_init()?;
    Ok(guard)
}
