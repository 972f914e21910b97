// src/pipeline.rs
// login → initial collection → training → first prediction → monitor.
// Anything failing before the monitor starts is fatal.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::data::{OutcomeRecord, Prediction};
use crate::error::SetupError;
use crate::model::{self, TrainReport};
use crate::monitor::{Monitor, Sleeper, Summary};
use crate::predict::Predictor;
use crate::progress::Progress;
use crate::report;
use crate::scrape::Extractor;
use crate::session::Session;
use crate::store::HistoryStore;

/// What a full run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub initial_records: usize,
    pub training: TrainReport,
    /// Logged for the newest collected record, so the first monitored record
    /// has something to be verified against.
    pub initial_prediction: Option<Prediction>,
    pub monitor: Summary,
}

/// Poll until at least `min_initial_records` unique records were seen or the
/// attempts run out. Returns the unique records, page order, first sighting kept.
pub fn collect_initial<S: Session, Z: Sleeper>(
    session: &mut S,
    cfg: &AppConfig,
    sleeper: &mut Z,
    cancel: &AtomicBool,
    progress: &mut dyn Progress,
) -> Result<Vec<OutcomeRecord>, SetupError> {
    let opts = &cfg.monitor;
    let extractor = Extractor::new(cfg.extract.clone());
    let timeout = cfg.session.render_timeout();

    let mut seen: HashSet<String> = HashSet::new();
    let mut collected: Vec<OutcomeRecord> = Vec::new();

    for attempt in 1..=opts.initial_attempts {
        if cancel.load(Ordering::Relaxed) {
            return Err(SetupError::Cancelled);
        }
        progress.log(&format!("Attempt {attempt}/{}", opts.initial_attempts));
        match extractor.extract(session, timeout) {
            Ok(batch) => {
                let fetched = batch.len();
                collected.extend(batch.into_iter().filter(|r| seen.insert(r.period_id.clone())));
                info!(attempt, fetched, total = collected.len(), "initial collection");
            }
            Err(e) => warn!(attempt, "collection error: {e}"),
        }
        if collected.len() >= opts.min_initial_records {
            break;
        }
        if attempt < opts.initial_attempts {
            sleeper.sleep(opts.initial_pause(), cancel);
        }
    }

    if collected.is_empty() {
        return Err(SetupError::NoInitialData { attempts: opts.initial_attempts });
    }
    Ok(collected)
}

struct Setup {
    initial_records: usize,
    training: TrainReport,
    prediction: Option<Prediction>,
}

fn setup<S: Session, Z: Sleeper>(
    session: &mut S,
    cfg: &AppConfig,
    sleeper: &mut Z,
    cancel: &AtomicBool,
    progress: &mut dyn Progress,
) -> Result<Setup, (&'static str, SetupError)> {
    session.login().map_err(|e| ("Login failed", SetupError::Login(e)))?;
    progress.log("Session ready");

    const COLLECT: &str = "Initial data collection failed";
    const TRAIN: &str = "Initial model training failed";

    let initial = collect_initial(session, cfg, sleeper, cancel, progress).map_err(|e| (COLLECT, e))?;
    let mut store = HistoryStore::open(&cfg.paths).map_err(|e| (COLLECT, SetupError::from(e)))?;
    let added = store.append_if_new(&initial).map_err(|e| (COLLECT, SetupError::from(e)))?;
    info!(collected = initial.len(), added = added.len(), total = store.len(), "initial data saved");
    progress.new_records(&added);

    progress.log("Training initial model...");
    let history = store.load_records().map_err(|e| (TRAIN, SetupError::from(e)))?;
    let training = model::train(&history, &cfg.paths, &cfg.train).map_err(|e| (TRAIN, SetupError::from(e)))?;
    progress.trained(training.accuracy, training.mse);

    let prediction = match Predictor::load(&cfg.paths).and_then(|p| p.predict_history(&history)) {
        Ok(p) => {
            progress.predicted(&p);
            Some(p)
        }
        Err(e) => {
            warn!("no initial prediction: {e}");
            None
        }
    };

    Ok(Setup { initial_records: initial.len(), training, prediction })
}

/// Run everything. `confirm` gates the start of monitoring (the interactive
/// "press ENTER"); returning false stops cleanly after setup.
pub fn run<S: Session, Z: Sleeper>(
    mut session: S,
    cfg: &AppConfig,
    mut sleeper: Z,
    cancel: Arc<AtomicBool>,
    progress: &mut dyn Progress,
    confirm: impl FnOnce() -> bool,
) -> Result<RunSummary, SetupError> {
    let Setup { initial_records, training, prediction } = match setup(&mut session, cfg, &mut sleeper, &cancel, progress) {
        Ok(v) => v,
        Err((context, e)) => {
            report::capture_fatal(Some(&mut session), &cfg.paths, context, &e);
            return Err(e);
        }
    };

    if !confirm() || cancel.load(Ordering::Relaxed) {
        info!("monitoring not started");
        return Ok(RunSummary {
            initial_records,
            training,
            initial_prediction: prediction,
            monitor: Summary::default(),
        });
    }

    let mut monitor = Monitor::new(session, cfg, sleeper, cancel)?;
    let summary = monitor.run(progress);
    Ok(RunSummary { initial_records, training, initial_prediction: prediction, monitor: summary })
}
