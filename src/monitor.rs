// src/monitor.rs
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::config::{AppConfig, MonitorOptions, Paths, TrainOptions};
use crate::config::consts::SLEEP_SLICE_MS;
use crate::data::OutcomeRecord;
use crate::error::StoreError;
use crate::model;
use crate::predict::Predictor;
use crate::progress::Progress;
use crate::report::{self, SCRAPE_CAPTURE};
use crate::scrape::Extractor;
use crate::session::Session;
use crate::store::verification::Tally;
use crate::store::{HistoryStore, PredictionLog, VerificationLog};
use crate::verify::Verifier;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Idle,
    Polling,
    Diffing,
    Persisting,
    Verifying,
    Sleeping,
}

/* ---------------- Sleeping ---------------- */

/// Every pause in the loop goes through this, so tests never wait.
pub trait Sleeper {
    /// Sleep up to `d`, returning early once `cancel` is raised.
    fn sleep(&mut self, d: Duration, cancel: &AtomicBool);
}

/// Real sleeps, in short slices so Ctrl-C is noticed quickly.
pub struct ThreadSleeper {
    pub slice: Duration,
}

impl Default for ThreadSleeper {
    fn default() -> Self {
        Self { slice: Duration::from_millis(SLEEP_SLICE_MS) }
    }
}

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, d: Duration, cancel: &AtomicBool) {
        let deadline = Instant::now() + d;
        while !cancel.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(self.slice));
        }
    }
}

/// Never sleeps; remembers what was asked for.
#[derive(Debug, Default)]
pub struct NoSleep {
    pub requested: Vec<Duration>,
}

impl Sleeper for NoSleep {
    fn sleep(&mut self, d: Duration, _cancel: &AtomicBool) {
        self.requested.push(d);
    }
}

/* ---------------- Retry ---------------- */

#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Consecutive empty/failed cycles before a forced reload.
    pub max_retries: u32,
    pub backoff: Duration,
    pub settle: Duration,
}

impl RetryPolicy {
    pub fn from_options(opts: &MonitorOptions) -> Self {
        Self {
            max_retries: opts.max_retries.max(1),
            backoff: opts.backoff(),
            settle: opts.reload_settle(),
        }
    }

    /// After `failures` consecutive misses: reload now?
    pub fn exhausted(&self, failures: u32) -> bool {
        failures >= self.max_retries
    }
}

/* ---------------- Loop ---------------- */

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// New records were persisted.
    New(usize),
    /// Rows came back, all already known.
    NoChange,
    /// The page yielded no usable rows.
    Empty,
    /// Extraction or persistence failed.
    Failed,
    Cancelled,
}

/// Counters for the whole run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub cycles: u64,
    pub new_records: usize,
    pub verified: usize,
    pub correct: usize,
    pub predictions: usize,
    pub trainings: usize,
    pub reloads: usize,
    /// Whole verification trail, read back at shutdown.
    pub all_time: Tally,
}

pub struct Monitor<S: Session, Z: Sleeper> {
    session: S,
    store: HistoryStore,
    extractor: Extractor,
    verifier: Verifier,
    predictions: PredictionLog,
    predictor: Option<Predictor>,
    paths: Paths,
    opts: MonitorOptions,
    train_opts: TrainOptions,
    render_timeout: Duration,
    retry: RetryPolicy,
    sleeper: Z,
    cancel: Arc<AtomicBool>,
    state: State,
    failures: u32,
    since_train: usize,
    summary: Summary,
}

impl<S: Session, Z: Sleeper> Monitor<S, Z> {
    pub fn new(session: S, cfg: &AppConfig, sleeper: Z, cancel: Arc<AtomicBool>) -> Result<Self, StoreError> {
        let store = HistoryStore::open(&cfg.paths)?;
        let predictor = Predictor::load(&cfg.paths)
            .map_err(|e| warn!("monitoring without a predictor for now: {e}"))
            .ok();
        Ok(Self {
            session,
            store,
            extractor: Extractor::new(cfg.extract.clone()),
            verifier: Verifier::new(VerificationLog::new(cfg.paths.verification())),
            predictions: PredictionLog::new(cfg.paths.prediction_log()),
            predictor,
            paths: cfg.paths.clone(),
            opts: cfg.monitor.clone(),
            train_opts: cfg.train.clone(),
            render_timeout: cfg.session.render_timeout(),
            retry: RetryPolicy::from_options(&cfg.monitor),
            sleeper,
            cancel,
            state: State::Idle,
            failures: 0,
            since_train: 0,
            summary: Summary::default(),
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    pub fn sleeper(&self) -> &Z {
        &self.sleeper
    }

    pub fn into_session(self) -> S {
        self.session
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    fn enter(&mut self, state: State, progress: &mut dyn Progress) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "monitor state");
            self.state = state;
            progress.state(state);
        }
    }

    fn pause(&mut self, d: Duration, progress: &mut dyn Progress) {
        self.enter(State::Sleeping, progress);
        self.sleeper.sleep(d, &self.cancel);
    }

    fn reload(&mut self, progress: &mut dyn Progress) {
        match self.session.reload() {
            Ok(()) => {
                self.summary.reloads += 1;
                debug!("page reloaded");
            }
            Err(e) => warn!("reload failed: {e}"),
        }
        let settle = self.retry.settle;
        self.pause(settle, progress);
    }

    /// Run until cancelled or `max_cycles` is reached.
    pub fn run(&mut self, progress: &mut dyn Progress) -> Summary {
        info!(
            interval = ?self.opts.interval(),
            known = self.store.len(),
            "Starting monitoring"
        );
        progress.log(&format!("Monitoring every {}s", self.opts.interval_secs));

        while !self.cancelled() {
            if self.opts.max_cycles > 0 && self.summary.cycles >= self.opts.max_cycles {
                break;
            }
            self.summary.cycles += 1;
            progress.cycle(self.summary.cycles);

            let outcome = self.cycle(progress);
            if outcome == CycleOutcome::Cancelled || self.cancelled() {
                break;
            }
            let last = self.opts.max_cycles > 0 && self.summary.cycles >= self.opts.max_cycles;

            match outcome {
                CycleOutcome::Empty | CycleOutcome::Failed => {
                    self.failures += 1;
                    progress.retry(self.failures, self.retry.max_retries);
                    if self.retry.exhausted(self.failures) {
                        warn!(failures = self.failures, "max retries reached, reloading");
                        self.failures = 0;
                        self.reload(progress);
                    } else if !last {
                        let backoff = self.retry.backoff;
                        self.pause(backoff, progress);
                    }
                }
                _ => {
                    self.failures = 0;
                    if !last {
                        let interval = self.opts.interval();
                        self.pause(interval, progress);
                    }
                }
            }
        }

        self.shutdown();
        self.enter(State::Idle, progress);
        progress.finish();
        self.summary.clone()
    }

    /// One poll. Never fails; see [`CycleOutcome`].
    pub fn cycle(&mut self, progress: &mut dyn Progress) -> CycleOutcome {
        if self.cancelled() {
            return CycleOutcome::Cancelled;
        }
        self.enter(State::Polling, progress);

        let n = self.summary.cycles;
        if self.opts.refresh_every > 0 && n > 0 && n % self.opts.refresh_every as u64 == 0 {
            debug!(cycle = n, "scheduled reload");
            self.reload(progress);
            if self.cancelled() {
                return CycleOutcome::Cancelled;
            }
            self.enter(State::Polling, progress);
        }

        let records = match self.extractor.extract(&mut self.session, self.render_timeout) {
            Ok(r) => r,
            Err(e) => {
                warn!("no data this cycle: {e}");
                report::capture_page(&mut self.session, &self.paths, SCRAPE_CAPTURE);
                return CycleOutcome::Failed;
            }
        };
        if records.is_empty() {
            info!("No data scraped, retrying...");
            return CycleOutcome::Empty;
        }

        if self.cancelled() {
            return CycleOutcome::Cancelled;
        }
        self.enter(State::Diffing, progress);
        let candidates: Vec<OutcomeRecord> = records
            .into_iter()
            .filter(|r| !self.store.contains(&r.period_id))
            .collect();
        if candidates.is_empty() {
            info!("No new results");
            return CycleOutcome::NoChange;
        }

        self.enter(State::Persisting, progress);
        let added = match self.store.append_if_new(&candidates) {
            Ok(a) => a,
            Err(e) => {
                error!("could not persist new results: {e}");
                return CycleOutcome::Failed;
            }
        };
        self.summary.new_records += added.len();
        for r in &added {
            info!(period = %r.period_id, number = r.number, size = %r.size, color = %r.color, "new result");
        }
        progress.new_records(&added);

        self.enter(State::Verifying, progress);
        self.verify_batch(&added, progress);

        self.since_train += added.len();
        self.after_batch(progress);
        CycleOutcome::New(added.len())
    }

    fn verify_batch(&mut self, added: &[OutcomeRecord], progress: &mut dyn Progress) {
        let last = match self.predictions.last() {
            Ok(p) => p,
            Err(e) => {
                warn!("prediction log unreadable: {e}");
                None
            }
        };
        let Some(prediction) = last else {
            debug!(records = added.len(), "no prediction yet; nothing to verify");
            return;
        };
        for rec in added {
            match self.verifier.record(&prediction, rec) {
                Ok(v) => {
                    self.summary.verified += 1;
                    if v.is_correct {
                        self.summary.correct += 1;
                    }
                    progress.verified(&v);
                }
                Err(e) => error!(period = %rec.period_id, "could not save verification: {e}"),
            }
        }
    }

    /// Retrain when enough new records piled up, then predict the next period.
    fn after_batch(&mut self, progress: &mut dyn Progress) {
        let history = match self.store.load_records() {
            Ok(h) => h,
            Err(e) => {
                error!("could not reload history: {e}");
                return;
            }
        };

        if self.opts.retrain_every > 0 && self.since_train >= self.opts.retrain_every {
            match model::train(&history, &self.paths, &self.train_opts) {
                Ok(report) => {
                    self.since_train = 0;
                    self.summary.trainings += 1;
                    progress.trained(report.accuracy, report.mse);
                    self.predictor = None;
                }
                Err(e) => warn!("retraining skipped: {e}"),
            }
        }

        if self.predictor.is_none() {
            self.predictor = Predictor::load(&self.paths).ok();
        }
        let Some(predictor) = &self.predictor else {
            debug!("no usable model; skipping prediction");
            return;
        };
        match predictor.predict_history(&history) {
            Ok(p) => {
                self.summary.predictions += 1;
                progress.predicted(&p);
            }
            Err(e) => warn!("prediction failed: {e}"),
        }
    }

    /// Final persist of the known-period index.
    pub fn shutdown(&mut self) {
        match self.store.persist_known_periods() {
            Ok(()) => info!(known = self.store.len(), "Monitoring stopped; known periods saved"),
            Err(e) => error!("final persist failed: {e}"),
        }
        match self.verifier.tally() {
            Ok(t) => {
                if let Some(acc) = t.accuracy() {
                    info!(checked = t.checked, correct = t.correct, "hit rate {:.2}%", acc * 100.0);
                }
                self.summary.all_time = t;
            }
            Err(e) => warn!("verification trail unreadable: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_policy_counts_to_max() {
        let p = RetryPolicy::from_options(&MonitorOptions::default());
        assert!(!p.exhausted(2));
        assert!(p.exhausted(3));
    }

    #[test]
    fn thread_sleeper_returns_when_cancelled() {
        let cancel = AtomicBool::new(true);
        let t = Instant::now();
        ThreadSleeper::default().sleep(Duration::from_secs(30), &cancel);
        assert!(t.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn no_sleep_records_requests() {
        let mut s = NoSleep::default();
        s.sleep(Duration::from_secs(60), &AtomicBool::new(false));
        assert_eq!(s.requested, vec![Duration::from_secs(60)]);
    }
}
