// tests/monitor_loop.rs
mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bdg_predict::config::AppConfig;
use bdg_predict::data::OutcomeRecord;
use bdg_predict::model;
use bdg_predict::monitor::{Monitor, NoSleep, State};
use bdg_predict::predict::Predictor;
use bdg_predict::progress::{NullProgress, Progress};
use bdg_predict::store::{HistoryStore, VerificationLog};

use common::{ScriptedSession, history_page};

fn config(dir: &std::path::Path) -> AppConfig {
    let mut cfg = AppConfig::rooted_at(dir);
    cfg.monitor.retrain_every = 0;
    cfg.paths.ensure_dirs().unwrap();
    cfg
}

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

#[test]
fn new_records_are_persisted_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path());
    cfg.monitor.max_cycles = 3;

    let session = ScriptedSession::new(vec![
        Some(history_page(1, 3)),
        Some(history_page(1, 3)),
        Some(history_page(1, 5)),
    ]);
    let mut m = Monitor::new(session, &cfg, NoSleep::default(), Arc::new(AtomicBool::new(false))).unwrap();
    let summary = m.run(&mut NullProgress);

    assert_eq!(summary.cycles, 3);
    assert_eq!(summary.new_records, 5);
    assert_eq!(summary.verified, 0); // nothing predicted yet, no models
    assert_eq!(m.sleeper().requested, vec![secs(60), secs(60)]);
    assert_eq!(m.state(), State::Idle);

    let ids: Vec<String> = m.store().load_records().unwrap().into_iter().map(|r| r.period_id).collect();
    assert_eq!(ids, vec!["P1", "P2", "P3", "P4", "P5"]);
}

#[test]
fn empty_cycles_back_off_then_force_a_reload() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path());
    cfg.monitor.max_cycles = 4;

    let session = ScriptedSession::new(vec![None, None, None, Some(history_page(1, 2))]);
    let mut m = Monitor::new(session, &cfg, NoSleep::default(), Arc::new(AtomicBool::new(false))).unwrap();
    let summary = m.run(&mut NullProgress);

    assert_eq!(summary.new_records, 2);
    assert_eq!(summary.reloads, 1);
    // two back-offs of one poll interval, then the settle pause after the forced reload
    assert_eq!(m.sleeper().requested, vec![secs(60), secs(60), secs(3)]);
    assert!(cfg.paths.logs_dir.join("scrape_error.html").exists());
    assert_eq!(m.into_session().reloads, 1);
}

#[test]
fn configured_backoff_overrides_the_interval() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path());
    cfg.monitor.max_cycles = 2;
    cfg.monitor.backoff_secs = Some(5);

    let session = ScriptedSession::new(vec![None, Some(history_page(1, 2))]);
    let mut m = Monitor::new(session, &cfg, NoSleep::default(), Arc::new(AtomicBool::new(false))).unwrap();
    m.run(&mut NullProgress);
    assert_eq!(m.sleeper().requested, vec![secs(5)]);
}

#[test]
fn scheduled_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path());
    cfg.monitor.max_cycles = 4;
    cfg.monitor.refresh_every = 2;

    let session = ScriptedSession::new(vec![Some(history_page(1, 2))]);
    let mut m = Monitor::new(session, &cfg, NoSleep::default(), Arc::new(AtomicBool::new(false))).unwrap();
    let summary = m.run(&mut NullProgress);

    assert_eq!(summary.reloads, 2);
    let s = m.into_session();
    assert_eq!((s.reloads, s.polls), (2, 4));
}

struct StopAfterFirstBatch(Arc<AtomicBool>);

impl Progress for StopAfterFirstBatch {
    fn new_records(&mut self, _records: &[OutcomeRecord]) {
        self.0.store(true, Ordering::Relaxed);
    }
}

#[test]
fn cancel_finishes_the_batch_and_saves_the_index() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let cancel = Arc::new(AtomicBool::new(false));

    let session = ScriptedSession::new(vec![Some(history_page(1, 3))]);
    let mut m = Monitor::new(session, &cfg, NoSleep::default(), cancel.clone()).unwrap();
    let summary = m.run(&mut StopAfterFirstBatch(cancel));

    assert_eq!(summary.cycles, 1);
    assert_eq!(summary.new_records, 3);
    assert!(m.sleeper().requested.is_empty());
    assert_eq!(std::fs::read_to_string(cfg.paths.known_periods()).unwrap(), "P1\nP2\nP3\n");
}

#[test]
fn already_cancelled_runs_no_cycles() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let session = ScriptedSession::new(vec![Some(history_page(1, 3))]);
    let mut m = Monitor::new(session, &cfg, NoSleep::default(), Arc::new(AtomicBool::new(true))).unwrap();

    assert_eq!(m.run(&mut NullProgress).cycles, 0);
    assert!(cfg.paths.known_periods().exists());
    assert_eq!(m.into_session().polls, 0);
}

#[test]
fn verify_retrain_and_predict_as_records_arrive() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path());
    cfg.monitor.retrain_every = 2;
    cfg.monitor.max_cycles = 2;

    // Seed history P1..P12, models and a first prediction.
    let seed = ScriptedSession::new(vec![Some(history_page(1, 12))]);
    let mut seeder = Monitor::new(seed, &cfg, NoSleep::default(), Arc::new(AtomicBool::new(false))).unwrap();
    seeder.cycle(&mut NullProgress);
    drop(seeder);
    let history = HistoryStore::open(&cfg.paths).unwrap().load_records().unwrap();
    model::train(&history, &cfg.paths, &cfg.train).unwrap();
    Predictor::load(&cfg.paths).unwrap().predict_history(&history).unwrap();

    let session = ScriptedSession::new(vec![Some(history_page(1, 13)), Some(history_page(1, 14))]);
    let mut m = Monitor::new(session, &cfg, NoSleep::default(), Arc::new(AtomicBool::new(false))).unwrap();
    let summary = m.run(&mut NullProgress);

    assert_eq!(summary.new_records, 2);
    assert_eq!(summary.verified, 2);
    assert_eq!(summary.trainings, 1);
    assert_eq!(summary.predictions, 2);
    assert_eq!(VerificationLog::new(cfg.paths.verification()).load().unwrap().len(), 2);
    assert_eq!(summary.all_time.checked, 2);
}
